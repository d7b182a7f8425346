use bnpl_credit::workflows::credit::{
    compute_entitlement, EmploymentStatus, EntitlementEngine, RawAssessmentInput,
    RiskAssessmentInput, INVALID_SCORE_ERROR,
};
use serde_json::json;

#[test]
fn standard_table_base_limits_without_adjustments() {
    let expected = [
        (0.05, 1, 2500.00),
        (0.20, 2, 1750.00),
        (0.35, 3, 1250.00),
        (0.50, 4, 800.00),
        (0.65, 5, 500.00),
        (0.80, 6, 300.00),
        (0.90, 7, 150.00),
    ];

    for (score, tier, limit) in expected {
        let entitlement = compute_entitlement(Some(score), false, EmploymentStatus::Employed, 0.3);
        assert_eq!(entitlement.tier, tier, "tier for score {score}");
        assert_eq!(entitlement.limit, limit, "limit for score {score}");
        assert!(entitlement.adjustments_applied.is_empty());
    }
}

#[test]
fn high_utilization_without_default_boosts_mid_tiers() {
    let entitlement = compute_entitlement(Some(0.50), false, EmploymentStatus::SelfEmployed, 1.3);

    assert_eq!(entitlement.tier, 4);
    assert_eq!(entitlement.limit, 960.00);
    assert_eq!(
        entitlement.adjustments_applied,
        vec!["High Util Bonus (+20%)".to_string()]
    );
}

#[test]
fn raw_payloads_normalize_before_pricing() {
    let raw: RawAssessmentInput = serde_json::from_value(json!({
        "risk_score": 0.75,
        "default_flag": 1,
        "employment_status": "Retired",
        "utilization_ratio": null
    }))
    .expect("raw payload");

    let input = raw.normalize();
    assert_eq!(
        input,
        RiskAssessmentInput {
            risk_score: Some(0.75),
            default_flag: false,
            employment_status: EmploymentStatus::Other,
            employment_label: Some("RETIRED".to_string()),
            utilization_ratio: 0.0,
        }
    );

    // A numeric 1 is not a default marker; only `true` or "Y" are.
    let outcome = EntitlementEngine::standard().assess(&input);
    assert_eq!(outcome.entitlement.tier, 6);
    assert_eq!(outcome.entitlement.limit, 210.00);
    assert_eq!(
        outcome.entitlement.adjustments_applied,
        vec!["Employment (RETIRED) & High Risk Penalty (-30%)".to_string()]
    );
    assert_eq!(outcome.base_limit, 300.00);
}

#[test]
fn missing_fields_are_treated_as_unscorable() {
    let raw: RawAssessmentInput = serde_json::from_value(json!({})).expect("raw payload");
    let outcome = EntitlementEngine::standard().assess(&raw.normalize());

    assert_eq!(outcome.entitlement.tier, 7);
    assert_eq!(outcome.entitlement.limit, 150.00);
    assert_eq!(outcome.entitlement.terms, vec![3]);
    assert_eq!(
        outcome.entitlement.error.as_deref(),
        Some(INVALID_SCORE_ERROR)
    );
}

#[test]
fn entitlement_serializes_with_stable_field_names() {
    let entitlement = compute_entitlement(Some(0.10), true, EmploymentStatus::Other, 0.9);
    let value = serde_json::to_value(&entitlement).expect("serialize");

    assert_eq!(
        value,
        json!({
            "tier": 1,
            "limit": 1275.0,
            "terms": [3, 6, 12],
            "error": null,
            "adjustments_applied": [
                "Default Flag (-25%)",
                "Employment (OTHER) Penalty (-20%)",
                "High Util & Default (-15%)"
            ]
        })
    );
    assert_eq!(entitlement.summary(), "tier 1 limit £1275.00 terms [3,6,12]");
}
