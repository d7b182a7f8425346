mod policy;
mod rules;

pub use policy::{EntitlementPolicy, TierBand};
pub use rules::Adjustment;
pub(crate) use rules::round_currency;

use super::domain::{EmploymentStatus, Entitlement, RiskAssessmentInput};
use serde::{Deserialize, Serialize};

pub const INVALID_SCORE_ERROR: &str = "Invalid score";

/// Stateless engine turning a risk score and applicant signals into an entitlement.
#[derive(Debug, Clone, Default)]
pub struct EntitlementEngine {
    policy: EntitlementPolicy,
}

impl EntitlementEngine {
    pub fn new(policy: EntitlementPolicy) -> Self {
        Self { policy }
    }

    pub fn standard() -> Self {
        Self::new(EntitlementPolicy::standard())
    }

    pub fn policy(&self) -> &EntitlementPolicy {
        &self.policy
    }

    pub fn assess(&self, input: &RiskAssessmentInput) -> EntitlementOutcome {
        let score = match input.risk_score {
            Some(score) if score.is_finite() => score,
            _ => return self.invalid_score_outcome(),
        };

        let band = self.policy.band_for(score);
        let (limit, adjustments) = rules::adjust_limit(input, band, &self.policy);

        EntitlementOutcome {
            entitlement: Entitlement {
                tier: band.tier,
                limit: rules::round_currency(limit),
                terms: band.terms.clone(),
                error: None,
                adjustments_applied: adjustments.iter().map(Adjustment::description).collect(),
            },
            base_limit: band.base_limit,
            adjustments,
        }
    }

    fn invalid_score_outcome(&self) -> EntitlementOutcome {
        let fallback = &self.policy.fallback;
        EntitlementOutcome {
            entitlement: Entitlement {
                tier: fallback.tier,
                limit: rules::round_currency(fallback.base_limit),
                terms: fallback.terms.clone(),
                error: Some(INVALID_SCORE_ERROR.to_string()),
                adjustments_applied: Vec::new(),
            },
            base_limit: fallback.base_limit,
            adjustments: Vec::new(),
        }
    }
}

/// Engine output plus the typed adjustment trail behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitlementOutcome {
    pub entitlement: Entitlement,
    pub base_limit: f64,
    pub adjustments: Vec<Adjustment>,
}

impl EntitlementOutcome {
    pub fn cap_hit(&self) -> bool {
        self.adjustments.iter().any(|adjustment| {
            matches!(
                adjustment,
                Adjustment::HighUtilizationBonus { capped: true, .. }
            )
        })
    }

    pub fn floor_hit(&self) -> bool {
        self.adjustments
            .iter()
            .any(|adjustment| matches!(adjustment, Adjustment::MinimumLimitFloor { .. }))
    }
}

/// Computes an entitlement under the standard pricing policy.
pub fn compute_entitlement(
    risk_score: Option<f64>,
    default_flag: bool,
    employment_status: EmploymentStatus,
    utilization_ratio: f64,
) -> Entitlement {
    let input = RiskAssessmentInput {
        risk_score,
        default_flag,
        employment_status,
        employment_label: None,
        utilization_ratio,
    };
    EntitlementEngine::standard().assess(&input).entitlement
}
