use super::super::domain::{EmploymentStatus, RiskAssessmentInput};
use super::policy::{EntitlementPolicy, TierBand};
use serde::{Deserialize, Serialize};

/// Single limit adjustment, kept for the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Adjustment {
    DefaultPenalty {
        percent: f64,
    },
    EmploymentPenalty {
        status: EmploymentStatus,
        /// Status text as supplied, uppercased; the category label when none was given.
        label: String,
        percent: f64,
        high_risk: bool,
    },
    HighUtilizationDefaultPenalty {
        percent: f64,
    },
    HighUtilizationBonus {
        percent: f64,
        capped: bool,
    },
    MinimumLimitFloor {
        minimum: f64,
    },
}

impl Adjustment {
    pub fn description(&self) -> String {
        match self {
            Adjustment::DefaultPenalty { percent } => {
                format!("Default Flag (-{:.0}%)", percent * 100.0)
            }
            Adjustment::EmploymentPenalty {
                label,
                percent,
                high_risk: true,
                ..
            } => format!(
                "Employment ({}) & High Risk Penalty (-{:.0}%)",
                label,
                percent * 100.0
            ),
            Adjustment::EmploymentPenalty { label, percent, .. } => {
                format!("Employment ({}) Penalty (-{:.0}%)", label, percent * 100.0)
            }
            Adjustment::HighUtilizationDefaultPenalty { percent } => {
                format!("High Util & Default (-{:.0}%)", percent * 100.0)
            }
            Adjustment::HighUtilizationBonus { capped: true, .. } => {
                "High Util Bonus (Hit Cap)".to_string()
            }
            Adjustment::HighUtilizationBonus { percent, .. } => {
                format!("High Util Bonus (+{:.0}%)", percent * 100.0)
            }
            Adjustment::MinimumLimitFloor { minimum } => {
                format!("Limit adjusted to Min (£{:.2})", minimum)
            }
        }
    }
}

/// Applies the adjustment chain to the band's base limit. Order matters: each step works
/// on the running limit left by the previous one, and the floor always runs last.
pub(crate) fn adjust_limit(
    input: &RiskAssessmentInput,
    band: &TierBand,
    policy: &EntitlementPolicy,
) -> (f64, Vec<Adjustment>) {
    let mut limit = band.base_limit;
    let mut adjustments = Vec::new();

    if input.default_flag {
        limit *= policy.default_multiplier;
        adjustments.push(Adjustment::DefaultPenalty {
            percent: 1.0 - policy.default_multiplier,
        });
    }

    if !input.employment_status.has_stable_income() {
        // Keyed on the base tier, not on the limit left by earlier penalties.
        let high_risk = band.tier >= policy.high_risk_tier_threshold;
        let reduction = if high_risk {
            policy.high_risk_employment_reduction
        } else {
            policy.employment_reduction
        };
        limit *= 1.0 - reduction;
        let label = input
            .employment_label
            .clone()
            .unwrap_or_else(|| input.employment_status.label().to_string());
        adjustments.push(Adjustment::EmploymentPenalty {
            status: input.employment_status,
            label,
            percent: reduction,
            high_risk,
        });
    }

    let utilization = effective_utilization(input.utilization_ratio);
    if utilization > policy.high_utilization_threshold {
        if input.default_flag {
            limit *= policy.high_utilization_default_multiplier;
            adjustments.push(Adjustment::HighUtilizationDefaultPenalty {
                percent: 1.0 - policy.high_utilization_default_multiplier,
            });
        } else {
            let boosted = limit * policy.high_utilization_bonus_multiplier;
            let capped = boosted >= policy.max_limit_cap;
            limit = boosted.min(policy.max_limit_cap);
            adjustments.push(Adjustment::HighUtilizationBonus {
                percent: policy.high_utilization_bonus_multiplier - 1.0,
                capped,
            });
        }
    }

    if limit < policy.minimum_limit {
        limit = policy.minimum_limit;
        adjustments.push(Adjustment::MinimumLimitFloor {
            minimum: policy.minimum_limit,
        });
    }

    (limit, adjustments)
}

fn effective_utilization(ratio: f64) -> f64 {
    if ratio.is_nan() {
        0.0
    } else {
        ratio
    }
}

/// Rounds to pence, half away from zero.
pub(crate) fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_currency(66.9375), 66.94);
        assert_eq!(round_currency(12.125), 12.13);
        assert_eq!(round_currency(1275.0000000000002), 1275.0);
    }

    #[test]
    fn nan_utilization_counts_as_zero() {
        assert_eq!(effective_utilization(f64::NAN), 0.0);
        assert_eq!(effective_utilization(1.4), 1.4);
    }

    #[test]
    fn descriptions_match_audit_vocabulary() {
        let penalty = Adjustment::EmploymentPenalty {
            status: EmploymentStatus::Other,
            label: "UNEMPLOYED".to_string(),
            percent: 0.30,
            high_risk: true,
        };
        assert_eq!(
            penalty.description(),
            "Employment (UNEMPLOYED) & High Risk Penalty (-30%)"
        );
        assert_eq!(
            Adjustment::MinimumLimitFloor { minimum: 50.0 }.description(),
            "Limit adjusted to Min (£50.00)"
        );
        assert_eq!(
            Adjustment::HighUtilizationBonus {
                percent: 0.2,
                capped: false
            }
            .description(),
            "High Util Bonus (+20%)"
        );
    }
}
