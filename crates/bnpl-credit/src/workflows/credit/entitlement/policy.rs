use serde::{Deserialize, Serialize};

/// One risk band of the tier table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierBand {
    pub tier: u8,
    /// Exclusive upper bound on the risk score. `None` catches everything above the
    /// previous band.
    pub upper_bound: Option<f64>,
    pub base_limit: f64,
    pub terms: Vec<u8>,
}

impl TierBand {
    fn new(tier: u8, upper_bound: Option<f64>, base_limit: f64, terms: &[u8]) -> Self {
        Self {
            tier,
            upper_bound,
            base_limit,
            terms: terms.to_vec(),
        }
    }

    fn admits(&self, score: f64) -> bool {
        self.upper_bound.map_or(true, |bound| score < bound)
    }
}

/// Pricing constants for the entitlement engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitlementPolicy {
    /// Ordered by ascending upper bound; the first admitting band wins.
    pub bands: Vec<TierBand>,
    /// Worst-case offer used for unscorable applicants and as a catch-all band.
    pub fallback: TierBand,
    pub default_multiplier: f64,
    pub employment_reduction: f64,
    pub high_risk_employment_reduction: f64,
    pub high_risk_tier_threshold: u8,
    pub high_utilization_threshold: f64,
    pub high_utilization_default_multiplier: f64,
    pub high_utilization_bonus_multiplier: f64,
    pub max_limit_cap: f64,
    pub minimum_limit: f64,
}

impl EntitlementPolicy {
    pub fn standard() -> Self {
        Self {
            bands: vec![
                TierBand::new(1, Some(0.14), 2500.00, &[3, 6, 12]),
                TierBand::new(2, Some(0.28), 1750.00, &[3, 6, 12]),
                TierBand::new(3, Some(0.42), 1250.00, &[3, 6]),
                TierBand::new(4, Some(0.56), 800.00, &[3, 6]),
                TierBand::new(5, Some(0.70), 500.00, &[3]),
                TierBand::new(6, Some(0.84), 300.00, &[3]),
                TierBand::new(7, None, 150.00, &[3]),
            ],
            fallback: TierBand::new(7, None, 150.00, &[3]),
            default_multiplier: 0.75,
            employment_reduction: 0.20,
            high_risk_employment_reduction: 0.30,
            high_risk_tier_threshold: 6,
            high_utilization_threshold: 0.70,
            high_utilization_default_multiplier: 0.85,
            high_utilization_bonus_multiplier: 1.20,
            max_limit_cap: 3000.00,
            minimum_limit: 50.00,
        }
    }

    /// Band for a finite score. Scores equal to a bound fall into the riskier band.
    pub fn band_for(&self, score: f64) -> &TierBand {
        self.bands
            .iter()
            .find(|band| band.admits(score))
            .unwrap_or(&self.fallback)
    }
}

impl Default for EntitlementPolicy {
    fn default() -> Self {
        Self::standard()
    }
}
