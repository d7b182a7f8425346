//! Coercion of loosely typed external values into [`RiskAssessmentInput`].
//!
//! Malformed auxiliary values degrade toward the conservative reading (no stable income,
//! zero utilization, no default bonus) instead of failing the request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{EmploymentStatus, RiskAssessmentInput};

/// Engine input as it arrives from profiles, CSV rows or HTTP bodies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAssessmentInput {
    #[serde(default)]
    pub risk_score: Value,
    #[serde(default)]
    pub default_flag: Value,
    #[serde(default)]
    pub employment_status: Value,
    #[serde(default)]
    pub utilization_ratio: Value,
}

impl RawAssessmentInput {
    pub fn normalize(&self) -> RiskAssessmentInput {
        RiskAssessmentInput {
            risk_score: normalize_risk_score(&self.risk_score),
            default_flag: normalize_default_flag(&self.default_flag),
            employment_status: normalize_employment_status(&self.employment_status),
            employment_label: employment_label(&self.employment_status),
            utilization_ratio: normalize_utilization(&self.utilization_ratio),
        }
    }
}

/// Scores must already be numbers; strings such as `"0.4"` are treated as unscorable.
pub fn normalize_risk_score(value: &Value) -> Option<f64> {
    value.as_f64().filter(|score| score.is_finite())
}

/// Only a boolean `true` or the database marker `"Y"` count as a default on file.
pub fn normalize_default_flag(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(raw) => parse_default_flag(raw),
        _ => false,
    }
}

pub fn parse_default_flag(raw: &str) -> bool {
    raw == "Y"
}

pub fn normalize_employment_status(value: &Value) -> EmploymentStatus {
    match value {
        Value::String(raw) => parse_employment_status(raw),
        _ => EmploymentStatus::Other,
    }
}

/// Case-insensitive match on the two stable-income categories. Any other spelling,
/// including padded or hyphenated variants, is `Other`.
pub fn parse_employment_status(raw: &str) -> EmploymentStatus {
    match raw.to_uppercase().as_str() {
        "EMPLOYED" => EmploymentStatus::Employed,
        "SELF_EMPLOYED" => EmploymentStatus::SelfEmployed,
        _ => EmploymentStatus::Other,
    }
}

/// Uppercased status as supplied, kept for the audit trail.
pub fn employment_label(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(raw) => Some(raw.to_uppercase()),
        other => Some(other.to_string().to_uppercase()),
    }
}

/// Numbers and numeric strings pass through, infinities included; NaN and anything
/// unparseable become `0.0`.
pub fn normalize_utilization(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => parse_utilization(raw),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|ratio| !ratio.is_nan()).unwrap_or(0.0)
}

fn parse_utilization(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok()
}
