use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier wrapper for applicants holding a credit line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier wrapper for stored assessments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssessmentId(pub String);

/// Identifier wrapper for confirmed BNPL orders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for AssessmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Employment category consumed by the entitlement engine.
///
/// Anything that is not recognisably employed or self-employed (unemployed, student,
/// retired, unknown, missing) collapses into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentStatus {
    Employed,
    SelfEmployed,
    Other,
}

impl EmploymentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EmploymentStatus::Employed => "EMPLOYED",
            EmploymentStatus::SelfEmployed => "SELF_EMPLOYED",
            EmploymentStatus::Other => "OTHER",
        }
    }

    pub const fn has_stable_income(self) -> bool {
        matches!(
            self,
            EmploymentStatus::Employed | EmploymentStatus::SelfEmployed
        )
    }

    /// Category vocabulary the prediction model was trained on.
    pub const fn model_category(self) -> &'static str {
        match self {
            EmploymentStatus::Employed => "Yes",
            EmploymentStatus::SelfEmployed => "Self-Employed",
            EmploymentStatus::Other => "No",
        }
    }
}

/// Typed engine input after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessmentInput {
    /// Model output in [0, 1]; `None` when the model could not score the applicant.
    pub risk_score: Option<f64>,
    pub default_flag: bool,
    pub employment_status: EmploymentStatus,
    /// Uppercased status as supplied (e.g. `UNEMPLOYED`), used in the audit trail.
    #[serde(default)]
    pub employment_label: Option<String>,
    /// Drawn balance over available credit. May exceed 1.0.
    pub utilization_ratio: f64,
}

/// Final credit decision returned by the engine.
///
/// When `error` is set the remaining fields hold the worst-case fallback rather than a
/// real offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entitlement {
    pub tier: u8,
    pub limit: f64,
    pub terms: Vec<u8>,
    pub error: Option<String>,
    #[serde(default)]
    pub adjustments_applied: Vec<String>,
}

impl Entitlement {
    pub fn is_offer(&self) -> bool {
        self.error.is_none()
    }

    pub fn summary(&self) -> String {
        let terms = self
            .terms
            .iter()
            .map(|months| months.to_string())
            .collect::<Vec<_>>()
            .join(",");
        match &self.error {
            Some(error) => format!(
                "fallback tier {} limit £{:.2} terms [{}] ({})",
                self.tier, self.limit, terms, error
            ),
            None => format!(
                "tier {} limit £{:.2} terms [{}]",
                self.tier, self.limit, terms
            ),
        }
    }
}

/// Persisted applicant data the assessment pipeline draws on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    pub user_id: UserId,
    pub default_on_file: bool,
    #[serde(default)]
    pub credit_history_length: f64,
    /// Employment status as stored, before normalization.
    #[serde(default)]
    pub employment_status: Option<String>,
    #[serde(default)]
    pub person_income: Option<f64>,
    #[serde(default)]
    pub credit_utilization_ratio: Option<f64>,
    #[serde(default)]
    pub payment_history: Option<f64>,
    #[serde(default)]
    pub loan_term: Option<u16>,
    #[serde(default)]
    pub original_loan_amount: Option<f64>,
    #[serde(default)]
    pub current_credit_limit: f64,
    #[serde(default)]
    pub used_credit_amount: f64,
    /// Self-imposed monthly cap; never above `current_credit_limit` when set.
    #[serde(default)]
    pub monthly_spending_limit: Option<f64>,
}

impl ApplicantProfile {
    pub fn available_credit(&self) -> f64 {
        (self.current_credit_limit - self.used_credit_amount).max(0.0)
    }
}

/// Loan shape the applicant asked about. Missing values fall back to profile history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanRequest {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub term_months: Option<u16>,
}

/// Stored outcome of a scored assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub assessment_id: AssessmentId,
    pub user_id: UserId,
    pub risk_score: f64,
    pub tier: u8,
    pub limit: f64,
    pub terms: Vec<u8>,
    pub adjustments_applied: Vec<String>,
    pub assessed_at: DateTime<Utc>,
}

/// Checkout request to finance a purchase against the applicant's credit line.
/// Missing fields deserialize to empty values and are rejected by validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    #[serde(default)]
    pub product_title: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub term_months: u16,
    #[serde(default)]
    pub assessment_id: Option<AssessmentId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Active,
}

/// Stored BNPL order. The full amount is drawn from available credit on confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub assessment_id: Option<AssessmentId>,
    pub product_title: String,
    pub amount: f64,
    pub term_months: u16,
    pub remaining_balance: f64,
    pub status: OrderStatus,
    pub first_due_date: NaiveDate,
    pub ordered_at: DateTime<Utc>,
}
