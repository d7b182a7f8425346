use serde::{Deserialize, Serialize};

use super::domain::{ApplicantProfile, AssessmentId, AssessmentRecord, OrderRecord, UserId};

/// Storage abstraction so the service module can be exercised in isolation.
pub trait CreditRepository: Send + Sync {
    fn profile(&self, user_id: &UserId) -> Result<Option<ApplicantProfile>, RepositoryError>;
    /// Persists the assessment and moves the applicant's current limit to the assessed
    /// limit as one unit of work.
    fn store_assessment(&self, record: AssessmentRecord) -> Result<(), RepositoryError>;
    fn latest_assessment(
        &self,
        user_id: &UserId,
    ) -> Result<Option<AssessmentRecord>, RepositoryError>;
    /// All assessments for the user, most recent first.
    fn assessments(&self, user_id: &UserId) -> Result<Vec<AssessmentRecord>, RepositoryError>;
    /// Sets or clears the applicant's monthly spending limit.
    fn update_spending_limit(
        &self,
        user_id: &UserId,
        limit: Option<f64>,
    ) -> Result<(), RepositoryError>;
    /// Stores the order and adds its amount to the applicant's used credit as one unit of
    /// work, returning the updated profile.
    fn record_order(&self, order: OrderRecord) -> Result<ApplicantProfile, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Response shape for a fresh or simulated assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentView {
    pub tier: u8,
    pub limit: f64,
    pub terms: Vec<u8>,
    pub used_credit_amount: f64,
    pub available_credit: f64,
    pub adjustments_applied: Vec<String>,
    pub assessment_id: Option<AssessmentId>,
    pub simulated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementStatus {
    Assessed,
    Unassessed,
}

/// Current standing of an applicant's credit line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentEntitlementView {
    pub status: EntitlementStatus,
    pub tier: Option<u8>,
    pub limit: f64,
    pub terms: Vec<u8>,
    pub assessment_id: Option<AssessmentId>,
    pub used_credit_amount: f64,
    pub available_credit: f64,
}

impl CurrentEntitlementView {
    pub fn from_parts(profile: &ApplicantProfile, latest: Option<&AssessmentRecord>) -> Self {
        let available_credit = profile.available_credit();
        match latest {
            Some(record) => Self {
                status: EntitlementStatus::Assessed,
                tier: Some(record.tier),
                limit: profile.current_credit_limit,
                terms: record.terms.clone(),
                assessment_id: Some(record.assessment_id.clone()),
                used_credit_amount: profile.used_credit_amount,
                available_credit,
            },
            None => Self {
                status: EntitlementStatus::Unassessed,
                tier: None,
                limit: profile.current_credit_limit,
                terms: Vec::new(),
                assessment_id: None,
                used_credit_amount: profile.used_credit_amount,
                available_credit,
            },
        }
    }
}

/// Monthly spending limit next to the credit line it must fit under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingLimitView {
    pub overall_credit_limit: f64,
    pub current_spending_limit: Option<f64>,
}

impl SpendingLimitView {
    pub fn from_profile(profile: &ApplicantProfile) -> Self {
        Self {
            overall_credit_limit: profile.current_credit_limit,
            current_spending_limit: profile.monthly_spending_limit,
        }
    }
}

/// Confirmed order plus the credit line left after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub order: OrderRecord,
    pub used_credit_amount: f64,
    pub available_credit: f64,
}
