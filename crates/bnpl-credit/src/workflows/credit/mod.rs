//! Credit entitlement engine and the assessment workflow around it.
//!
//! The engine turns a model risk score and a few applicant signals into a bounded offer
//! (tier, limit, repayment terms). The surrounding modules normalize loose inputs, build
//! the prediction service payload, persist assessments and expose the workflow over HTTP.

pub mod domain;
pub mod entitlement;
pub mod features;
pub mod import;
pub mod model;
pub mod normalize;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicantProfile, AssessmentId, AssessmentRecord, EmploymentStatus, Entitlement,
    LoanRequest, OrderId, OrderRecord, OrderRequest, OrderStatus, RiskAssessmentInput, UserId,
};
pub use entitlement::{
    compute_entitlement, Adjustment, EntitlementEngine, EntitlementOutcome, EntitlementPolicy,
    TierBand, INVALID_SCORE_ERROR,
};
pub use features::RiskFeatures;
pub use import::{ApplicantBatchImporter, BatchEntitlement, BatchImportError};
pub use model::{HttpRiskModel, RiskModel, RiskModelError};
pub use normalize::RawAssessmentInput;
pub use repository::{
    AssessmentView, CreditRepository, CurrentEntitlementView, EntitlementStatus,
    OrderConfirmation, RepositoryError, SpendingLimitView,
};
pub use router::credit_router;
pub use service::{first_due_date, CreditAssessmentService, CreditServiceError};
