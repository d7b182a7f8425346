use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Datelike, Months, NaiveDate, Utc};
use tracing::{debug, info, warn};

use super::domain::{
    ApplicantProfile, AssessmentId, AssessmentRecord, LoanRequest, OrderId, OrderRecord,
    OrderRequest, OrderStatus, UserId,
};
use super::entitlement::{round_currency, EntitlementEngine, EntitlementOutcome};
use super::features::{assessment_input, RiskFeatures};
use super::model::RiskModel;
use super::repository::{
    AssessmentView, CreditRepository, CurrentEntitlementView, OrderConfirmation, RepositoryError,
    SpendingLimitView,
};

pub const ESTIMATE_LOAN_AMOUNT: f64 = 1000.0;
pub const ESTIMATE_LOAN_TERM: u16 = 6;

/// Service composing the repository, the risk model gateway and the entitlement engine.
pub struct CreditAssessmentService<R: ?Sized, M: ?Sized> {
    repository: Arc<R>,
    model: Arc<M>,
    engine: Arc<EntitlementEngine>,
}

static ASSESSMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

static ORDER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_assessment_id() -> AssessmentId {
    let id = ASSESSMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AssessmentId(format!("asm-{id:06}"))
}

fn next_order_id() -> OrderId {
    let id = ORDER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    OrderId(format!("ord-{id:06}"))
}

/// First instalment falls on the 1st of the month two months after the order.
pub fn first_due_date(ordered_on: NaiveDate) -> NaiveDate {
    ordered_on
        .with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(2)))
        .unwrap_or(ordered_on)
}

impl<R, M> CreditAssessmentService<R, M>
where
    R: CreditRepository + ?Sized + 'static,
    M: RiskModel + ?Sized + 'static,
{
    pub fn new(repository: Arc<R>, model: Arc<M>) -> Self {
        Self::with_engine(repository, model, EntitlementEngine::standard())
    }

    pub fn with_engine(repository: Arc<R>, model: Arc<M>, engine: EntitlementEngine) -> Self {
        Self {
            repository,
            model,
            engine: Arc::new(engine),
        }
    }

    pub fn engine(&self) -> &EntitlementEngine {
        &self.engine
    }

    /// Score the applicant, persist the entitlement and move their credit limit.
    pub fn assess(
        &self,
        user_id: &UserId,
        request: LoanRequest,
    ) -> Result<AssessmentView, CreditServiceError> {
        info!(user_id = %user_id, ?request, "starting credit assessment");
        let profile = self.load_profile(user_id)?;
        let (risk_score, outcome) = self.score(&profile, &request);

        let Some(risk_score) = risk_score.filter(|_| outcome.entitlement.is_offer()) else {
            return Err(unavailable(&outcome));
        };

        let entitlement = outcome.entitlement;
        let record = AssessmentRecord {
            assessment_id: next_assessment_id(),
            user_id: user_id.clone(),
            risk_score,
            tier: entitlement.tier,
            limit: entitlement.limit,
            terms: entitlement.terms.clone(),
            adjustments_applied: entitlement.adjustments_applied.clone(),
            assessed_at: Utc::now(),
        };
        self.repository.store_assessment(record.clone())?;

        info!(
            user_id = %user_id,
            assessment_id = %record.assessment_id,
            tier = record.tier,
            limit = record.limit,
            "credit assessment stored"
        );

        let used_credit_amount = profile.used_credit_amount;
        Ok(AssessmentView {
            tier: record.tier,
            limit: record.limit,
            terms: record.terms,
            used_credit_amount,
            available_credit: (record.limit - used_credit_amount).max(0.0),
            adjustments_applied: record.adjustments_applied,
            assessment_id: Some(record.assessment_id),
            simulated: false,
        })
    }

    /// Dashboard estimate: same pipeline as [`Self::assess`], nothing persisted.
    pub fn estimate(
        &self,
        user_id: &UserId,
        request: LoanRequest,
    ) -> Result<AssessmentView, CreditServiceError> {
        let request = LoanRequest {
            amount: request.amount.or(Some(ESTIMATE_LOAN_AMOUNT)),
            term_months: request.term_months.or(Some(ESTIMATE_LOAN_TERM)),
        };
        debug!(user_id = %user_id, ?request, "estimating entitlement");
        let profile = self.load_profile(user_id)?;
        let (_, outcome) = self.score(&profile, &request);

        if !outcome.entitlement.is_offer() {
            return Err(unavailable(&outcome));
        }

        let entitlement = outcome.entitlement;
        let used_credit_amount = profile.used_credit_amount;
        Ok(AssessmentView {
            tier: entitlement.tier,
            limit: entitlement.limit,
            available_credit: (entitlement.limit - used_credit_amount).max(0.0),
            terms: entitlement.terms,
            used_credit_amount,
            adjustments_applied: entitlement.adjustments_applied,
            assessment_id: None,
            simulated: true,
        })
    }

    pub fn current_entitlement(
        &self,
        user_id: &UserId,
    ) -> Result<CurrentEntitlementView, CreditServiceError> {
        let profile = self.load_profile(user_id)?;
        let latest = self.repository.latest_assessment(user_id)?;
        Ok(CurrentEntitlementView::from_parts(&profile, latest.as_ref()))
    }

    pub fn history(&self, user_id: &UserId) -> Result<Vec<AssessmentRecord>, CreditServiceError> {
        self.load_profile(user_id)?;
        Ok(self.repository.assessments(user_id)?)
    }

    pub fn spending_limit(&self, user_id: &UserId) -> Result<SpendingLimitView, CreditServiceError> {
        let profile = self.load_profile(user_id)?;
        Ok(SpendingLimitView::from_profile(&profile))
    }

    /// Sets the monthly spending limit, or removes it with `None`. The limit must be a
    /// non-negative amount no higher than the current credit limit.
    pub fn set_spending_limit(
        &self,
        user_id: &UserId,
        requested: Option<f64>,
    ) -> Result<SpendingLimitView, CreditServiceError> {
        let profile = self.load_profile(user_id)?;
        let limit = match requested {
            None => None,
            Some(amount) if !amount.is_finite() || amount < 0.0 => {
                return Err(CreditServiceError::InvalidSpendingLimit)
            }
            Some(amount) if amount > profile.current_credit_limit => {
                return Err(CreditServiceError::SpendingLimitExceedsCredit {
                    requested: amount,
                    limit: profile.current_credit_limit,
                })
            }
            Some(amount) => Some(round_currency(amount)),
        };

        self.repository.update_spending_limit(user_id, limit)?;
        info!(user_id = %user_id, ?limit, "monthly spending limit updated");

        Ok(SpendingLimitView {
            overall_credit_limit: profile.current_credit_limit,
            current_spending_limit: limit,
        })
    }

    /// Draws the order amount from the applicant's available credit.
    pub fn confirm_order(
        &self,
        user_id: &UserId,
        request: OrderRequest,
    ) -> Result<OrderConfirmation, CreditServiceError> {
        let valid = request.amount.is_finite()
            && request.amount > 0.0
            && !request.product_title.trim().is_empty()
            && request.term_months > 0;
        if !valid {
            return Err(CreditServiceError::InvalidOrder);
        }

        let profile = self.load_profile(user_id)?;
        let available = profile.available_credit();
        if request.amount > available {
            warn!(
                user_id = %user_id,
                amount = request.amount,
                available,
                "order exceeds available credit"
            );
            return Err(CreditServiceError::InsufficientCredit {
                amount: request.amount,
                available,
            });
        }

        let ordered_at = Utc::now();
        let order = OrderRecord {
            order_id: next_order_id(),
            user_id: user_id.clone(),
            assessment_id: request.assessment_id,
            product_title: request.product_title,
            amount: request.amount,
            term_months: request.term_months,
            remaining_balance: request.amount,
            status: OrderStatus::Active,
            first_due_date: first_due_date(ordered_at.date_naive()),
            ordered_at,
        };
        let updated = self.repository.record_order(order.clone())?;

        info!(
            user_id = %user_id,
            order_id = %order.order_id,
            amount = order.amount,
            used_credit_amount = updated.used_credit_amount,
            "order confirmed"
        );

        Ok(OrderConfirmation {
            order,
            used_credit_amount: updated.used_credit_amount,
            available_credit: updated.available_credit(),
        })
    }

    fn load_profile(&self, user_id: &UserId) -> Result<ApplicantProfile, CreditServiceError> {
        self.repository
            .profile(user_id)?
            .ok_or_else(|| CreditServiceError::ProfileNotFound(user_id.clone()))
    }

    fn score(
        &self,
        profile: &ApplicantProfile,
        request: &LoanRequest,
    ) -> (Option<f64>, EntitlementOutcome) {
        let features = RiskFeatures::from_profile(profile, request);
        let risk_score = match self.model.predict(&features) {
            Ok(score) => Some(score),
            Err(err) => {
                warn!(user_id = %profile.user_id, error = %err, "risk model unavailable");
                None
            }
        };

        let outcome = self.engine.assess(&assessment_input(profile, risk_score));
        debug!(
            user_id = %profile.user_id,
            ?risk_score,
            base_limit = outcome.base_limit,
            adjustments = ?outcome.entitlement.adjustments_applied,
            "entitlement computed"
        );
        (risk_score, outcome)
    }
}

fn unavailable(outcome: &EntitlementOutcome) -> CreditServiceError {
    let reason = outcome
        .entitlement
        .error
        .clone()
        .unwrap_or_else(|| "no risk score".to_string());
    CreditServiceError::ScoringUnavailable(reason)
}

/// Error raised by the assessment service.
#[derive(Debug, thiserror::Error)]
pub enum CreditServiceError {
    #[error("applicant profile {0} not found")]
    ProfileNotFound(UserId),
    #[error("assessment service unavailable, try again later ({0})")]
    ScoringUnavailable(String),
    #[error("invalid spending limit amount provided")]
    InvalidSpendingLimit,
    #[error(
        "monthly spending limit (£{requested:.2}) cannot exceed overall credit limit of £{limit:.2}"
    )]
    SpendingLimitExceedsCredit { requested: f64, limit: f64 },
    #[error("missing or invalid order details")]
    InvalidOrder,
    #[error("order amount (£{amount:.2}) exceeds your available credit (£{available:.2})")]
    InsufficientCredit { amount: f64, available: f64 },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
