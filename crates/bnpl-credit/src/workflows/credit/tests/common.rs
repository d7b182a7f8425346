use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::credit::domain::{
    ApplicantProfile, AssessmentRecord, EmploymentStatus, OrderRecord, RiskAssessmentInput,
    UserId,
};
use crate::workflows::credit::features::RiskFeatures;
use crate::workflows::credit::model::{RiskModel, RiskModelError};
use crate::workflows::credit::repository::{CreditRepository, RepositoryError};
use crate::workflows::credit::{credit_router, CreditAssessmentService};

pub(super) fn input(
    risk_score: Option<f64>,
    default_flag: bool,
    employment_status: EmploymentStatus,
    utilization_ratio: f64,
) -> RiskAssessmentInput {
    RiskAssessmentInput {
        risk_score,
        default_flag,
        employment_status,
        employment_label: None,
        utilization_ratio,
    }
}

pub(super) fn profile(user: &str) -> ApplicantProfile {
    ApplicantProfile {
        user_id: UserId(user.to_string()),
        default_on_file: false,
        credit_history_length: 6.0,
        employment_status: Some("employed".to_string()),
        person_income: Some(32_000.0),
        credit_utilization_ratio: Some(0.35),
        payment_history: Some(720.0),
        loan_term: Some(12),
        original_loan_amount: Some(1_600.0),
        current_credit_limit: 0.0,
        used_credit_amount: 400.0,
        monthly_spending_limit: None,
    }
}

pub(super) fn risky_profile(user: &str) -> ApplicantProfile {
    ApplicantProfile {
        default_on_file: true,
        employment_status: Some("student".to_string()),
        credit_utilization_ratio: Some(0.92),
        payment_history: None,
        ..profile(user)
    }
}

pub(super) type TestService = CreditAssessmentService<MemoryRepository, FixedModel>;

pub(super) fn build_service(
    score: f64,
    profiles: Vec<ApplicantProfile>,
) -> (Arc<TestService>, Arc<MemoryRepository>, Arc<FixedModel>) {
    let repository = Arc::new(MemoryRepository::with_profiles(profiles));
    let model = Arc::new(FixedModel::new(score));
    let service = Arc::new(CreditAssessmentService::new(
        repository.clone(),
        model.clone(),
    ));
    (service, repository, model)
}

pub(super) fn router_with_service<R, M>(service: Arc<CreditAssessmentService<R, M>>) -> axum::Router
where
    R: CreditRepository + ?Sized + 'static,
    M: RiskModel + ?Sized + 'static,
{
    credit_router(service)
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    profiles: Mutex<HashMap<UserId, ApplicantProfile>>,
    assessments: Mutex<Vec<AssessmentRecord>>,
    orders: Mutex<Vec<OrderRecord>>,
}

impl MemoryRepository {
    pub(super) fn with_profiles(profiles: Vec<ApplicantProfile>) -> Self {
        let profiles = profiles
            .into_iter()
            .map(|profile| (profile.user_id.clone(), profile))
            .collect();
        Self {
            profiles: Mutex::new(profiles),
            assessments: Mutex::new(Vec::new()),
            orders: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn orders(&self) -> Vec<OrderRecord> {
        self.orders.lock().expect("order mutex poisoned").clone()
    }

    pub(super) fn stored_profile(&self, user_id: &UserId) -> Option<ApplicantProfile> {
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .get(user_id)
            .cloned()
    }

    pub(super) fn stored(&self) -> Vec<AssessmentRecord> {
        self.assessments
            .lock()
            .expect("assessment mutex poisoned")
            .clone()
    }

    pub(super) fn current_limit(&self, user_id: &UserId) -> Option<f64> {
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .get(user_id)
            .map(|profile| profile.current_credit_limit)
    }
}

impl CreditRepository for MemoryRepository {
    fn profile(&self, user_id: &UserId) -> Result<Option<ApplicantProfile>, RepositoryError> {
        let guard = self.profiles.lock().expect("profile mutex poisoned");
        Ok(guard.get(user_id).cloned())
    }

    fn store_assessment(&self, record: AssessmentRecord) -> Result<(), RepositoryError> {
        let mut profiles = self.profiles.lock().expect("profile mutex poisoned");
        let profile = profiles
            .get_mut(&record.user_id)
            .ok_or(RepositoryError::NotFound)?;
        profile.current_credit_limit = record.limit;
        self.assessments
            .lock()
            .expect("assessment mutex poisoned")
            .push(record);
        Ok(())
    }

    fn latest_assessment(
        &self,
        user_id: &UserId,
    ) -> Result<Option<AssessmentRecord>, RepositoryError> {
        Ok(self.assessments(user_id)?.into_iter().next())
    }

    fn assessments(&self, user_id: &UserId) -> Result<Vec<AssessmentRecord>, RepositoryError> {
        let guard = self.assessments.lock().expect("assessment mutex poisoned");
        Ok(guard
            .iter()
            .rev()
            .filter(|record| &record.user_id == user_id)
            .cloned()
            .collect())
    }

    fn update_spending_limit(
        &self,
        user_id: &UserId,
        limit: Option<f64>,
    ) -> Result<(), RepositoryError> {
        let mut profiles = self.profiles.lock().expect("profile mutex poisoned");
        let profile = profiles.get_mut(user_id).ok_or(RepositoryError::NotFound)?;
        profile.monthly_spending_limit = limit;
        Ok(())
    }

    fn record_order(&self, order: OrderRecord) -> Result<ApplicantProfile, RepositoryError> {
        let mut profiles = self.profiles.lock().expect("profile mutex poisoned");
        let profile = profiles
            .get_mut(&order.user_id)
            .ok_or(RepositoryError::NotFound)?;
        profile.used_credit_amount += order.amount;
        self.orders
            .lock()
            .expect("order mutex poisoned")
            .push(order);
        Ok(profile.clone())
    }
}

pub(super) struct UnavailableRepository;

impl CreditRepository for UnavailableRepository {
    fn profile(&self, _user_id: &UserId) -> Result<Option<ApplicantProfile>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn store_assessment(&self, _record: AssessmentRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn latest_assessment(
        &self,
        _user_id: &UserId,
    ) -> Result<Option<AssessmentRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn assessments(&self, _user_id: &UserId) -> Result<Vec<AssessmentRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_spending_limit(
        &self,
        _user_id: &UserId,
        _limit: Option<f64>,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn record_order(&self, _order: OrderRecord) -> Result<ApplicantProfile, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Returns a fixed score and remembers the payloads it was asked to score.
pub(super) struct FixedModel {
    score: f64,
    seen: Mutex<Vec<RiskFeatures>>,
}

impl FixedModel {
    pub(super) fn new(score: f64) -> Self {
        Self {
            score,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn seen(&self) -> Vec<RiskFeatures> {
        self.seen.lock().expect("model mutex poisoned").clone()
    }
}

impl RiskModel for FixedModel {
    fn predict(&self, features: &RiskFeatures) -> Result<f64, RiskModelError> {
        self.seen
            .lock()
            .expect("model mutex poisoned")
            .push(features.clone());
        Ok(self.score)
    }
}

pub(super) struct OfflineModel;

impl RiskModel for OfflineModel {
    fn predict(&self, _features: &RiskFeatures) -> Result<f64, RiskModelError> {
        Err(RiskModelError::Transport("connection refused".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
