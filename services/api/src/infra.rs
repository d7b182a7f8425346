use bnpl_credit::config::PredictionConfig;
use bnpl_credit::workflows::credit::{
    ApplicantProfile, AssessmentRecord, CreditRepository, HttpRiskModel, OrderRecord,
    RepositoryError, RiskFeatures, RiskModel, RiskModelError, UserId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryCreditRepository {
    profiles: Arc<Mutex<HashMap<UserId, ApplicantProfile>>>,
    records: Arc<Mutex<Vec<AssessmentRecord>>>,
    orders: Arc<Mutex<Vec<OrderRecord>>>,
}

impl InMemoryCreditRepository {
    pub(crate) fn seeded() -> Self {
        let repository = Self::default();
        for profile in demo_profiles() {
            repository.insert_profile(profile);
        }
        repository
    }

    pub(crate) fn insert_profile(&self, profile: ApplicantProfile) {
        let mut guard = self.profiles.lock().expect("repository mutex poisoned");
        guard.insert(profile.user_id.clone(), profile);
    }
}

impl CreditRepository for InMemoryCreditRepository {
    fn profile(&self, user_id: &UserId) -> Result<Option<ApplicantProfile>, RepositoryError> {
        let guard = self.profiles.lock().expect("repository mutex poisoned");
        Ok(guard.get(user_id).cloned())
    }

    fn store_assessment(&self, record: AssessmentRecord) -> Result<(), RepositoryError> {
        let mut profiles = self.profiles.lock().expect("repository mutex poisoned");
        let profile = profiles
            .get_mut(&record.user_id)
            .ok_or(RepositoryError::NotFound)?;
        let mut records = self.records.lock().expect("repository mutex poisoned");
        if records
            .iter()
            .any(|existing| existing.assessment_id == record.assessment_id)
        {
            return Err(RepositoryError::Conflict);
        }
        profile.current_credit_limit = record.limit;
        records.push(record);
        Ok(())
    }

    fn latest_assessment(
        &self,
        user_id: &UserId,
    ) -> Result<Option<AssessmentRecord>, RepositoryError> {
        Ok(self.assessments(user_id)?.into_iter().next())
    }

    fn assessments(&self, user_id: &UserId) -> Result<Vec<AssessmentRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
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
        let mut profiles = self.profiles.lock().expect("repository mutex poisoned");
        let profile = profiles.get_mut(user_id).ok_or(RepositoryError::NotFound)?;
        profile.monthly_spending_limit = limit;
        Ok(())
    }

    fn record_order(&self, order: OrderRecord) -> Result<ApplicantProfile, RepositoryError> {
        let mut profiles = self.profiles.lock().expect("repository mutex poisoned");
        let profile = profiles
            .get_mut(&order.user_id)
            .ok_or(RepositoryError::NotFound)?;
        let mut orders = self.orders.lock().expect("repository mutex poisoned");
        if orders
            .iter()
            .any(|existing| existing.order_id == order.order_id)
        {
            return Err(RepositoryError::Conflict);
        }
        profile.used_credit_amount += order.amount;
        orders.push(order);
        Ok(profile.clone())
    }
}

/// Stand-in used when no prediction service is configured; every call fails.
pub(crate) struct UnavailableRiskModel;

impl RiskModel for UnavailableRiskModel {
    fn predict(&self, _features: &RiskFeatures) -> Result<f64, RiskModelError> {
        Err(RiskModelError::NotConfigured)
    }
}

/// Offline scorer for demos: blends payment history, utilization and the default marker
/// into a score in [0, 1].
pub(crate) struct HeuristicRiskModel;

impl RiskModel for HeuristicRiskModel {
    fn predict(&self, features: &RiskFeatures) -> Result<f64, RiskModelError> {
        let history_risk = 1.0 - features.payment_history / 1000.0;
        let utilization_risk = features.credit_utilization_ratio.clamp(0.0, 1.0);
        let default_risk = if features.cb_person_default_on_file == "Y" {
            1.0
        } else {
            0.0
        };
        let score = 0.6 * history_risk + 0.3 * utilization_risk + 0.1 * default_risk;
        Ok(score.clamp(0.0, 1.0))
    }
}

pub(crate) fn risk_model(config: &PredictionConfig) -> Arc<dyn RiskModel> {
    match &config.url {
        Some(url) => Arc::new(HttpRiskModel::new(url.clone(), config.timeout())),
        None => {
            warn!("PREDICTION_SERVICE_URL not set; assessments will report the model unavailable");
            Arc::new(UnavailableRiskModel)
        }
    }
}

pub(crate) fn demo_profiles() -> Vec<ApplicantProfile> {
    vec![
        ApplicantProfile {
            user_id: UserId("demo-prime".to_string()),
            default_on_file: false,
            credit_history_length: 9.0,
            employment_status: Some("Employed".to_string()),
            person_income: Some(48_000.0),
            credit_utilization_ratio: Some(0.12),
            payment_history: Some(940.0),
            loan_term: Some(12),
            original_loan_amount: Some(2_000.0),
            current_credit_limit: 0.0,
            used_credit_amount: 0.0,
            monthly_spending_limit: None,
        },
        ApplicantProfile {
            user_id: UserId("demo-stretched".to_string()),
            default_on_file: false,
            credit_history_length: 4.0,
            employment_status: Some("SELF_EMPLOYED".to_string()),
            person_income: Some(27_500.0),
            credit_utilization_ratio: Some(0.88),
            payment_history: Some(610.0),
            loan_term: Some(6),
            original_loan_amount: Some(750.0),
            current_credit_limit: 300.0,
            used_credit_amount: 260.0,
            monthly_spending_limit: Some(200.0),
        },
        ApplicantProfile {
            user_id: UserId("demo-recovering".to_string()),
            default_on_file: true,
            credit_history_length: 2.0,
            employment_status: Some("student".to_string()),
            person_income: Some(9_000.0),
            credit_utilization_ratio: Some(0.95),
            payment_history: None,
            loan_term: None,
            original_loan_amount: None,
            current_credit_limit: 150.0,
            used_credit_amount: 40.0,
            monthly_spending_limit: None,
        },
    ]
}

pub(crate) fn parse_score(raw: &str) -> Result<f64, String> {
    let score = raw
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("failed to parse '{raw}' as a risk score ({err})"))?;
    if score.is_finite() {
        Ok(score)
    } else {
        Err(format!("risk score '{raw}' must be finite"))
    }
}
