use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use tracing::error;

use super::domain::{LoanRequest, OrderRequest, UserId};
use super::model::RiskModel;
use super::normalize::RawAssessmentInput;
use super::repository::{CreditRepository, RepositoryError};
use super::service::{CreditAssessmentService, CreditServiceError};

/// Router builder exposing the engine and the assessment workflow over HTTP.
pub fn credit_router<R, M>(service: Arc<CreditAssessmentService<R, M>>) -> Router
where
    R: CreditRepository + ?Sized + 'static,
    M: RiskModel + ?Sized + 'static,
{
    Router::new()
        .route(
            "/api/v1/credit/entitlement",
            post(entitlement_handler::<R, M>),
        )
        .route(
            "/api/v1/credit/:user_id/assess",
            post(assess_handler::<R, M>),
        )
        .route(
            "/api/v1/credit/:user_id/estimate",
            post(estimate_handler::<R, M>),
        )
        .route(
            "/api/v1/credit/:user_id/entitlement",
            get(current_entitlement_handler::<R, M>),
        )
        .route(
            "/api/v1/credit/:user_id/assessments",
            get(history_handler::<R, M>),
        )
        .route(
            "/api/v1/credit/:user_id/spending-limit",
            get(spending_limit_handler::<R, M>).post(set_spending_limit_handler::<R, M>),
        )
        .route(
            "/api/v1/credit/:user_id/orders",
            post(confirm_order_handler::<R, M>),
        )
        .with_state(service)
}

/// Runs the engine over a raw body. Invalid scores still answer 200 with `error` set.
pub(crate) async fn entitlement_handler<R, M>(
    State(service): State<Arc<CreditAssessmentService<R, M>>>,
    Json(raw): Json<RawAssessmentInput>,
) -> Response
where
    R: CreditRepository + ?Sized + 'static,
    M: RiskModel + ?Sized + 'static,
{
    let outcome = service.engine().assess(&raw.normalize());
    (StatusCode::OK, Json(outcome.entitlement)).into_response()
}

pub(crate) async fn assess_handler<R, M>(
    State(service): State<Arc<CreditAssessmentService<R, M>>>,
    Path(user_id): Path<String>,
    request: Option<Json<LoanRequest>>,
) -> Response
where
    R: CreditRepository + ?Sized + 'static,
    M: RiskModel + ?Sized + 'static,
{
    let request = request.map(|Json(request)| request).unwrap_or_default();
    let user_id = UserId(user_id);
    run_blocking(move || service.assess(&user_id, request)).await
}

pub(crate) async fn estimate_handler<R, M>(
    State(service): State<Arc<CreditAssessmentService<R, M>>>,
    Path(user_id): Path<String>,
    request: Option<Json<LoanRequest>>,
) -> Response
where
    R: CreditRepository + ?Sized + 'static,
    M: RiskModel + ?Sized + 'static,
{
    let request = request.map(|Json(request)| request).unwrap_or_default();
    let user_id = UserId(user_id);
    run_blocking(move || service.estimate(&user_id, request)).await
}

pub(crate) async fn current_entitlement_handler<R, M>(
    State(service): State<Arc<CreditAssessmentService<R, M>>>,
    Path(user_id): Path<String>,
) -> Response
where
    R: CreditRepository + ?Sized + 'static,
    M: RiskModel + ?Sized + 'static,
{
    let user_id = UserId(user_id);
    run_blocking(move || service.current_entitlement(&user_id)).await
}

pub(crate) async fn history_handler<R, M>(
    State(service): State<Arc<CreditAssessmentService<R, M>>>,
    Path(user_id): Path<String>,
) -> Response
where
    R: CreditRepository + ?Sized + 'static,
    M: RiskModel + ?Sized + 'static,
{
    let user_id = UserId(user_id);
    run_blocking(move || {
        service
            .history(&user_id)
            .map(|history| json!({ "history": history }))
    })
    .await
}

/// `spending_limit` must be present; `null` clears the limit.
#[derive(Debug, Deserialize)]
pub(crate) struct SpendingLimitRequest {
    #[serde(default, deserialize_with = "present")]
    spending_limit: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl SpendingLimitRequest {
    fn requested(&self) -> Result<Option<f64>, CreditServiceError> {
        match &self.spending_limit {
            Some(Value::Null) => Ok(None),
            Some(Value::Number(number)) => number
                .as_f64()
                .map(Some)
                .ok_or(CreditServiceError::InvalidSpendingLimit),
            Some(Value::String(raw)) => raw
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| CreditServiceError::InvalidSpendingLimit),
            _ => Err(CreditServiceError::InvalidSpendingLimit),
        }
    }
}

pub(crate) async fn spending_limit_handler<R, M>(
    State(service): State<Arc<CreditAssessmentService<R, M>>>,
    Path(user_id): Path<String>,
) -> Response
where
    R: CreditRepository + ?Sized + 'static,
    M: RiskModel + ?Sized + 'static,
{
    let user_id = UserId(user_id);
    run_blocking(move || service.spending_limit(&user_id)).await
}

pub(crate) async fn set_spending_limit_handler<R, M>(
    State(service): State<Arc<CreditAssessmentService<R, M>>>,
    Path(user_id): Path<String>,
    Json(request): Json<SpendingLimitRequest>,
) -> Response
where
    R: CreditRepository + ?Sized + 'static,
    M: RiskModel + ?Sized + 'static,
{
    let user_id = UserId(user_id);
    run_blocking(move || {
        let requested = request.requested()?;
        service.set_spending_limit(&user_id, requested)
    })
    .await
}

pub(crate) async fn confirm_order_handler<R, M>(
    State(service): State<Arc<CreditAssessmentService<R, M>>>,
    Path(user_id): Path<String>,
    Json(request): Json<OrderRequest>,
) -> Response
where
    R: CreditRepository + ?Sized + 'static,
    M: RiskModel + ?Sized + 'static,
{
    let user_id = UserId(user_id);
    respond_blocking(StatusCode::CREATED, move || {
        service.confirm_order(&user_id, request)
    })
    .await
}

async fn run_blocking<T, F>(work: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce() -> Result<T, CreditServiceError> + Send + 'static,
{
    respond_blocking(StatusCode::OK, work).await
}

// The service and its gateways block, so they stay off the async workers.
async fn respond_blocking<T, F>(success: StatusCode, work: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce() -> Result<T, CreditServiceError> + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(Ok(body)) => (success, Json(body)).into_response(),
        Ok(Err(err)) => service_error_response(err),
        Err(join_error) => {
            error!(error = %join_error, "credit task failed");
            let payload = json!({ "error": "credit assessment failed" });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

fn service_error_response(err: CreditServiceError) -> Response {
    let status = match &err {
        CreditServiceError::ProfileNotFound(_)
        | CreditServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        CreditServiceError::ScoringUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        CreditServiceError::InvalidSpendingLimit
        | CreditServiceError::SpendingLimitExceedsCredit { .. }
        | CreditServiceError::InvalidOrder
        | CreditServiceError::InsufficientCredit { .. } => StatusCode::BAD_REQUEST,
        CreditServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        CreditServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}
