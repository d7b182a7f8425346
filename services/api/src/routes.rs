use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use bnpl_credit::error::AppError;
use bnpl_credit::workflows::credit::{
    credit_router, ApplicantBatchImporter, BatchEntitlement, CreditAssessmentService,
    CreditRepository, EntitlementEngine, RiskModel,
};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use tracing::info;

pub(crate) fn with_credit_routes<R, M>(service: Arc<CreditAssessmentService<R, M>>) -> axum::Router
where
    R: CreditRepository + ?Sized + 'static,
    M: RiskModel + ?Sized + 'static,
{
    credit_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/credit/batch",
            axum::routing::post(batch_entitlement_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Prices every row of a CSV body with the standard policy.
pub(crate) async fn batch_entitlement_endpoint(
    body: String,
) -> Result<Json<Vec<BatchEntitlement>>, AppError> {
    let engine = EntitlementEngine::standard();
    let results = ApplicantBatchImporter::from_reader(Cursor::new(body.into_bytes()), &engine)?;
    info!(rows = results.len(), "priced applicant batch");
    Ok(Json(results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{HeuristicRiskModel, InMemoryCreditRepository};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    const BATCH: &str = "\
applicant_id,risk_score,default_flag,employment_status,utilization_ratio
a-1,0.10,Y,unemployed,0.9
a-2,,N,EMPLOYED,0.1
";

    #[tokio::test]
    async fn batch_endpoint_prices_each_row() {
        let Json(rows) = batch_entitlement_endpoint(BATCH.to_string())
            .await
            .expect("batch prices");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].applicant_id, "a-1");
        assert_eq!(rows[0].entitlement.limit, 1275.00);
        assert_eq!(rows[1].entitlement.tier, 7);
        assert_eq!(rows[1].entitlement.error.as_deref(), Some("Invalid score"));
    }

    #[tokio::test]
    async fn batch_endpoint_rejects_malformed_csv() {
        let result = batch_entitlement_endpoint("risk_score\n0.2\n".to_string()).await;

        match result {
            Err(err @ AppError::Import(_)) => {
                let response = err.into_response();
                assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            }
            Err(other) => panic!("expected import error, got {other}"),
            Ok(_) => panic!("expected import error"),
        }
    }

    #[tokio::test]
    async fn credit_routes_are_mounted_alongside_health_checks() {
        let service = Arc::new(CreditAssessmentService::new(
            Arc::new(InMemoryCreditRepository::seeded()),
            Arc::new(HeuristicRiskModel),
        ));
        let router = with_credit_routes(service);

        let health = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(health.status(), StatusCode::OK);

        let assess = router
            .oneshot(
                Request::post("/api/v1/credit/demo-prime/assess")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(assess.status(), StatusCode::OK);
    }
}
