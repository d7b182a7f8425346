use crate::cli::ServeArgs;
use crate::infra::{risk_model, AppState, InMemoryCreditRepository};
use crate::routes::with_credit_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use bnpl_credit::config::AppConfig;
use bnpl_credit::error::AppError;
use bnpl_credit::telemetry;
use bnpl_credit::workflows::credit::{CreditAssessmentService, CreditRepository, RiskModel};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(url) = args.prediction_url.take() {
        config.prediction.url = Some(url);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository: Arc<dyn CreditRepository> = Arc::new(InMemoryCreditRepository::seeded());
    let model: Arc<dyn RiskModel> = risk_model(&config.prediction);
    let credit_service = Arc::new(CreditAssessmentService::new(repository, model));

    let app = with_credit_routes(credit_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        prediction_service = config.prediction.url.as_deref().unwrap_or("unset"),
        "credit entitlement service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
