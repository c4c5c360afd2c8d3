use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryAssessmentRepository, InMemoryOtpOutbox, InMemoryUserRepository,
};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use nutri_assess::assessment::AssessmentService;
use nutri_assess::auth::{AuthService, OtpNotifier, UserRepository};
use nutri_assess::config::AppConfig;
use nutri_assess::error::AppError;
use nutri_assess::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

const CODE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let assessment_service = Arc::new(AssessmentService::new(Arc::new(
        InMemoryAssessmentRepository::default(),
    )));
    let auth_service = Arc::new(AuthService::new(
        Arc::new(InMemoryUserRepository::default()),
        Arc::new(InMemoryOtpOutbox::default()),
        config.auth.clone(),
    ));

    let _sweeper = spawn_code_sweeper(auth_service.clone(), CODE_SWEEP_INTERVAL);

    let app = with_service_routes(assessment_service, auth_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "self-assessment service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodically drops reset codes that expired without being redeemed.
pub(crate) fn spawn_code_sweeper<U, N>(
    service: Arc<AuthService<U, N>>,
    every: Duration,
) -> JoinHandle<()>
where
    U: UserRepository + 'static,
    N: OtpNotifier + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match service.purge_expired_codes() {
                Ok(0) => {}
                Ok(purged) => info!(purged, "expired reset codes purged"),
                Err(err) => warn!(error = %err, "reset code sweep failed"),
            }
        }
    })
}
