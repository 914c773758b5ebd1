mod envelope;
mod extractors;
mod routes;
mod state;
mod ws;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use access_infra::bans::{BanEngineImpl, PgBanRepository};
use access_infra::events::EventBus;
use access_infra::identity::{IdentityServiceImpl, PgBuildingRepository, PgSessionRepository, PgUserRepository};
use access_infra::notifications::{NotificationServiceImpl, PgNotificationRepository};
use access_infra::sweepers::{run_expiry_sweeper, run_retention_sweeper};
use access_infra::visits::{PgVisitRepository, VisitEngineImpl};
use shared_rate_limit::{RateLimitConfig, RateLimitState};

use state::AppState;

/// Retention sweeps run far less often than expiry sweeps; there's no
/// dedicated config knob for this cadence since an hour of slack on
/// notification cleanup is immaterial.
const RETENTION_SWEEP_INTERVAL_SECONDS: u64 = 3600;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = shared_config::Config::from_env().expect("failed to load configuration");
    tracing::info!("configuration loaded");

    let pool = shared_db::init_pool(&config.database_url, 10).await.expect("failed to connect to database");
    tracing::info!("database pool initialized");

    let building_repo = PgBuildingRepository::new(pool.clone());
    let user_repo = PgUserRepository::new(pool.clone());
    let session_repo = PgSessionRepository::new(pool.clone());
    let ban_repo = PgBanRepository::new(pool.clone());
    let visit_repo = PgVisitRepository::new(pool.clone());
    let notification_repo = PgNotificationRepository::new(pool.clone());

    let events = Arc::new(EventBus::new());

    let identity = Arc::new(IdentityServiceImpl::new(
        user_repo,
        building_repo,
        session_repo,
        config.jwt_secret.clone(),
        config.password_hash_cost,
        config.access_ttl_seconds,
        config.refresh_ttl_seconds,
        config.login_lockout_window_seconds as i64,
    ));

    let ban_engine = Arc::new(BanEngineImpl::new(ban_repo, events.clone()));

    let visit_engine = Arc::new(VisitEngineImpl::new(visit_repo.clone(), ban_engine.clone(), events.clone()));

    let notifications = Arc::new(NotificationServiceImpl::new(notification_repo.clone()));

    tokio::spawn(run_expiry_sweeper(
        Arc::new(visit_repo),
        visit_engine.clone(),
        config.visit_expiry_grace_seconds,
        Duration::from_secs(config.expiry_sweep_interval_seconds),
    ));

    tokio::spawn(run_retention_sweeper(
        Arc::new(notification_repo),
        config.notification_retention_days,
        Duration::from_secs(RETENTION_SWEEP_INTERVAL_SECONDS),
    ));

    let state = AppState {
        identity,
        ban_engine,
        visit_engine,
        notifications,
        events,
        jwt_secret: config.jwt_secret.clone(),
        started_at: Instant::now(),
    };

    let rate_limit_state = RateLimitState::from_config(RateLimitConfig {
        redis_url: config.redis_url.clone(),
        global_max_requests: config.rate_limit_max_requests,
        global_window_seconds: config.rate_limit_window_seconds,
        lockout_threshold: config.login_lockout_threshold,
        lockout_window_seconds: config.login_lockout_window_seconds,
        lockout_duration_seconds: config.login_lockout_duration_seconds,
        enabled: true,
        trusted_ips: None,
    })
    .await;

    let origins = config.cors_origin_list();
    let cors = CorsLayer::new()
        .allow_origin(if origins.is_empty() {
            AllowOrigin::any()
        } else {
            let values: Vec<HeaderValue> =
                origins.iter().filter_map(|origin| HeaderValue::from_str(origin).ok()).collect();
            AllowOrigin::list(values)
        })
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = routes::build_router(state, rate_limit_state, cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "access service listening");

    let listener = tokio::net::TcpListener::bind(addr).await.expect("failed to bind listener");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .expect("server error");
}
