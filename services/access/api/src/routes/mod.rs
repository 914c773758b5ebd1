pub mod auth;
pub mod bans;
pub mod health;
pub mod visits;

use axum::routing::{get, post};
use axum::Router;
use shared_rate_limit::{RateLimitEndpoint, RateLimitExt, RateLimitState};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::ws;

/// Builds the full router: public auth routes, bearer-protected visit/ban
/// routes, the realtime upgrade, and `/health`. The global rate limit layer
/// wraps everything (spec §6 names one HTTP-wide limit, not a per-route
/// matrix).
pub fn build_router(state: AppState, rate_limit_state: RateLimitState, cors: CorsLayer) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/profile", get(auth::profile));

    let visit_routes = Router::new()
        .route("/api/visits", post(visits::create).get(visits::list))
        .route("/api/visits/scan", post(visits::scan))
        .route(
            "/api/visits/{id}",
            get(visits::get).patch(visits::patch).delete(visits::cancel),
        );

    let ban_routes = Router::new()
        .route("/api/bans", post(bans::ban))
        .route("/api/bans/{id}", axum::routing::delete(bans::unban))
        .route("/api/bans/check/{phone}", get(bans::check));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(auth_routes)
        .merge(visit_routes)
        .merge(ban_routes)
        .route("/ws/realtime", get(ws::upgrade))
        .with_state(state)
        .rate_limit(rate_limit_state, RateLimitEndpoint::Global)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
