use axum::{extract::State, Json};
use serde_json::json;

use crate::state::AppState;

/// `GET /health` — the only fully public, unenveloped route; liveness
/// probes expect a flat body, not the `{success,...}` wrapper.
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
