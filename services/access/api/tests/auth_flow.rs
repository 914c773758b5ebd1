//! End-to-end coverage of the auth surface (register/login/profile/logout)
//! and the unauthenticated/health edges, against in-memory identity fakes —
//! no database required.

mod support;

use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;
use uuid::Uuid;

use access_core::domains::identity::model::Building;
use access_infra::events::EventBus;
use access_infra::identity::IdentityServiceImpl;

use access_api::state::AppState;
use support::stubs::{UnreachableBanEngine, UnreachableNotificationService, UnreachableVisitEngine};
use support::{FakeBuildingRepository, FakeSessionRepository, FakeUserRepository};

const JWT_SECRET: &str = "test-secret-not-used-in-production";

/// Fixed so every test in this file can build a register payload against the
/// same seeded building without threading the id through test_server().
const FIXTURE_BUILDING_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0001);

async fn test_server() -> TestServer {
    let building_id = FIXTURE_BUILDING_ID;
    let building = Building {
        building_id,
        name: "Test Tower".to_string(),
        license_quota: 50,
        active: true,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };

    let identity = IdentityServiceImpl::new(
        FakeUserRepository::default(),
        FakeBuildingRepository::seeded(building),
        FakeSessionRepository::default(),
        JWT_SECRET.to_string(),
        4, // cheap bcrypt cost for test speed
        900,
        604_800,
        900,
    );

    let state = AppState {
        identity: Arc::new(identity),
        ban_engine: Arc::new(UnreachableBanEngine),
        visit_engine: Arc::new(UnreachableVisitEngine),
        notifications: Arc::new(UnreachableNotificationService),
        events: Arc::new(EventBus::new()),
        jwt_secret: JWT_SECRET.to_string(),
        started_at: Instant::now(),
    };

    let rate_limit_state = shared_rate_limit::RateLimitState::from_config(shared_rate_limit::RateLimitConfig {
        redis_url: None,
        global_max_requests: 10_000,
        global_window_seconds: 60,
        lockout_threshold: 5,
        lockout_window_seconds: 900,
        lockout_duration_seconds: 900,
        enabled: false,
        trusted_ips: None,
    })
    .await;
    let cors = tower_http::cors::CorsLayer::permissive();

    let app = access_api::build_router(state, rate_limit_state, cors);
    TestServer::new(app).expect("failed to build test server")
}

fn register_payload(building_id: Uuid) -> serde_json::Value {
    json!({
        "email": "resident@example.com",
        "phone": "+15551234567",
        "password": "Str0ng!Passw0rd",
        "role": "resident",
        "building_id": building_id,
        "apartment": "4B",
    })
}

#[tokio::test]
async fn health_check_is_public_and_unenveloped() {
    let server = test_server().await;
    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn protected_route_without_bearer_token_is_rejected() {
    let server = test_server().await;
    let response = server.get("/api/auth/profile").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn register_login_profile_logout_round_trip() {
    let server = test_server().await;

    let register_response = server.post("/api/auth/register").json(&registration_fixture()).await;
    register_response.assert_status(StatusCode::CREATED);

    let register_body: serde_json::Value = register_response.json();
    assert_eq!(register_body["success"], true);
    let access_token = register_body["data"]["access_token"].as_str().unwrap().to_string();
    let refresh_token = register_body["data"]["refresh_token"].as_str().unwrap().to_string();
    assert_eq!(register_body["data"]["user"]["email"], "resident@example.com");

    let login_response = server
        .post("/api/auth/login")
        .json(&json!({
            "email": "resident@example.com",
            "password": "Str0ng!Passw0rd",
        }))
        .await;
    login_response.assert_status_ok();
    let login_body: serde_json::Value = login_response.json();
    assert_eq!(login_body["success"], true);

    let profile_response =
        server.get("/api/auth/profile").add_header("Authorization", format!("Bearer {}", access_token)).await;
    profile_response.assert_status_ok();
    let profile_body: serde_json::Value = profile_response.json();
    assert_eq!(profile_body["data"]["email"], "resident@example.com");
    assert_eq!(profile_body["data"]["apartment"], "4B");

    let logout_response = server
        .post("/api/auth/logout")
        .json(&json!({ "refresh_token": refresh_token, "all_devices": false }))
        .await;
    logout_response.assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let server = test_server().await;

    let first = server.post("/api/auth/register").json(&registration_fixture()).await;
    first.assert_status(StatusCode::CREATED);

    let second = server.post("/api/auth/register").json(&registration_fixture()).await;
    second.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = second.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn login_with_wrong_password_is_rejected() {
    let server = test_server().await;
    server.post("/api/auth/register").json(&registration_fixture()).await.assert_status(StatusCode::CREATED);

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": "resident@example.com", "password": "definitely not it" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

fn registration_fixture() -> serde_json::Value {
    register_payload(FIXTURE_BUILDING_ID)
}
