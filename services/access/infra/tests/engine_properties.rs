//! Cross-cutting engine properties that don't fit a single unit test:
//! unique visit codes, immediate ban visibility, at-most-once scanning,
//! and refresh-token rotation. All exercised against in-memory fakes, no
//! database required.

mod support;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use access_core::authorize::AuthContext;
use access_core::domains::bans::dto::ban_dto::{CreateBanReq, UnbanReq};
use access_core::domains::bans::model::BanSeverity;
use access_core::domains::bans::service::BanEngineService;
use access_core::domains::identity::dto::auth_dto::RegisterReq;
use access_core::domains::identity::model::{Building, Role};
use access_core::domains::identity::service::IdentityService;
use access_core::domains::visits::dto::visit_dto::{CreateVisitReq, ScanActionReq, ScanReq, VisitorReq};
use access_core::domains::visits::service::VisitEngineService;
use access_core::engine_error::EngineError;
use access_infra::bans::BanEngineImpl;
use access_infra::events::EventBus;
use access_infra::identity::IdentityServiceImpl;
use access_infra::visits::VisitEngineImpl;

use support::{FakeBanRepository, FakeBuildingRepository, FakeSessionRepository, FakeUserRepository, FakeVisitRepository};

fn resident_ctx(user_id: Uuid, building_id: Uuid) -> AuthContext {
    AuthContext { user_id, role: Role::Resident, building_id: Some(building_id) }
}

fn create_req(suffix: u32) -> CreateVisitReq {
    CreateVisitReq {
        visitors: vec![VisitorReq { name: "Guest".to_string(), phone: format!("+1415555{:04}", suffix) }],
        purpose: "delivery".to_string(),
        expected_start: Utc::now(),
        expected_end: Utc::now() + Duration::hours(1),
    }
}

#[tokio::test]
async fn visit_short_codes_are_unique_across_concurrent_creates() {
    let ban_engine = Arc::new(BanEngineImpl::new(FakeBanRepository::default(), Arc::new(EventBus::new())));
    let visit_engine =
        VisitEngineImpl::new(FakeVisitRepository::default(), ban_engine, Arc::new(EventBus::new()));

    let building_id = Uuid::now_v7();
    let host_id = Uuid::now_v7();
    let caller = resident_ctx(host_id, building_id);

    let mut codes = HashSet::new();
    for i in 0..20 {
        let resp = visit_engine.create(caller, create_req(i)).await.expect("visit creation should succeed");
        let code = resp.visit.short_code.expect("a pending visit always carries a short code");
        assert!(codes.insert(code), "short code collided across two distinct visits");
    }
}

#[tokio::test]
async fn a_ban_is_visible_immediately_after_creation() {
    let events = Arc::new(EventBus::new());
    let ban_engine = BanEngineImpl::new(FakeBanRepository::default(), events);

    let owner_id = Uuid::now_v7();
    let building_id = Uuid::now_v7();
    let caller = resident_ctx(owner_id, building_id);
    let phone = "+14155550199".to_string();

    ban_engine
        .ban(
            caller,
            CreateBanReq {
                phone: phone.clone(),
                name: "Troublemaker".to_string(),
                reason: "past incident".to_string(),
                severity: BanSeverity::High,
                expires_at: None,
            },
        )
        .await
        .expect("ban creation should succeed");

    let by_user = ban_engine.is_banned_by_user(owner_id, &phone).await.unwrap();
    assert!(by_user.is_some(), "ban must be visible to the owner predicate with no delay");

    let in_building = ban_engine.is_banned_in_building(building_id, &phone).await.unwrap();
    assert_eq!(in_building.len(), 1, "ban must be visible to the building predicate with no delay");

    let check = ban_engine.check(caller, &phone).await.expect("check should succeed");
    assert!(check.user_ban.is_some());
    assert_eq!(check.building_bans.len(), 1);
    assert!(!check.multiple, "a single owner's ban is not a multiple-owner ban");
}

#[tokio::test]
async fn scanning_the_same_visitor_twice_does_not_double_process() {
    let ban_engine = Arc::new(BanEngineImpl::new(FakeBanRepository::default(), Arc::new(EventBus::new())));
    let visit_engine =
        VisitEngineImpl::new(FakeVisitRepository::default(), ban_engine, Arc::new(EventBus::new()));

    let building_id = Uuid::now_v7();
    let host_id = Uuid::now_v7();
    let caller = resident_ctx(host_id, building_id);

    let created = visit_engine.create(caller, create_req(1)).await.expect("visit creation should succeed");
    let short_code = created.visit.short_code.clone().unwrap();

    let security_caller = AuthContext { user_id: Uuid::now_v7(), role: Role::Security, building_id: Some(building_id) };

    let first_scan = visit_engine
        .scan(security_caller, ScanReq { code: short_code.clone(), action: ScanActionReq::Entry })
        .await
        .expect("first entry scan should succeed");
    assert_eq!(first_scan.visitor.state.to_string(), "entered");

    let second_scan =
        visit_engine.scan(security_caller, ScanReq { code: short_code, action: ScanActionReq::Entry }).await;
    assert!(second_scan.is_err(), "scanning an already-entered visitor must not be silently repeated");
    assert_eq!(second_scan.unwrap_err(), EngineError::AllVisitorsProcessed);
}

#[tokio::test]
async fn refresh_rotates_the_token_and_invalidates_the_old_one() {
    let building_id = Uuid::now_v7();
    let building = Building {
        building_id,
        name: "Test Tower".to_string(),
        license_quota: 50,
        active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let identity = IdentityServiceImpl::new(
        FakeUserRepository::default(),
        FakeBuildingRepository::seeded(building),
        FakeSessionRepository::default(),
        "test-secret".to_string(),
        4,
        900,
        604_800,
        900,
    );

    let registered = identity
        .register(RegisterReq {
            email: "resident@example.com".to_string(),
            phone: "+14155550112".to_string(),
            password: "Str0ng!Passw0rd".to_string(),
            role: Role::Resident,
            building_id: Some(building_id),
            apartment: Some("1A".to_string()),
        })
        .await
        .expect("resident registration should succeed");

    let refreshed = identity.refresh(&registered.refresh_token).await.expect("first refresh should succeed");
    assert_ne!(refreshed.refresh_token, registered.refresh_token);
    assert_ne!(refreshed.access_token, registered.access_token);

    let reuse = identity.refresh(&registered.refresh_token).await;
    assert!(reuse.is_err(), "a rotated-out refresh token must not be usable again");
}

#[tokio::test]
async fn resident_registration_without_a_building_is_rejected() {
    let identity = IdentityServiceImpl::new(
        FakeUserRepository::default(),
        FakeBuildingRepository::default(),
        FakeSessionRepository::default(),
        "test-secret".to_string(),
        4,
        900,
        604_800,
        900,
    );

    let result = identity
        .register(RegisterReq {
            email: "noaddress@example.com".to_string(),
            phone: "+14155550113".to_string(),
            password: "Str0ng!Passw0rd".to_string(),
            role: Role::Resident,
            building_id: None,
            apartment: Some("1A".to_string()),
        })
        .await;

    assert!(matches!(result, Err(EngineError::Validation(_))), "a resident must name a building");
}

#[tokio::test]
async fn creating_a_visit_writes_a_durable_notification_for_the_host() {
    let ban_engine = Arc::new(BanEngineImpl::new(FakeBanRepository::default(), Arc::new(EventBus::new())));
    let visit_repo = Arc::new(FakeVisitRepository::default());
    let visit_engine = VisitEngineImpl::new(visit_repo.clone(), ban_engine, Arc::new(EventBus::new()));

    let building_id = Uuid::now_v7();
    let host_id = Uuid::now_v7();
    let caller = resident_ctx(host_id, building_id);

    visit_engine.create(caller, create_req(1)).await.expect("visit creation should succeed");

    let notifications = visit_repo.notifications.lock().unwrap();
    assert_eq!(notifications.len(), 1, "the host's user:{{uuid}} topic is the only durable-eligible event");
    assert_eq!(notifications[0].user_id, host_id);
    assert_eq!(notifications[0].notification_type, "visit_created");
}

#[tokio::test]
async fn banning_writes_a_durable_notification_for_the_owner() {
    let ban_repo = Arc::new(FakeBanRepository::default());
    let ban_engine = BanEngineImpl::new(ban_repo.clone(), Arc::new(EventBus::new()));

    let owner_id = Uuid::now_v7();
    let building_id = Uuid::now_v7();
    let caller = resident_ctx(owner_id, building_id);

    let created = ban_engine
        .ban(
            caller,
            CreateBanReq {
                phone: "+14155550142".to_string(),
                name: "Troublemaker".to_string(),
                reason: "past incident".to_string(),
                severity: BanSeverity::High,
                expires_at: None,
            },
        )
        .await
        .expect("ban creation should succeed");

    {
        let notifications = ban_repo.notifications.lock().unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].user_id, owner_id);
        assert_eq!(notifications[0].notification_type, "ban_created");
    }

    ban_engine
        .unban(caller, created.ban_id, UnbanReq { reason: "resolved".to_string() })
        .await
        .expect("unban should succeed");

    let notifications = ban_repo.notifications.lock().unwrap();
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[1].notification_type, "ban_removed");
}
