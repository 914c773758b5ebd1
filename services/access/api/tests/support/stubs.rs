//! Stand-ins for the ban/visit/notification engines, satisfying `AppState`'s
//! trait-object fields in tests that only exercise the auth surface.

use async_trait::async_trait;
use shared_types::{Page, PageRequest};
use uuid::Uuid;

use access_core::authorize::AuthContext;
use access_core::domains::bans::dto::ban_dto::{BanCheckResp, BanSummary, CreateBanReq, UnbanReq};
use access_core::domains::bans::model::Ban;
use access_core::domains::bans::service::BanEngineService;
use access_core::domains::notifications::dto::notification_dto::NotificationSummary;
use access_core::domains::notifications::service::NotificationService;
use access_core::domains::visits::dto::visit_dto::{
    CreateVisitReq, CreateVisitResp, PatchVisitReq, ScanReq, ScanResp, VisitSummary,
};
use access_core::domains::visits::repository::VisitListFilter;
use access_core::domains::visits::service::VisitEngineService;
use access_core::engine_error::EngineError;

fn unimplemented() -> EngineError {
    EngineError::Internal("not exercised by this test".to_string())
}

#[derive(Default)]
pub struct UnreachableBanEngine;

#[async_trait]
impl BanEngineService for UnreachableBanEngine {
    async fn ban(&self, _caller: AuthContext, _req: CreateBanReq) -> Result<BanSummary, EngineError> {
        Err(unimplemented())
    }

    async fn unban(&self, _caller: AuthContext, _ban_id: Uuid, _req: UnbanReq) -> Result<BanSummary, EngineError> {
        Err(unimplemented())
    }

    async fn check(&self, _caller: AuthContext, _phone: &str) -> Result<BanCheckResp, EngineError> {
        Err(unimplemented())
    }

    async fn is_banned_by_user(&self, _owner_id: Uuid, _phone_e164: &str) -> Result<Option<Ban>, EngineError> {
        Ok(None)
    }

    async fn is_banned_in_building(&self, _building_id: Uuid, _phone_e164: &str) -> Result<Vec<Ban>, EngineError> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub struct UnreachableVisitEngine;

#[async_trait]
impl VisitEngineService for UnreachableVisitEngine {
    async fn create(&self, _caller: AuthContext, _req: CreateVisitReq) -> Result<CreateVisitResp, EngineError> {
        Err(unimplemented())
    }

    async fn scan(&self, _caller: AuthContext, _req: ScanReq) -> Result<ScanResp, EngineError> {
        Err(unimplemented())
    }

    async fn cancel(&self, _caller: AuthContext, _visit_id: Uuid) -> Result<VisitSummary, EngineError> {
        Err(unimplemented())
    }

    async fn patch(
        &self,
        _caller: AuthContext,
        _visit_id: Uuid,
        _req: PatchVisitReq,
    ) -> Result<VisitSummary, EngineError> {
        Err(unimplemented())
    }

    async fn get(&self, _caller: AuthContext, _visit_id: Uuid) -> Result<VisitSummary, EngineError> {
        Err(unimplemented())
    }

    async fn list(
        &self,
        _caller: AuthContext,
        _filter: VisitListFilter,
        _page: PageRequest,
    ) -> Result<Page<VisitSummary>, EngineError> {
        Err(unimplemented())
    }

    async fn expire(&self, _visit_id: Uuid) -> Result<(), EngineError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct UnreachableNotificationService;

#[async_trait]
impl NotificationService for UnreachableNotificationService {
    async fn list(&self, _user_id: Uuid, _page: PageRequest) -> Result<Page<NotificationSummary>, EngineError> {
        Err(unimplemented())
    }

    async fn mark_read(&self, _user_id: Uuid, _notification_id: Uuid) -> Result<NotificationSummary, EngineError> {
        Err(unimplemented())
    }
}
