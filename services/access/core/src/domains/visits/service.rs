use async_trait::async_trait;
use shared_types::{Page, PageRequest};
use uuid::Uuid;

use crate::authorize::AuthContext;
use crate::engine_error::EngineError;

use super::dto::visit_dto::{CreateVisitReq, CreateVisitResp, PatchVisitReq, ScanReq, ScanResp, VisitSummary};
use super::repository::VisitListFilter;

#[async_trait]
pub trait VisitEngineService: Send + Sync {
    async fn create(&self, caller: AuthContext, req: CreateVisitReq) -> Result<CreateVisitResp, EngineError>;

    async fn scan(&self, caller: AuthContext, req: ScanReq) -> Result<ScanResp, EngineError>;

    async fn cancel(&self, caller: AuthContext, visit_id: Uuid) -> Result<VisitSummary, EngineError>;

    async fn patch(
        &self,
        caller: AuthContext,
        visit_id: Uuid,
        req: PatchVisitReq,
    ) -> Result<VisitSummary, EngineError>;

    async fn get(&self, caller: AuthContext, visit_id: Uuid) -> Result<VisitSummary, EngineError>;

    async fn list(
        &self,
        caller: AuthContext,
        filter: VisitListFilter,
        page: PageRequest,
    ) -> Result<Page<VisitSummary>, EngineError>;

    /// Invoked by the expiry sweeper, once per overdue visit. Idempotent: a
    /// visit that is already terminal by the time this runs is a no-op.
    async fn expire(&self, visit_id: Uuid) -> Result<(), EngineError>;
}
