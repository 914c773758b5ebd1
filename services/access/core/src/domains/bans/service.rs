use async_trait::async_trait;
use uuid::Uuid;

use crate::authorize::AuthContext;
use crate::engine_error::EngineError;

use super::dto::ban_dto::{BanCheckResp, BanSummary, CreateBanReq, UnbanReq};
use super::model::{Ban, BanSeverity};

/// The severity floor at which a ban blocks visit creation outright; below
/// it the caller only receives a warning. See the building-wide-ban open
/// question resolved in the design ledger.
pub const BLOCKING_SEVERITY_FLOOR: BanSeverity = BanSeverity::Medium;

#[async_trait]
pub trait BanEngineService: Send + Sync {
    async fn ban(&self, caller: AuthContext, req: CreateBanReq) -> Result<BanSummary, EngineError>;

    async fn unban(&self, caller: AuthContext, ban_id: Uuid, req: UnbanReq) -> Result<BanSummary, EngineError>;

    async fn check(&self, caller: AuthContext, phone: &str) -> Result<BanCheckResp, EngineError>;

    /// Pure predicate: is `phone` banned by `owner_id` right now? Used
    /// directly by `VisitEngine.create`'s host-ban check.
    async fn is_banned_by_user(&self, owner_id: Uuid, phone_e164: &str) -> Result<Option<Ban>, EngineError>;

    /// Pure predicate: every active ban on `phone` whose owner belongs to
    /// `building_id`. Used by `VisitEngine.create`'s per-visitor check.
    async fn is_banned_in_building(
        &self,
        building_id: Uuid,
        phone_e164: &str,
    ) -> Result<Vec<Ban>, EngineError>;
}
