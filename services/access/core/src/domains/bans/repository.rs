use async_trait::async_trait;
use shared_error::AppError;
use uuid::Uuid;

use super::model::Ban;
use crate::domains::notifications::model::Notification;

#[async_trait]
pub trait BanRepository: Send + Sync {
    /// `pending_notification`, when present, is inserted in the same
    /// transaction as the ban — the durable half of the `BanCreated` event
    /// published to the owner's `user:{uuid}` topic.
    async fn create(&self, ban: &Ban, pending_notification: Option<&Notification>) -> Result<Ban, AppError>;

    async fn find_by_id(&self, ban_id: Uuid) -> Result<Option<Ban>, AppError>;

    /// The active ban, if any, that `owner` holds on `phone_e164`. At most
    /// one row satisfies this per the unique partial index.
    async fn find_active_by_owner_and_phone(
        &self,
        owner_id: Uuid,
        phone_e164: &str,
    ) -> Result<Option<Ban>, AppError>;

    /// Every active ban on `phone_e164` whose owner belongs to `building_id`.
    async fn find_active_in_building(
        &self,
        building_id: Uuid,
        phone_e164: &str,
    ) -> Result<Vec<Ban>, AppError>;

    /// `pending_notification`, when present, is inserted in the same
    /// transaction as the deactivation — the durable half of the
    /// `BanRemoved` event published to the owner's `user:{uuid}` topic.
    async fn deactivate(
        &self,
        ban_id: Uuid,
        unban_reason: &str,
        pending_notification: Option<&Notification>,
    ) -> Result<Ban, AppError>;
}
