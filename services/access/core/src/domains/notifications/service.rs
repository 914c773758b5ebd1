use async_trait::async_trait;
use shared_types::{Page, PageRequest};
use uuid::Uuid;

use crate::engine_error::EngineError;

use super::dto::notification_dto::NotificationSummary;

#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn list(&self, user_id: Uuid, page: PageRequest) -> Result<Page<NotificationSummary>, EngineError>;

    async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<NotificationSummary, EngineError>;
}
