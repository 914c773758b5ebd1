use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_error::AppError;
use shared_types::{Page, PageRequest};
use uuid::Uuid;

use super::model::Notification;

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &Notification) -> Result<Notification, AppError>;

    async fn list_for_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Notification>, AppError>;

    async fn mark_read(&self, notification_id: Uuid, user_id: Uuid) -> Result<Notification, AppError>;

    /// Deletes notifications matching the retention policy: older than
    /// `created_before`, or read and older than `read_before`. Returns the
    /// number of rows removed, for the sweeper's log line.
    async fn delete_expired(
        &self,
        created_before: DateTime<Utc>,
        read_before: DateTime<Utc>,
    ) -> Result<u64, AppError>;
}
