use std::sync::Arc;
use std::time::Duration;

use access_core::domains::notifications::repository::NotificationRepository;
use chrono::Utc;

const READ_RETENTION_DAYS: i64 = 7;

/// Periodically deletes notifications older than the retention window, or
/// read and older than the shorter read-retention window.
pub async fn run_retention_sweeper<NR>(
    notification_repo: Arc<NR>,
    retention_days: i64,
    interval: Duration,
) where
    NR: NotificationRepository,
{
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;

        let created_before = Utc::now() - chrono::Duration::days(retention_days);
        let read_before = Utc::now() - chrono::Duration::days(READ_RETENTION_DAYS);

        match notification_repo.delete_expired(created_before, read_before).await {
            Ok(deleted) if deleted > 0 => {
                tracing::info!(deleted, "notification retention sweeper removed expired rows");
            },
            Ok(_) => {},
            Err(err) => {
                tracing::warn!(error = %err, "notification retention sweeper failed");
            },
        }
    }
}
