use access_core::domains::notifications::model::Notification;
use access_core::domains::notifications::repository::NotificationRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_error::AppError;
use shared_types::{Page, PageRequest};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Shared by [`PgNotificationRepository::create`] and by the visit/ban
/// repositories, which insert a notification row against their own open
/// transaction instead of this repository's pool so the row commits
/// atomically with the state change that produced it.
pub(crate) async fn insert_notification<'e, E>(
    executor: E,
    notification: &Notification,
) -> Result<Notification, AppError>
where
    E: sqlx::PgExecutor<'e>,
{
    let created = sqlx::query_as::<_, Notification>(
        r#"
        INSERT INTO notifications (
            notification_id, user_id, building_id, notification_type, title, body,
            payload, priority, read, created_at, expires_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(notification.notification_id)
    .bind(notification.user_id)
    .bind(notification.building_id)
    .bind(&notification.notification_type)
    .bind(&notification.title)
    .bind(&notification.body)
    .bind(&notification.payload)
    .bind(&notification.priority)
    .bind(notification.read)
    .bind(notification.created_at)
    .bind(notification.expires_at)
    .fetch_one(executor)
    .await?;
    Ok(created)
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn create(&self, notification: &Notification) -> Result<Notification, AppError> {
        insert_notification(&self.pool, notification).await
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Notification>, AppError> {
        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1
            ORDER BY read ASC, created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.per_page() as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(notifications, total, page))
    }

    async fn mark_read(&self, notification_id: Uuid, user_id: Uuid) -> Result<Notification, AppError> {
        let updated = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET read = true
            WHERE notification_id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(notification_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete_expired(
        &self,
        created_before: DateTime<Utc>,
        read_before: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM notifications
            WHERE created_at < $1 OR (read = true AND created_at < $2)
            "#,
        )
        .bind(created_before)
        .bind(read_before)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
