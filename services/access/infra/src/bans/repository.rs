use access_core::domains::bans::model::Ban;
use access_core::domains::bans::repository::BanRepository;
use access_core::domains::notifications::model::Notification;
use async_trait::async_trait;
use shared_error::AppError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::notifications::repository::insert_notification;

#[derive(Clone)]
pub struct PgBanRepository {
    pool: PgPool,
}

impl PgBanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BanRepository for PgBanRepository {
    async fn create(&self, ban: &Ban, pending_notification: Option<&Notification>) -> Result<Ban, AppError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Ban>(
            r#"
            INSERT INTO bans (
                ban_id, owner_id, building_id, phone_e164, target_name, reason,
                severity, ban_type, created_at, expires_at, active, unban_reason, unbanned_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(ban.ban_id)
        .bind(ban.owner_id)
        .bind(ban.building_id)
        .bind(&ban.phone_e164)
        .bind(&ban.target_name)
        .bind(&ban.reason)
        .bind(&ban.severity)
        .bind(&ban.ban_type)
        .bind(ban.created_at)
        .bind(ban.expires_at)
        .bind(ban.active)
        .bind(&ban.unban_reason)
        .bind(ban.unbanned_at)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(notification) = pending_notification {
            insert_notification(&mut *tx, notification).await?;
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn find_by_id(&self, ban_id: Uuid) -> Result<Option<Ban>, AppError> {
        let ban = sqlx::query_as::<_, Ban>("SELECT * FROM bans WHERE ban_id = $1")
            .bind(ban_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(ban)
    }

    async fn find_active_by_owner_and_phone(
        &self,
        owner_id: Uuid,
        phone_e164: &str,
    ) -> Result<Option<Ban>, AppError> {
        let ban = sqlx::query_as::<_, Ban>(
            r#"
            SELECT * FROM bans
            WHERE owner_id = $1 AND phone_e164 = $2 AND active = true
              AND (expires_at IS NULL OR expires_at > NOW())
            "#,
        )
        .bind(owner_id)
        .bind(phone_e164)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ban)
    }

    async fn find_active_in_building(
        &self,
        building_id: Uuid,
        phone_e164: &str,
    ) -> Result<Vec<Ban>, AppError> {
        let bans = sqlx::query_as::<_, Ban>(
            r#"
            SELECT * FROM bans
            WHERE building_id = $1 AND phone_e164 = $2 AND active = true
              AND (expires_at IS NULL OR expires_at > NOW())
            "#,
        )
        .bind(building_id)
        .bind(phone_e164)
        .fetch_all(&self.pool)
        .await?;
        Ok(bans)
    }

    async fn deactivate(
        &self,
        ban_id: Uuid,
        unban_reason: &str,
        pending_notification: Option<&Notification>,
    ) -> Result<Ban, AppError> {
        let mut tx = self.pool.begin().await?;

        let ban = sqlx::query_as::<_, Ban>(
            r#"
            UPDATE bans
            SET active = false, unban_reason = $2, unbanned_at = NOW()
            WHERE ban_id = $1
            RETURNING *
            "#,
        )
        .bind(ban_id)
        .bind(unban_reason)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(notification) = pending_notification {
            insert_notification(&mut *tx, notification).await?;
        }

        tx.commit().await?;
        Ok(ban)
    }
}
