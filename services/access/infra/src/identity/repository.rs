use access_core::domains::identity::model::{Building, Session, User};
use access_core::domains::identity::repository::{BuildingRepository, SessionRepository, UserRepository};
use async_trait::async_trait;
use shared_error::AppError;
use shared_types::{Page, PageRequest};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct PgBuildingRepository {
    pool: PgPool,
}

impl PgBuildingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BuildingRepository for PgBuildingRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Building>, AppError> {
        let building = sqlx::query_as::<_, Building>("SELECT * FROM buildings WHERE building_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(building)
    }

    async fn create(&self, building: &Building) -> Result<Building, AppError> {
        let created = sqlx::query_as::<_, Building>(
            r#"
            INSERT INTO buildings (building_id, name, license_quota, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(building.building_id)
        .bind(&building.name)
        .bind(building.license_quota)
        .bind(building.active)
        .bind(building.created_at)
        .bind(building.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn active_resident_count(&self, building_id: Uuid) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users WHERE building_id = $1 AND role = 'resident' AND active = true",
        )
        .bind(building_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email_lower: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email_lower = $1")
            .bind(email_lower)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_phone(&self, phone_e164: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE phone_e164 = $1")
            .bind(phone_e164)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create(&self, user: &User) -> Result<User, AppError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                user_id, email, email_lower, phone_e164, password_hash, role, building_id,
                apartment, active, verified, failed_login_attempts, lockout_until,
                last_login_at, last_login_ip, last_login_agent, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
        .bind(user.user_id)
        .bind(&user.email)
        .bind(&user.email_lower)
        .bind(&user.phone_e164)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(user.building_id)
        .bind(&user.apartment)
        .bind(user.active)
        .bind(user.verified)
        .bind(user.failed_login_attempts)
        .bind(user.lockout_until)
        .bind(user.last_login_at)
        .bind(&user.last_login_ip)
        .bind(&user.last_login_agent)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update(&self, user: &User) -> Result<User, AppError> {
        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = $2, email_lower = $3, phone_e164 = $4, password_hash = $5, role = $6,
                building_id = $7, apartment = $8, active = $9, verified = $10,
                failed_login_attempts = $11, lockout_until = $12, last_login_at = $13,
                last_login_ip = $14, last_login_agent = $15, updated_at = NOW()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user.user_id)
        .bind(&user.email)
        .bind(&user.email_lower)
        .bind(&user.phone_e164)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(user.building_id)
        .bind(&user.apartment)
        .bind(user.active)
        .bind(user.verified)
        .bind(user.failed_login_attempts)
        .bind(user.lockout_until)
        .bind(user.last_login_at)
        .bind(&user.last_login_ip)
        .bind(&user.last_login_agent)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn list_by_building(
        &self,
        building_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<User>, AppError> {
        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE building_id = $1")
                .bind(building_id)
                .fetch_one(&self.pool)
                .await?;

        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE building_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(building_id)
        .bind(page.per_page() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(users, total, page))
    }
}

#[derive(Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn find_by_access_hash(&self, hash: &str) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE access_token_hash = $1")
            .bind(hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }

    async fn find_by_refresh_hash(&self, hash: &str) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE refresh_token_hash = $1")
            .bind(hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }

    async fn create(&self, session: &Session) -> Result<Session, AppError> {
        let created = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (
                session_id, user_id, access_token_hash, refresh_token_hash, issued_at,
                expires_at, refresh_expires_at, device_fingerprint, origin_ip, revoked, revoked_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(session.session_id)
        .bind(session.user_id)
        .bind(&session.access_token_hash)
        .bind(&session.refresh_token_hash)
        .bind(session.issued_at)
        .bind(session.expires_at)
        .bind(session.refresh_expires_at)
        .bind(&session.device_fingerprint)
        .bind(&session.origin_ip)
        .bind(session.revoked)
        .bind(session.revoked_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn revoke(&self, session_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE sessions SET revoked = true, revoked_at = NOW() WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE sessions SET revoked = true, revoked_at = NOW() WHERE user_id = $1 AND revoked = false",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
