use async_trait::async_trait;
use shared_error::AppError;
use shared_types::{Page, PageRequest};
use uuid::Uuid;

use super::model::{Building, Session, User};

/// Building repository.
#[async_trait]
pub trait BuildingRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Building>, AppError>;
    async fn create(&self, building: &Building) -> Result<Building, AppError>;
    /// Count of active residents currently assigned to this building, used
    /// to enforce the license quota invariant at registration time.
    async fn active_resident_count(&self, building_id: Uuid) -> Result<i64, AppError>;
}

/// User repository. Implementations must keep `email_lower`/`phone_e164`
/// unique among active users at the storage layer (unique index), not here.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email_lower: &str) -> Result<Option<User>, AppError>;
    async fn find_by_phone(&self, phone_e164: &str) -> Result<Option<User>, AppError>;
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn update(&self, user: &User) -> Result<User, AppError>;
    async fn list_by_building(
        &self,
        building_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<User>, AppError>;
}

/// Session repository. Tokens are stored only as hashes; the raw value is
/// never persisted.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn find_by_access_hash(&self, hash: &str) -> Result<Option<Session>, AppError>;
    async fn find_by_refresh_hash(&self, hash: &str) -> Result<Option<Session>, AppError>;
    async fn create(&self, session: &Session) -> Result<Session, AppError>;
    async fn revoke(&self, session_id: Uuid) -> Result<(), AppError>;
    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<(), AppError>;
}
