use async_trait::async_trait;
use uuid::Uuid;

use crate::engine_error::EngineError;

use super::dto::auth_dto::{AuthResp, LoginReq, RegisterReq, UserProfile};

/// Session-and-identity engine: registration, login, token lifecycle, and
/// the authorization predicate consumers call before invoking another
/// engine. Implementations own password hashing, lockout enforcement, and
/// token issuance; callers never see a raw [`shared_error::AppError`] —
/// only [`EngineError`], folded down at the HTTP/WS boundary.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Creates a new user. Enforces email/phone uniqueness, password
    /// complexity, and the building's license quota before issuing a
    /// session for the new account.
    async fn register(&self, req: RegisterReq) -> Result<AuthResp, EngineError>;

    /// Verifies credentials and issues a new session. Subject to the
    /// account lockout policy: repeated failures lock the account out for
    /// a fixed duration after the configured threshold.
    async fn login(&self, req: LoginReq, origin_ip: Option<String>) -> Result<AuthResp, EngineError>;

    /// Validates an access token and returns the identity it carries.
    /// Callers (the HTTP/WS edge) use this to build an [`crate::authorize::AuthContext`].
    async fn verify_access_token(&self, access_token: &str) -> Result<UserProfile, EngineError>;

    /// Exchanges a refresh token for a new (access, refresh) pair. The
    /// presented refresh token's session is revoked as part of rotation.
    async fn refresh(&self, refresh_token: &str) -> Result<AuthResp, EngineError>;

    /// Revokes the session owning this refresh token.
    async fn revoke(&self, refresh_token: &str) -> Result<(), EngineError>;

    /// Revokes every session belonging to a user, used when an account is
    /// deactivated.
    async fn revoke_all(&self, user_id: Uuid) -> Result<(), EngineError>;

    async fn get_profile(&self, user_id: Uuid) -> Result<UserProfile, EngineError>;
}
