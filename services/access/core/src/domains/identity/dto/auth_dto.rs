use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::super::model::Role;

/// Registration request for a resident, staff member, or building admin.
/// `role` is constrained server-side: only `building_admin` may create
/// `security` accounts, and `super_admin` is never self-registered.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RegisterReq {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub phone: String,

    /// Validated against the complexity rule in [`crate::password::validate_password_strength`],
    /// not by this derive alone.
    #[validate(length(min = 8))]
    pub password: String,

    pub role: Role,

    pub building_id: Option<Uuid>,

    pub apartment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginReq {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,

    pub device_fingerprint: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RefreshReq {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LogoutReq {
    #[validate(length(min = 1))]
    pub refresh_token: String,

    /// When true, every session belonging to the caller is revoked instead
    /// of just the one owning `refresh_token`.
    #[serde(default)]
    pub all_devices: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub building_id: Option<Uuid>,
    pub apartment: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResp {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserProfile,
}
