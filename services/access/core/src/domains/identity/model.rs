use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// The five principal roles in the system. Stored as lowercase varchar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    BuildingAdmin,
    Resident,
    Security,
    Visitor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::SuperAdmin => "super_admin",
            Role::BuildingAdmin => "building_admin",
            Role::Resident => "resident",
            Role::Security => "security",
            Role::Visitor => "visitor",
        })
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Role::SuperAdmin),
            "building_admin" => Ok(Role::BuildingAdmin),
            "resident" => Ok(Role::Resident),
            "security" => Ok(Role::Security),
            "visitor" => Ok(Role::Visitor),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// The tenant boundary. Every non-super-admin user, and every visit, ban,
/// and notification, is scoped to exactly one building.
#[derive(Debug, Clone, FromRow)]
pub struct Building {
    pub building_id: Uuid,
    pub name: String,
    /// Maximum number of active residents this building may hold.
    pub license_quota: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A human principal: resident, staff, or super-admin.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub email_lower: String,
    pub phone_e164: String,
    pub password_hash: String,
    pub role: String,
    /// `None` only for `super_admin`.
    pub building_id: Option<Uuid>,
    /// Set only for `resident`.
    pub apartment: Option<String>,
    pub active: bool,
    pub verified: bool,
    pub failed_login_attempts: i32,
    /// When the current failure streak began, for the rolling lockout
    /// window. Cleared on a successful login or once the window lapses.
    pub first_failed_login_at: Option<DateTime<Utc>>,
    pub lockout_until: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_login_ip: Option<String>,
    pub last_login_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::Visitor)
    }
}

/// An authenticated access window, one row per issued (access, refresh) pair.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub access_token_hash: String,
    pub refresh_token_hash: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    pub device_fingerprint: Option<String>,
    pub origin_ip: Option<String>,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && self.expires_at > now
    }
}
