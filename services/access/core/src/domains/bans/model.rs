use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BanSeverity {
    Low,
    Medium,
    High,
}

impl fmt::Display for BanSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BanSeverity::Low => "low",
            BanSeverity::Medium => "medium",
            BanSeverity::High => "high",
        })
    }
}

impl std::str::FromStr for BanSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(BanSeverity::Low),
            "medium" => Ok(BanSeverity::Medium),
            "high" => Ok(BanSeverity::High),
            other => Err(format!("unknown ban severity: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BanType {
    Manual,
    Automatic,
}

impl fmt::Display for BanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BanType::Manual => "manual",
            BanType::Automatic => "automatic",
        })
    }
}

impl std::str::FromStr for BanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(BanType::Manual),
            "automatic" => Ok(BanType::Automatic),
            other => Err(format!("unknown ban type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Ban {
    pub ban_id: Uuid,
    pub owner_id: Uuid,
    pub building_id: Uuid,
    pub phone_e164: String,
    pub target_name: String,
    pub reason: String,
    pub severity: String,
    pub ban_type: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub unban_reason: Option<String>,
    pub unbanned_at: Option<DateTime<Utc>>,
}

impl Ban {
    pub fn severity(&self) -> BanSeverity {
        self.severity.parse().expect("ban severity column holds only valid BanSeverity strings")
    }

    /// The active-filter predicate: `active` alone is not enough, an
    /// expired-but-not-swept ban must not count (see BanEngine rules — no
    /// sweeper deactivates bans, this predicate does, idempotently).
    pub fn is_currently_active(&self, now: DateTime<Utc>) -> bool {
        self.active && self.expires_at.map(|exp| exp > now).unwrap_or(true)
    }
}
