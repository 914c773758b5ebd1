use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::super::model::{BanSeverity, BanType};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateBanReq {
    #[validate(length(min = 1))]
    pub phone: String,

    #[validate(length(min = 1))]
    pub name: String,

    #[validate(length(min = 1))]
    pub reason: String,

    pub severity: BanSeverity,

    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UnbanReq {
    #[validate(length(min = 1))]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanSummary {
    pub ban_id: Uuid,
    pub owner_id: Uuid,
    pub phone: String,
    pub target_name: String,
    pub reason: String,
    pub severity: BanSeverity,
    pub ban_type: BanType,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
}

/// Response to `BanEngine.check`: the caller's own ban on the phone (if
/// any), every active ban on it within the caller's building, and whether
/// more than one resident has independently banned it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanCheckResp {
    pub user_ban: Option<BanSummary>,
    pub building_bans: Vec<BanSummary>,
    pub multiple: bool,
}
