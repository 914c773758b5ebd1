use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::super::model::{VisitState, VisitorState};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct VisitorReq {
    #[validate(length(min = 1))]
    pub name: String,

    #[validate(length(min = 1))]
    pub phone: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateVisitReq {
    #[validate(length(min = 1))]
    #[validate(nested)]
    pub visitors: Vec<VisitorReq>,

    #[validate(length(min = 1))]
    pub purpose: String,

    pub expected_start: DateTime<Utc>,
    pub expected_end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitorSummary {
    pub visitor_id: Uuid,
    pub name: String,
    pub phone: String,
    pub state: VisitorState,
    pub entry_at: Option<DateTime<Utc>>,
    pub exit_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitSummary {
    pub visit_id: Uuid,
    pub host_id: Uuid,
    pub building_id: Uuid,
    pub purpose: String,
    pub expected_start: DateTime<Utc>,
    pub expected_end: DateTime<Utc>,
    /// `None` once the visit is terminal — codes are retired.
    pub short_code: Option<String>,
    pub state: VisitState,
    pub visitors: Vec<VisitorSummary>,
    pub created_at: DateTime<Utc>,
}

/// A one-time view handed back at creation, carrying the plaintext QR
/// payload that is never stored or returned again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVisitResp {
    pub visit: VisitSummary,
    pub qr: String,
    /// Phones that triggered a low-severity ban warning without blocking
    /// creation.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScanActionReq {
    Entry,
    Exit,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ScanReq {
    #[validate(length(min = 1))]
    pub code: String,
    pub action: ScanActionReq,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResp {
    pub visit: VisitSummary,
    pub visitor: VisitorSummary,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct PatchVisitReq {
    pub purpose: Option<String>,
    pub expected_start: Option<DateTime<Utc>>,
    pub expected_end: Option<DateTime<Utc>>,
}
