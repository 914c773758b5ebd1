use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::super::model::NotificationPriority;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSummary {
    pub notification_id: Uuid,
    pub building_id: Option<Uuid>,
    pub notification_type: String,
    pub title: String,
    pub body: String,
    pub payload: Value,
    pub priority: NotificationPriority,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkReadReq {
    pub notification_id: Uuid,
}
