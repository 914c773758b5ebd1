use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping every event published on the bus, independent of its
/// payload shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub topic: String,
    pub timestamp: DateTime<Utc>,
    pub event: DomainEvent,
}

impl EventEnvelope {
    pub fn new(topic: impl Into<String>, event: DomainEvent) -> Self {
        Self { event_id: Uuid::now_v7(), topic: topic.into(), timestamp: Utc::now(), event }
    }
}

/// Closed set of event payloads. Every variant is a concrete, serializable
/// shape; nothing duck-typed reaches a subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    VisitCreated {
        visit_id: Uuid,
        building_id: Uuid,
        host_id: Uuid,
        short_code: String,
        expected_at: DateTime<Utc>,
    },
    VisitorScanned {
        visit_id: Uuid,
        building_id: Uuid,
        visitor_index: usize,
        visitor_state: String,
    },
    VisitStateChanged {
        visit_id: Uuid,
        building_id: Uuid,
        from: String,
        to: String,
    },
    VisitCancelled {
        visit_id: Uuid,
        building_id: Uuid,
        cancelled_by: Uuid,
    },
    VisitExpired {
        visit_id: Uuid,
        building_id: Uuid,
    },
    BanCreated {
        ban_id: Uuid,
        owner_id: Uuid,
        building_id: Option<Uuid>,
        phone_e164: String,
        severity: String,
    },
    BanRemoved {
        ban_id: Uuid,
        owner_id: Uuid,
        building_id: Option<Uuid>,
    },
    NotificationCreated {
        notification_id: Uuid,
        user_id: Uuid,
        title: String,
        priority: String,
    },
    QueueOverflow {
        topic: String,
        dropped_count: u64,
    },
    UserOnline {
        user_id: Uuid,
        building_id: Option<Uuid>,
    },
    UserOffline {
        user_id: Uuid,
        building_id: Option<Uuid>,
    },
}

/// Publishing side of the bus, as seen by engines. Implementations own
/// routing, per-topic ordering, and the bounded-inbox overflow policy;
/// engines only ever hand over an envelope and move on.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, envelope: EventEnvelope);
}

/// The three topic shapes named in the event model: a single user's inbox,
/// a building-wide channel, and a role-scoped channel within a building.
pub fn user_topic(user_id: Uuid) -> String {
    format!("user:{}", user_id)
}

pub fn building_topic(building_id: Uuid) -> String {
    format!("building:{}", building_id)
}

pub fn role_topic(role: &str, building_id: Uuid) -> String {
    format!("role:{}@{}", role, building_id)
}
