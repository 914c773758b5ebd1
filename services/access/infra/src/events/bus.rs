use access_core::events::{DomainEvent, EventEnvelope, EventPublisher};
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Capacity of the shared broadcast channel backing every topic. A lagging
/// subscriber starts missing the oldest unread events once its backlog
/// exceeds this; `Subscription::recv` turns that into a `QueueOverflow`
/// envelope rather than surfacing the channel's `Lagged` error.
const INBOX_CAPACITY: usize = 1024;

/// In-process event bus: one broadcast channel carries every envelope,
/// regardless of topic. Subscribers filter by topic on their own side —
/// there is no per-topic fan-out, matching the "no wildcards, per-topic
/// FIFO only" rule (a single channel preserves global publish order, and a
/// subscriber watching one topic sees that topic's events in order too).
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(INBOX_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription { receiver: self.sender.subscribe() }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for EventBus {
    async fn publish(&self, envelope: EventEnvelope) {
        // `send` only errors when there are zero receivers; that's a
        // perfectly normal state (no one online for this topic right now)
        // and not a failure the publisher needs to react to.
        let _ = self.sender.send(envelope);
    }
}

/// A subscriber's view onto the bus: every envelope published after
/// `subscribe()`, topic-unfiltered. Callers (the realtime hub's reader task)
/// filter by the topics they've joined.
pub struct Subscription {
    receiver: broadcast::Receiver<EventEnvelope>,
}

impl Subscription {
    /// Awaits the next envelope. On lag, synthesizes a `QueueOverflow`
    /// envelope carrying the number of events this subscriber missed,
    /// rather than propagating the channel's `Lagged` error.
    pub async fn recv(&mut self) -> Option<EventEnvelope> {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) => return Some(envelope),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    return Some(EventEnvelope::new(
                        "overflow",
                        DomainEvent::QueueOverflow { topic: "overflow".to_string(), dropped_count: skipped },
                    ));
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
