use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitState {
    Pending,
    Confirmed,
    Active,
    Completed,
    Cancelled,
    Expired,
}

impl VisitState {
    pub fn is_terminal(self) -> bool {
        matches!(self, VisitState::Completed | VisitState::Cancelled | VisitState::Expired)
    }
}

impl fmt::Display for VisitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VisitState::Pending => "pending",
            VisitState::Confirmed => "confirmed",
            VisitState::Active => "active",
            VisitState::Completed => "completed",
            VisitState::Cancelled => "cancelled",
            VisitState::Expired => "expired",
        })
    }
}

impl std::str::FromStr for VisitState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(VisitState::Pending),
            "confirmed" => Ok(VisitState::Confirmed),
            "active" => Ok(VisitState::Active),
            "completed" => Ok(VisitState::Completed),
            "cancelled" => Ok(VisitState::Cancelled),
            "expired" => Ok(VisitState::Expired),
            other => Err(format!("unknown visit state: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitorState {
    Expected,
    Arrived,
    Entered,
    Exited,
    Cancelled,
}

impl VisitorState {
    pub fn is_terminal(self) -> bool {
        matches!(self, VisitorState::Exited | VisitorState::Cancelled)
    }
}

impl fmt::Display for VisitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VisitorState::Expected => "expected",
            VisitorState::Arrived => "arrived",
            VisitorState::Entered => "entered",
            VisitorState::Exited => "exited",
            VisitorState::Cancelled => "cancelled",
        })
    }
}

impl std::str::FromStr for VisitorState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expected" => Ok(VisitorState::Expected),
            "arrived" => Ok(VisitorState::Arrived),
            "entered" => Ok(VisitorState::Entered),
            "exited" => Ok(VisitorState::Exited),
            "cancelled" => Ok(VisitorState::Cancelled),
            other => Err(format!("unknown visitor state: {}", other)),
        }
    }
}

/// One person expected as part of a [`Visit`]. Persisted in `visit_visitors`,
/// a child table keyed by `visit_id`, not a JSON blob — the state machine
/// needs a conditional `UPDATE … WHERE state = expected` per row.
#[derive(Debug, Clone, FromRow)]
pub struct Visitor {
    pub visitor_id: Uuid,
    pub visit_id: Uuid,
    pub display_name: String,
    pub phone_e164: String,
    pub state: String,
    pub entry_at: Option<DateTime<Utc>>,
    pub exit_at: Option<DateTime<Utc>>,
    /// Insertion order within the visit; the scan algorithm's tie-break.
    pub sequence: i32,
}

impl Visitor {
    pub fn state(&self) -> VisitorState {
        self.state.parse().expect("visitor state column holds only valid VisitorState strings")
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Visit {
    pub visit_id: Uuid,
    pub host_id: Uuid,
    pub building_id: Uuid,
    pub purpose: String,
    pub expected_start: DateTime<Utc>,
    pub expected_end: DateTime<Utc>,
    /// `None` once the visit reaches a terminal state (retired).
    pub short_code: Option<String>,
    pub qr_hash: Option<String>,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub last_transition_at: DateTime<Utc>,
}

impl Visit {
    pub fn state(&self) -> VisitState {
        self.state.parse().expect("visit state column holds only valid VisitState strings")
    }
}

/// A visit together with its visitors, the shape repositories return and
/// services operate on.
#[derive(Debug, Clone)]
pub struct VisitWithVisitors {
    pub visit: Visit,
    pub visitors: Vec<Visitor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanAction {
    Entry,
    Exit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_state_round_trips() {
        for s in [
            VisitState::Pending,
            VisitState::Confirmed,
            VisitState::Active,
            VisitState::Completed,
            VisitState::Cancelled,
            VisitState::Expired,
        ] {
            assert_eq!(s.to_string().parse::<VisitState>().unwrap(), s);
        }
    }

    #[test]
    fn test_only_completed_cancelled_expired_are_terminal() {
        assert!(!VisitState::Pending.is_terminal());
        assert!(!VisitState::Confirmed.is_terminal());
        assert!(!VisitState::Active.is_terminal());
        assert!(VisitState::Completed.is_terminal());
        assert!(VisitState::Cancelled.is_terminal());
        assert!(VisitState::Expired.is_terminal());
    }

    #[test]
    fn test_visitor_state_round_trips() {
        for s in [
            VisitorState::Expected,
            VisitorState::Arrived,
            VisitorState::Entered,
            VisitorState::Exited,
            VisitorState::Cancelled,
        ] {
            assert_eq!(s.to_string().parse::<VisitorState>().unwrap(), s);
        }
    }
}
