use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_error::AppError;
use shared_types::{Page, PageRequest};
use uuid::Uuid;

use super::model::{ScanAction, Visit, VisitState, Visitor, VisitorState, VisitWithVisitors};
use crate::domains::notifications::model::Notification;

/// Filters accepted by [`VisitRepository::list`]. Named fields, not a
/// generic conditions bag — see the typed-repository redesign note.
#[derive(Debug, Clone, Default)]
pub struct VisitListFilter {
    pub building_id: Option<Uuid>,
    pub host_id: Option<Uuid>,
    pub state: Option<VisitState>,
}

#[async_trait]
pub trait VisitRepository: Send + Sync {
    /// `pending_notification`, when present, is inserted in the same
    /// transaction as the visit and its visitors — the durable half of the
    /// `VisitCreated` event published to the host's `user:{uuid}` topic.
    async fn create(
        &self,
        visit: &Visit,
        visitors: &[Visitor],
        pending_notification: Option<&Notification>,
    ) -> Result<VisitWithVisitors, AppError>;

    async fn find_by_id(&self, visit_id: Uuid) -> Result<Option<VisitWithVisitors>, AppError>;

    /// Only ever matches a visit in a non-terminal state; terminal visits
    /// have their `qr_hash` cleared by the repository at retirement.
    async fn find_by_qr_hash(&self, qr_hash: &str) -> Result<Option<VisitWithVisitors>, AppError>;

    /// Only ever matches a visit in a non-terminal state, for the same
    /// reason as [`Self::find_by_qr_hash`].
    async fn find_by_short_code(
        &self,
        building_id: Uuid,
        short_code: &str,
    ) -> Result<Option<VisitWithVisitors>, AppError>;

    async fn list(&self, filter: VisitListFilter, page: PageRequest) -> Result<Page<Visit>, AppError>;

    /// Updates the mutable, non-state fields of a non-terminal visit.
    /// `None` fields are left unchanged.
    async fn update_details(
        &self,
        visit_id: Uuid,
        purpose: Option<String>,
        expected_start: Option<DateTime<Utc>>,
        expected_end: Option<DateTime<Utc>>,
    ) -> Result<Visit, AppError>;

    /// Conditional `UPDATE … WHERE state = from`. Returns `true` iff the row
    /// existed and matched `from` (the at-most-once primitive the scan
    /// algorithm builds on).
    async fn try_transition_visit_state(
        &self,
        visit_id: Uuid,
        from: VisitState,
        to: VisitState,
    ) -> Result<bool, AppError>;

    /// Conditional `UPDATE … WHERE state = from`, stamping `entry_at` or
    /// `exit_at` depending on `action`.
    async fn try_transition_visitor_state(
        &self,
        visitor_id: Uuid,
        from: VisitorState,
        to: VisitorState,
        action: ScanAction,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError>;

    /// The next visitor in insertion order currently in `state`, the scan
    /// algorithm's tie-break rule.
    async fn next_visitor_in_state(
        &self,
        visit_id: Uuid,
        state: VisitorState,
    ) -> Result<Option<Visitor>, AppError>;

    async fn count_visitors_in_state(
        &self,
        visit_id: Uuid,
        state: VisitorState,
    ) -> Result<i64, AppError>;

    /// Clears `short_code`/`qr_hash`, retiring their unique-index partial
    /// keys, once a visit reaches a terminal state.
    async fn retire_codes(&self, visit_id: Uuid) -> Result<(), AppError>;

    async fn cancel_non_terminal_visitors(&self, visit_id: Uuid) -> Result<(), AppError>;

    /// Non-terminal visits whose `expected_end + grace` has already passed,
    /// for the expiry sweeper.
    async fn find_expired_candidates(&self, cutoff: DateTime<Utc>) -> Result<Vec<Visit>, AppError>;
}
