//! In-memory repository fakes for the ban and visit domains, used to
//! exercise the engines' cross-cutting properties without a database.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_error::AppError;
use shared_types::{Page, PageRequest};
use uuid::Uuid;

use access_core::domains::bans::model::Ban;
use access_core::domains::bans::repository::BanRepository;
use access_core::domains::identity::model::{Building, Session, User};
use access_core::domains::identity::repository::{BuildingRepository, SessionRepository, UserRepository};
use access_core::domains::notifications::model::Notification;
use access_core::domains::visits::model::{ScanAction, Visit, VisitState, Visitor, VisitorState, VisitWithVisitors};
use access_core::domains::visits::repository::{VisitListFilter, VisitRepository};

#[derive(Default)]
pub struct FakeBuildingRepository {
    buildings: Mutex<Vec<Building>>,
}

impl FakeBuildingRepository {
    pub fn seeded(building: Building) -> Self {
        Self { buildings: Mutex::new(vec![building]) }
    }
}

#[async_trait]
impl BuildingRepository for FakeBuildingRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Building>, AppError> {
        Ok(self.buildings.lock().unwrap().iter().find(|b| b.building_id == id).cloned())
    }

    async fn create(&self, building: &Building) -> Result<Building, AppError> {
        self.buildings.lock().unwrap().push(building.clone());
        Ok(building.clone())
    }

    async fn active_resident_count(&self, _building_id: Uuid) -> Result<i64, AppError> {
        Ok(0)
    }
}

#[derive(Default)]
pub struct FakeUserRepository {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for FakeUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.user_id == id).cloned())
    }

    async fn find_by_email(&self, email_lower: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.email_lower == email_lower).cloned())
    }

    async fn find_by_phone(&self, phone_e164: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.phone_e164 == phone_e164).cloned())
    }

    async fn create(&self, user: &User) -> Result<User, AppError> {
        self.users.lock().unwrap().push(user.clone());
        Ok(user.clone())
    }

    async fn update(&self, user: &User) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        let slot = users
            .iter_mut()
            .find(|u| u.user_id == user.user_id)
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;
        *slot = user.clone();
        Ok(slot.clone())
    }

    async fn list_by_building(&self, building_id: Uuid, page: PageRequest) -> Result<Page<User>, AppError> {
        let users = self.users.lock().unwrap();
        let matching: Vec<User> = users.iter().filter(|u| u.building_id == Some(building_id)).cloned().collect();
        let total = matching.len() as i64;
        Ok(Page::new(matching, total, page))
    }
}

#[derive(Default)]
pub struct FakeSessionRepository {
    sessions: Mutex<Vec<Session>>,
}

#[async_trait]
impl SessionRepository for FakeSessionRepository {
    async fn find_by_access_hash(&self, hash: &str) -> Result<Option<Session>, AppError> {
        Ok(self.sessions.lock().unwrap().iter().find(|s| s.access_token_hash == hash).cloned())
    }

    async fn find_by_refresh_hash(&self, hash: &str) -> Result<Option<Session>, AppError> {
        Ok(self.sessions.lock().unwrap().iter().find(|s| s.refresh_token_hash == hash).cloned())
    }

    async fn create(&self, session: &Session) -> Result<Session, AppError> {
        self.sessions.lock().unwrap().push(session.clone());
        Ok(session.clone())
    }

    async fn revoke(&self, session_id: Uuid) -> Result<(), AppError> {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(session) = sessions.iter_mut().find(|s| s.session_id == session_id) {
            session.revoked = true;
            session.revoked_at = Some(chrono::Utc::now());
        }
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<(), AppError> {
        let mut sessions = self.sessions.lock().unwrap();
        for session in sessions.iter_mut().filter(|s| s.user_id == user_id) {
            session.revoked = true;
            session.revoked_at = Some(chrono::Utc::now());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeBanRepository {
    bans: Mutex<Vec<Ban>>,
    pub notifications: Mutex<Vec<Notification>>,
}

#[async_trait]
impl BanRepository for FakeBanRepository {
    async fn create(&self, ban: &Ban, pending_notification: Option<&Notification>) -> Result<Ban, AppError> {
        self.bans.lock().unwrap().push(ban.clone());
        if let Some(n) = pending_notification {
            self.notifications.lock().unwrap().push(n.clone());
        }
        Ok(ban.clone())
    }

    async fn find_by_id(&self, ban_id: Uuid) -> Result<Option<Ban>, AppError> {
        Ok(self.bans.lock().unwrap().iter().find(|b| b.ban_id == ban_id).cloned())
    }

    async fn find_active_by_owner_and_phone(
        &self,
        owner_id: Uuid,
        phone_e164: &str,
    ) -> Result<Option<Ban>, AppError> {
        let now = Utc::now();
        Ok(self
            .bans
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.owner_id == owner_id && b.phone_e164 == phone_e164 && b.is_currently_active(now))
            .cloned())
    }

    async fn find_active_in_building(&self, building_id: Uuid, phone_e164: &str) -> Result<Vec<Ban>, AppError> {
        let now = Utc::now();
        Ok(self
            .bans
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.building_id == building_id && b.phone_e164 == phone_e164 && b.is_currently_active(now))
            .cloned()
            .collect())
    }

    async fn deactivate(
        &self,
        ban_id: Uuid,
        unban_reason: &str,
        pending_notification: Option<&Notification>,
    ) -> Result<Ban, AppError> {
        let updated = {
            let mut bans = self.bans.lock().unwrap();
            let ban = bans
                .iter_mut()
                .find(|b| b.ban_id == ban_id)
                .ok_or_else(|| AppError::NotFound("ban not found".to_string()))?;
            ban.active = false;
            ban.unban_reason = Some(unban_reason.to_string());
            ban.unbanned_at = Some(Utc::now());
            ban.clone()
        };
        if let Some(n) = pending_notification {
            self.notifications.lock().unwrap().push(n.clone());
        }
        Ok(updated)
    }
}

#[derive(Default)]
pub struct FakeVisitRepository {
    visits: Mutex<Vec<Visit>>,
    visitors: Mutex<Vec<Visitor>>,
    pub notifications: Mutex<Vec<Notification>>,
}

impl FakeVisitRepository {
    fn load(&self, visit_id: Uuid) -> Option<VisitWithVisitors> {
        let visit = self.visits.lock().unwrap().iter().find(|v| v.visit_id == visit_id).cloned()?;
        let visitors =
            self.visitors.lock().unwrap().iter().filter(|v| v.visit_id == visit_id).cloned().collect();
        Some(VisitWithVisitors { visit, visitors })
    }
}

#[async_trait]
impl VisitRepository for FakeVisitRepository {
    async fn create(
        &self,
        visit: &Visit,
        visitors: &[Visitor],
        pending_notification: Option<&Notification>,
    ) -> Result<VisitWithVisitors, AppError> {
        self.visits.lock().unwrap().push(visit.clone());
        self.visitors.lock().unwrap().extend(visitors.iter().cloned());
        if let Some(n) = pending_notification {
            self.notifications.lock().unwrap().push(n.clone());
        }
        Ok(VisitWithVisitors { visit: visit.clone(), visitors: visitors.to_vec() })
    }

    async fn find_by_id(&self, visit_id: Uuid) -> Result<Option<VisitWithVisitors>, AppError> {
        Ok(self.load(visit_id))
    }

    async fn find_by_qr_hash(&self, qr_hash: &str) -> Result<Option<VisitWithVisitors>, AppError> {
        let visit_id = self
            .visits
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.qr_hash.as_deref() == Some(qr_hash))
            .map(|v| v.visit_id);
        Ok(visit_id.and_then(|id| self.load(id)))
    }

    async fn find_by_short_code(
        &self,
        building_id: Uuid,
        short_code: &str,
    ) -> Result<Option<VisitWithVisitors>, AppError> {
        let visit_id = self
            .visits
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.building_id == building_id && v.short_code.as_deref() == Some(short_code))
            .map(|v| v.visit_id);
        Ok(visit_id.and_then(|id| self.load(id)))
    }

    async fn list(&self, filter: VisitListFilter, page: PageRequest) -> Result<Page<Visit>, AppError> {
        let matching: Vec<Visit> = self
            .visits
            .lock()
            .unwrap()
            .iter()
            .filter(|v| filter.building_id.map_or(true, |b| v.building_id == b))
            .filter(|v| filter.host_id.map_or(true, |h| v.host_id == h))
            .filter(|v| filter.state.map_or(true, |s| v.state() == s))
            .cloned()
            .collect();
        let total = matching.len() as i64;
        Ok(Page::new(matching, total, page))
    }

    async fn update_details(
        &self,
        visit_id: Uuid,
        purpose: Option<String>,
        expected_start: Option<DateTime<Utc>>,
        expected_end: Option<DateTime<Utc>>,
    ) -> Result<Visit, AppError> {
        let mut visits = self.visits.lock().unwrap();
        let visit = visits
            .iter_mut()
            .find(|v| v.visit_id == visit_id)
            .ok_or_else(|| AppError::NotFound("visit not found".to_string()))?;
        if let Some(purpose) = purpose {
            visit.purpose = purpose;
        }
        if let Some(start) = expected_start {
            visit.expected_start = start;
        }
        if let Some(end) = expected_end {
            visit.expected_end = end;
        }
        Ok(visit.clone())
    }

    async fn try_transition_visit_state(
        &self,
        visit_id: Uuid,
        from: VisitState,
        to: VisitState,
    ) -> Result<bool, AppError> {
        let mut visits = self.visits.lock().unwrap();
        let Some(visit) = visits.iter_mut().find(|v| v.visit_id == visit_id) else {
            return Ok(false);
        };
        if visit.state() != from {
            return Ok(false);
        }
        visit.state = to.to_string();
        visit.last_transition_at = Utc::now();
        Ok(true)
    }

    async fn try_transition_visitor_state(
        &self,
        visitor_id: Uuid,
        from: VisitorState,
        to: VisitorState,
        action: ScanAction,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut visitors = self.visitors.lock().unwrap();
        let Some(visitor) = visitors.iter_mut().find(|v| v.visitor_id == visitor_id) else {
            return Ok(false);
        };
        if visitor.state() != from {
            return Ok(false);
        }
        visitor.state = to.to_string();
        match action {
            ScanAction::Entry => visitor.entry_at = Some(at),
            ScanAction::Exit => visitor.exit_at = Some(at),
        }
        Ok(true)
    }

    async fn next_visitor_in_state(
        &self,
        visit_id: Uuid,
        state: VisitorState,
    ) -> Result<Option<Visitor>, AppError> {
        let mut matching: Vec<Visitor> = self
            .visitors
            .lock()
            .unwrap()
            .iter()
            .filter(|v| v.visit_id == visit_id && v.state() == state)
            .cloned()
            .collect();
        matching.sort_by_key(|v| v.sequence);
        Ok(matching.into_iter().next())
    }

    async fn count_visitors_in_state(&self, visit_id: Uuid, state: VisitorState) -> Result<i64, AppError> {
        Ok(self
            .visitors
            .lock()
            .unwrap()
            .iter()
            .filter(|v| v.visit_id == visit_id && v.state() == state)
            .count() as i64)
    }

    async fn retire_codes(&self, visit_id: Uuid) -> Result<(), AppError> {
        if let Some(visit) = self.visits.lock().unwrap().iter_mut().find(|v| v.visit_id == visit_id) {
            visit.short_code = None;
            visit.qr_hash = None;
        }
        Ok(())
    }

    async fn cancel_non_terminal_visitors(&self, visit_id: Uuid) -> Result<(), AppError> {
        for visitor in self.visitors.lock().unwrap().iter_mut().filter(|v| v.visit_id == visit_id) {
            if !visitor.state().is_terminal() {
                visitor.state = VisitorState::Cancelled.to_string();
            }
        }
        Ok(())
    }

    async fn find_expired_candidates(&self, cutoff: DateTime<Utc>) -> Result<Vec<Visit>, AppError> {
        Ok(self
            .visits
            .lock()
            .unwrap()
            .iter()
            .filter(|v| !v.state().is_terminal() && v.expected_end < cutoff)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl<T: BanRepository> BanRepository for Arc<T> {
    async fn create(&self, ban: &Ban, pending_notification: Option<&Notification>) -> Result<Ban, AppError> {
        (**self).create(ban, pending_notification).await
    }

    async fn find_by_id(&self, ban_id: Uuid) -> Result<Option<Ban>, AppError> {
        (**self).find_by_id(ban_id).await
    }

    async fn find_active_by_owner_and_phone(
        &self,
        owner_id: Uuid,
        phone_e164: &str,
    ) -> Result<Option<Ban>, AppError> {
        (**self).find_active_by_owner_and_phone(owner_id, phone_e164).await
    }

    async fn find_active_in_building(&self, building_id: Uuid, phone_e164: &str) -> Result<Vec<Ban>, AppError> {
        (**self).find_active_in_building(building_id, phone_e164).await
    }

    async fn deactivate(
        &self,
        ban_id: Uuid,
        unban_reason: &str,
        pending_notification: Option<&Notification>,
    ) -> Result<Ban, AppError> {
        (**self).deactivate(ban_id, unban_reason, pending_notification).await
    }
}

#[async_trait]
impl<T: VisitRepository> VisitRepository for Arc<T> {
    async fn create(
        &self,
        visit: &Visit,
        visitors: &[Visitor],
        pending_notification: Option<&Notification>,
    ) -> Result<VisitWithVisitors, AppError> {
        (**self).create(visit, visitors, pending_notification).await
    }

    async fn find_by_id(&self, visit_id: Uuid) -> Result<Option<VisitWithVisitors>, AppError> {
        (**self).find_by_id(visit_id).await
    }

    async fn find_by_qr_hash(&self, qr_hash: &str) -> Result<Option<VisitWithVisitors>, AppError> {
        (**self).find_by_qr_hash(qr_hash).await
    }

    async fn find_by_short_code(
        &self,
        building_id: Uuid,
        short_code: &str,
    ) -> Result<Option<VisitWithVisitors>, AppError> {
        (**self).find_by_short_code(building_id, short_code).await
    }

    async fn list(&self, filter: VisitListFilter, page: PageRequest) -> Result<Page<Visit>, AppError> {
        (**self).list(filter, page).await
    }

    async fn update_details(
        &self,
        visit_id: Uuid,
        purpose: Option<String>,
        expected_start: Option<DateTime<Utc>>,
        expected_end: Option<DateTime<Utc>>,
    ) -> Result<Visit, AppError> {
        (**self).update_details(visit_id, purpose, expected_start, expected_end).await
    }

    async fn try_transition_visit_state(
        &self,
        visit_id: Uuid,
        from: VisitState,
        to: VisitState,
    ) -> Result<bool, AppError> {
        (**self).try_transition_visit_state(visit_id, from, to).await
    }

    async fn try_transition_visitor_state(
        &self,
        visitor_id: Uuid,
        from: VisitorState,
        to: VisitorState,
        action: ScanAction,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        (**self).try_transition_visitor_state(visitor_id, from, to, action, at).await
    }

    async fn next_visitor_in_state(&self, visit_id: Uuid, state: VisitorState) -> Result<Option<Visitor>, AppError> {
        (**self).next_visitor_in_state(visit_id, state).await
    }

    async fn count_visitors_in_state(&self, visit_id: Uuid, state: VisitorState) -> Result<i64, AppError> {
        (**self).count_visitors_in_state(visit_id, state).await
    }

    async fn retire_codes(&self, visit_id: Uuid) -> Result<(), AppError> {
        (**self).retire_codes(visit_id).await
    }

    async fn cancel_non_terminal_visitors(&self, visit_id: Uuid) -> Result<(), AppError> {
        (**self).cancel_non_terminal_visitors(visit_id).await
    }

    async fn find_expired_candidates(&self, cutoff: DateTime<Utc>) -> Result<Vec<Visit>, AppError> {
        (**self).find_expired_candidates(cutoff).await
    }
}
