//! In-memory repository fakes for the identity domain, used to exercise the
//! HTTP surface end-to-end without a database.

pub mod stubs;

use std::sync::Mutex;

use async_trait::async_trait;
use shared_error::AppError;
use shared_types::{Page, PageRequest};
use uuid::Uuid;

use access_core::domains::identity::model::{Building, Session, User};
use access_core::domains::identity::repository::{BuildingRepository, SessionRepository, UserRepository};

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
