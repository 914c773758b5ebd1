//! Shared application state handed to every handler and the realtime hub.

use std::sync::Arc;
use std::time::Instant;

use access_core::domains::bans::service::BanEngineService;
use access_core::domains::identity::service::IdentityService;
use access_core::domains::notifications::service::NotificationService;
use access_core::domains::visits::service::VisitEngineService;
use access_infra::bans::{BanEngineImpl, PgBanRepository};
use access_infra::events::EventBus;
use access_infra::identity::{IdentityServiceImpl, PgBuildingRepository, PgSessionRepository, PgUserRepository};
use access_infra::notifications::{NotificationServiceImpl, PgNotificationRepository};
use access_infra::visits::{PgVisitRepository, VisitEngineImpl};

pub type ConcreteIdentityService = IdentityServiceImpl<PgUserRepository, PgBuildingRepository, PgSessionRepository>;
pub type ConcreteBanEngine = BanEngineImpl<PgBanRepository, EventBus>;
pub type ConcreteVisitEngine = VisitEngineImpl<PgVisitRepository, ConcreteBanEngine, EventBus>;
pub type ConcreteNotificationService = NotificationServiceImpl<PgNotificationRepository>;

/// Dependencies shared across HTTP handlers and the `/ws/realtime` hub.
///
/// Services are stored as trait objects rather than the concrete generic
/// types above so that integration tests can substitute in-memory fakes
/// without threading generics through every handler signature.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityService>,
    pub ban_engine: Arc<dyn BanEngineService>,
    pub visit_engine: Arc<dyn VisitEngineService>,
    pub notifications: Arc<dyn NotificationService>,
    pub events: Arc<EventBus>,
    pub jwt_secret: String,
    pub started_at: Instant,
}
