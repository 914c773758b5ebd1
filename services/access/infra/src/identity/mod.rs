pub mod repository;
pub mod service;

pub use repository::{PgBuildingRepository, PgSessionRepository, PgUserRepository};
pub use service::IdentityServiceImpl;
