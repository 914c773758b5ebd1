pub mod repository;
pub mod service;

pub use repository::PgVisitRepository;
pub use service::VisitEngineImpl;
