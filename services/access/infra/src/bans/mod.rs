pub mod repository;
pub mod service;

pub use repository::PgBanRepository;
pub use service::BanEngineImpl;
