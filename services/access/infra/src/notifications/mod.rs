pub mod repository;
pub mod service;

pub use repository::PgNotificationRepository;
pub use service::NotificationServiceImpl;
