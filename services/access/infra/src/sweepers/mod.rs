pub mod expiry;
pub mod retention;

pub use expiry::run_expiry_sweeper;
pub use retention::run_retention_sweeper;
