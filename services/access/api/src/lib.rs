// Library exports for integration tests
pub mod envelope;
pub mod extractors;
pub mod routes;
pub mod state;
pub mod ws;

pub use routes::build_router;
pub use state::AppState;
