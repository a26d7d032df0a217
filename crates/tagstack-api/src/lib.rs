//! tagstack-api - HTTP surface for tagstack

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::{ApiConfig, LogConfig, StorageBackend};
pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;
