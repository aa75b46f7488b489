//! HTTP API module for health, metrics, and session endpoints.

pub mod handlers;
pub mod routes;

pub use handlers::{AppState, ErrorResponse};
pub use routes::create_router;
