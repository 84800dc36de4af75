//! HTTP API layer for the log processor.

pub mod response;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
