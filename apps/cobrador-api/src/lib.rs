//! HTTP surface of cobrador.
//!
//! A scheduler calls `POST /v1/reconcile` with the shared cron secret; each
//! call runs one reconciliation pass and answers with its summary.

pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, PassRunner};
