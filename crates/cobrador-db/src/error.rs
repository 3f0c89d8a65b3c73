//! Error types for persisted state.

use cobrador_core::CobradorError;
use thiserror::Error;

/// Result type alias using `StoreError`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to establish or acquire a database connection.
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[source] sqlx::Error),

    /// A database migration failed to apply.
    #[error("Migration failed: {0}")]
    MigrationFailed(#[from] sqlx::migrate::MigrateError),

    /// A database query failed to execute.
    #[error("Query failed: {0}")]
    QueryFailed(#[from] sqlx::Error),

    /// No document with the given id is stored.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<StoreError> for CobradorError {
    fn from(err: StoreError) -> Self {
        CobradorError::Storage(err.to_string())
    }
}
