//! Error types for the accounting client.

use cobrador_core::CobradorError;
use cobrador_extract::ExtractError;
use thiserror::Error;

/// Result type alias using `AccountingError`.
pub type AccountingResult<T> = Result<T, AccountingError>;

/// Errors raised while talking to the accounting service.
#[derive(Debug, Error)]
pub enum AccountingError {
    /// Missing credentials, rejected login or missing session cookie.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// HTTP client could not be built.
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from an RPC procedure.
    #[error("{procedure} returned {status}: {body}")]
    Upstream {
        procedure: String,
        status: u16,
        body: String,
    },

    /// The batched response envelope does not have the expected shape.
    #[error("Malformed response envelope: {0}")]
    Envelope(String),

    /// The envelope payload does not match the expected schema.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Boleto extraction failed for a document.
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

impl From<AccountingError> for CobradorError {
    fn from(err: AccountingError) -> Self {
        match err {
            AccountingError::Auth(msg) => CobradorError::Auth(msg),
            AccountingError::Config(msg) => CobradorError::Config(msg),
            AccountingError::Extract(e) => e.into(),
            other => CobradorError::Fetch(other.to_string()),
        }
    }
}
