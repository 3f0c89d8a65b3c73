//! Error types for the banking client.

use cobrador_core::CobradorError;
use thiserror::Error;

/// Result type alias using `BankingError`.
pub type BankingResult<T> = Result<T, BankingError>;

/// Errors raised while authenticating to or paying through the bank.
#[derive(Debug, Error)]
pub enum BankingError {
    /// Missing client credentials, rejected token exchange, or a token the
    /// payment endpoints no longer accept.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Client certificate or key missing, unreadable or malformed.
    #[error("Certificate error: {0}")]
    Certificate(String),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The bank refused the payment.
    #[error("Bank rejected request with {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The payment cannot be built from the given data.
    #[error("Invalid payment: {0}")]
    InvalidPayment(String),

    /// Response body could not be parsed.
    #[error("Invalid response: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<BankingError> for CobradorError {
    fn from(err: BankingError) -> Self {
        match err {
            BankingError::Auth(_) | BankingError::Certificate(_) => {
                CobradorError::Auth(err.to_string())
            }
            other => CobradorError::Payment(other.to_string()),
        }
    }
}
