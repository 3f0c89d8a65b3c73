//! Error taxonomy for a reconciliation pass.
//!
//! Every crate keeps its own detailed error enum and converts into
//! [`CobradorError`] at the crate boundary. The variant decides how far a
//! failure propagates: authentication and configuration failures end the
//! pass, the rest are scoped to one listing or one item.

use thiserror::Error;

/// Result type alias using `CobradorError`.
pub type CobradorResult<T> = Result<T, CobradorError>;

/// Errors surfaced by the reconciliation pipeline.
#[derive(Debug, Error)]
pub enum CobradorError {
    /// Credential or session failure. Fatal to the whole pass.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Upstream payload missing or malformed, or transport failure while listing.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The document-understanding service returned an unusable answer.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Payment rejected by the bank or lost in transport.
    #[error("Payment error: {0}")]
    Payment(String),

    /// Persisted state could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CobradorError {
    /// Short machine-readable name of the error class.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth_error",
            Self::Fetch(_) => "fetch_error",
            Self::Extraction(_) => "extraction_error",
            Self::Payment(_) => "payment_error",
            Self::Storage(_) => "storage_error",
            Self::Config(_) => "config_error",
        }
    }

    /// Whether this error must abort the remaining work of a pass.
    #[must_use]
    pub fn is_pass_fatal(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::Config(_))
    }
}
