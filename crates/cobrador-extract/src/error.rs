//! Error types for scraping and document extraction.

use cobrador_core::CobradorError;
use thiserror::Error;

/// Result type alias using `ExtractError`.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Errors raised while fetching invoice pages or extracting boleto data.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// No API key configured for the document-understanding service.
    #[error("Document service API key is not configured")]
    MissingApiKey,

    /// HTTP client could not be built.
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the document-understanding service.
    #[error("Document service error: {status} - {body}")]
    Service { status: u16, body: String },

    /// The answer's first content block is not text.
    #[error("Response content is not text")]
    NonTextResponse,

    /// The answer could not be parsed as JSON.
    #[error("Answer is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The answer parsed but does not have the boleto shape.
    #[error("Answer has unexpected shape: {0}")]
    InvalidShape(String),
}

impl From<ExtractError> for CobradorError {
    fn from(err: ExtractError) -> Self {
        CobradorError::Extraction(err.to_string())
    }
}
