//! Boleto extraction through a document-understanding model.
//!
//! The boleto PDF is passed by URL together with a fixed instruction; the
//! model answers with a JSON object that is parsed and validated into a
//! [`Boleto`]. Empty fields are a legitimate answer, anything else that does
//! not match the expected shape is rejected.

use std::time::Duration;

use cobrador_core::{Boleto, ExtractorConfig};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{ExtractError, ExtractResult};

/// API version header expected by the messages endpoint.
const API_VERSION: &str = "2023-06-01";

/// Instruction sent alongside every boleto document.
pub const EXTRACTION_PROMPT: &str = "\
You are reading a Brazilian boleto (bank slip) or tax payment guide (guia). \
Extract exactly three fields and answer with a single JSON object and nothing else:\n\
{\"payment_code\": string, \"value\": string, \"expiration_date\": string}\n\
Rules:\n\
- payment_code: the digitable line (linha digitável), digits only, with every space, dot \
and hyphen removed. It must have exactly 48 digits.\n\
- value: the amount to pay (valor do documento / valor cobrado) as a decimal string with \
a dot and exactly two fraction digits, for example \"1075.61\".\n\
- expiration_date: the due date (vencimento) in ISO-8601 format YYYY-MM-DD.\n\
If a field cannot be found, use an empty string for it. Do not add comments, \
explanations or Markdown.";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<RequestMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: Vec<RequestBlock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RequestBlock<'a> {
    Document { source: DocumentSource<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum DocumentSource<'a> {
    Url { url: &'a str },
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

/// Client for the document-understanding service.
#[derive(Debug, Clone)]
pub struct DocumentCodeExtractor {
    config: ExtractorConfig,
    http_client: Client,
}

impl DocumentCodeExtractor {
    /// Creates an extractor whose requests are bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ExtractorConfig, timeout: Duration) -> ExtractResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    /// Create an extractor with a pre-built `reqwest::Client` (for testing).
    #[must_use]
    pub fn with_http_client(config: ExtractorConfig, http_client: Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// Extracts boleto payment data from the document at `document_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is unreachable or rejects the request,
    /// if the answer is not text, not JSON, or not a valid boleto.
    #[instrument(skip(self, document_url))]
    pub async fn extract(&self, document_url: &str) -> ExtractResult<Boleto> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or(ExtractError::MissingApiKey)?;

        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: vec![RequestMessage {
                role: "user",
                content: vec![
                    RequestBlock::Document {
                        source: DocumentSource::Url { url: document_url },
                    },
                    RequestBlock::Text {
                        text: EXTRACTION_PROMPT,
                    },
                ],
            }],
        };

        let response = self
            .http_client
            .post(format!("{}/v1/messages", self.config.api_url))
            .header("x-api-key", api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ExtractError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let response: MessagesResponse = serde_json::from_str(&body)
            .map_err(|e| ExtractError::InvalidShape(format!("Unexpected response envelope: {e}")))?;

        match response.content.into_iter().next() {
            Some(ResponseBlock::Text { text }) => {
                let boleto = parse_answer(&text)?;
                debug!(
                    has_code = !boleto.payment_code.is_empty(),
                    has_value = !boleto.value.is_empty(),
                    "Extracted boleto fields"
                );
                Ok(boleto)
            }
            _ => Err(ExtractError::NonTextResponse),
        }
    }
}

/// Parses and validates the model's textual answer.
///
/// # Errors
///
/// Returns [`ExtractError::InvalidJson`] if the answer is not JSON and
/// [`ExtractError::InvalidShape`] if it is not a valid boleto object.
pub fn parse_answer(answer: &str) -> ExtractResult<Boleto> {
    let value: serde_json::Value = serde_json::from_str(strip_code_fence(answer))?;
    let boleto: Boleto =
        serde_json::from_value(value).map_err(|e| ExtractError::InvalidShape(e.to_string()))?;
    boleto
        .validate()
        .map_err(|e| ExtractError::InvalidShape(e.to_string()))
}

/// Models occasionally wrap JSON in a Markdown fence despite the instruction.
fn strip_code_fence(answer: &str) -> &str {
    let trimmed = answer.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODE_48: &str = "858900000050681002022504150000000000000000000001";

    #[test]
    fn test_parse_valid_answer() {
        let answer = format!(
            r#"{{"payment_code": "{CODE_48}", "value": "1075.61", "expiration_date": "2025-04-30"}}"#
        );
        let boleto = parse_answer(&answer).unwrap();
        assert_eq!(boleto.payment_code, CODE_48);
        assert_eq!(boleto.value, "1075.61");
        assert_eq!(boleto.expiration_date, "2025-04-30");
    }

    #[test]
    fn test_parse_strips_separators() {
        let dashed = format!("{}-{} {}", &CODE_48[..5], &CODE_48[5..20], &CODE_48[20..]);
        let answer =
            format!(r#"{{"payment_code": "{dashed}", "value": "", "expiration_date": ""}}"#);
        assert_eq!(parse_answer(&answer).unwrap().payment_code, CODE_48);
    }

    #[test]
    fn test_parse_rejects_47_digits() {
        let answer = format!(
            r#"{{"payment_code": "{}", "value": "10.00", "expiration_date": "2025-04-30"}}"#,
            &CODE_48[..47]
        );
        assert!(matches!(
            parse_answer(&answer),
            Err(ExtractError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_parse_accepts_all_empty() {
        let boleto =
            parse_answer(r#"{"payment_code": "", "value": "", "expiration_date": ""}"#).unwrap();
        assert!(boleto.payment_code.is_empty());
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(matches!(
            parse_answer("I could not read the document."),
            Err(ExtractError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        assert!(matches!(
            parse_answer(r#"{"payment_code": "", "value": ""}"#),
            Err(ExtractError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_parse_rejects_numeric_value() {
        assert!(matches!(
            parse_answer(r#"{"payment_code": "", "value": 10.5, "expiration_date": ""}"#),
            Err(ExtractError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_parse_unwraps_code_fence() {
        let answer = "```json\n{\"payment_code\": \"\", \"value\": \"12.30\", \"expiration_date\": \"\"}\n```";
        assert_eq!(parse_answer(answer).unwrap().value, "12.30");
    }

    #[test]
    fn test_request_serialization() {
        let request = MessagesRequest {
            model: "model",
            max_tokens: 256,
            messages: vec![RequestMessage {
                role: "user",
                content: vec![
                    RequestBlock::Document {
                        source: DocumentSource::Url {
                            url: "https://files.example.com/guia.pdf",
                        },
                    },
                    RequestBlock::Text { text: "extract" },
                ],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["content"][0]["type"], "document");
        assert_eq!(json["messages"][0]["content"][0]["source"]["type"], "url");
        assert_eq!(json["messages"][0]["content"][1]["type"], "text");
    }
}
