//! Batched RPC response decoding.
//!
//! Every procedure answers with a JSON array of envelopes shaped
//! `{"result": {"data": {"json": <payload>}}}`. A failed call carries an
//! `error` member instead of `result`.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AccountingError, AccountingResult};

#[derive(Debug, Deserialize)]
struct Envelope {
    result: Option<EnvelopeResult>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeResult {
    data: EnvelopeData,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    json: Value,
}

/// Unwraps the payload at `index` of a batched response body.
///
/// The envelope is validated before the payload is decoded into `T`.
///
/// # Errors
///
/// Returns [`AccountingError::Envelope`] if the body is not an array of
/// envelopes, has no element at `index`, or the element reports an error,
/// and [`AccountingError::InvalidPayload`] if the payload does not decode.
pub fn decode_batch<T: DeserializeOwned>(body: &str, index: usize) -> AccountingResult<T> {
    let items: Vec<Value> = serde_json::from_str(body)
        .map_err(|e| AccountingError::Envelope(format!("body is not a JSON array: {e}")))?;
    let item = items
        .into_iter()
        .nth(index)
        .ok_or_else(|| AccountingError::Envelope(format!("no envelope at index {index}")))?;

    let envelope: Envelope = serde_json::from_value(item)
        .map_err(|e| AccountingError::Envelope(format!("envelope {index}: {e}")))?;

    if let Some(error) = envelope.error {
        return Err(AccountingError::Envelope(format!(
            "envelope {index} reports an error: {error}"
        )));
    }

    let payload = envelope
        .result
        .ok_or_else(|| AccountingError::Envelope(format!("envelope {index} has no result")))?
        .data
        .json;

    serde_json::from_value(payload).map_err(|e| AccountingError::InvalidPayload(e.to_string()))
}
