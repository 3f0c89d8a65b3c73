//! Domain model shared across the pipeline.
//!
//! Charges and tax documents are produced by the accounting service and are
//! re-fetched on every pass. Boletos and PIX codes are the machine-payable
//! forms the pipeline derives from them.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CobradorError, CobradorResult};

/// Every PIX copy-and-paste payload (BR-Code) starts with this header.
pub const BR_CODE_PREFIX: &str = "00020101";

/// Number of digits in a boleto digitable line once separators are removed.
pub const PAYMENT_CODE_DIGITS: usize = 48;

/// Tags that mark an accounting document as a payable tax document.
pub const TAX_DOCUMENT_TAGS: [&str; 2] = ["guia", "Boleto"];

/// Charge status as reported by the accounting service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargeStatus {
    Pending,
    Overdue,
    Received,
    /// Any status this system does not act upon (confirmed, refunded, ...).
    #[serde(other)]
    Other,
}

impl ChargeStatus {
    /// Whether a charge in this status is still waiting to be paid.
    #[must_use]
    pub fn is_payable(self) -> bool {
        matches!(self, Self::Pending | Self::Overdue)
    }
}

/// A pending financial charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Charge {
    pub id: String,
    pub status: ChargeStatus,
    #[serde(default)]
    pub description: Option<String>,
    pub value: Decimal,
    pub invoice_url: String,
}

/// A charge enriched with the PIX code scraped from its invoice page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeWithPix {
    #[serde(flatten)]
    pub charge: Charge,
    pub pix_code: Option<PixCode>,
}

impl ChargeWithPix {
    #[must_use]
    pub fn new(charge: Charge, pix_code: Option<PixCode>) -> Self {
        Self { charge, pix_code }
    }
}

/// A validated PIX copy-and-paste payload.
///
/// Construction only succeeds for strings carrying the BR-Code header, so a
/// `PixCode` value is always safe to hand to the bank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PixCode(String);

impl PixCode {
    /// Accepts `candidate` if, once trimmed, it starts with the BR-Code header.
    #[must_use]
    pub fn parse(candidate: &str) -> Option<Self> {
        let trimmed = candidate.trim();
        if trimmed.starts_with(BR_CODE_PREFIX) {
            Some(Self(trimmed.to_string()))
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PixCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document stored in the accounting service.
///
/// `payment_code`, `value` and `expiration_date` are never sent by upstream;
/// they are filled in from the boleto file the first time the document is
/// seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxDocument {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, rename = "payment_code", skip_serializing_if = "Option::is_none")]
    pub payment_code: Option<String>,
    #[serde(default, rename = "value", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, rename = "expiration_date", skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
}

impl TaxDocument {
    /// Whether the document carries one of the tax tags (case-sensitive).
    #[must_use]
    pub fn is_tax_relevant(&self) -> bool {
        TAX_DOCUMENT_TAGS.iter().any(|tag| self.tags.contains(*tag))
    }

    /// Attaches the fields extracted from the document's boleto file.
    #[must_use]
    pub fn with_boleto(mut self, boleto: &Boleto) -> Self {
        self.payment_code = non_empty(&boleto.payment_code);
        self.value = non_empty(&boleto.value);
        self.expiration_date = non_empty(&boleto.expiration_date);
        self
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Strips the separators (spaces, hyphens) a digitable line is printed with.
#[must_use]
pub fn normalize_payment_code(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Boleto payment data, as extracted from a document.
///
/// Any field may be empty when the extractor could not find it. An empty or
/// malformed boleto is a valid extraction result but is never payable, see
/// [`Boleto::ensure_payable`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boleto {
    pub payment_code: String,
    pub value: String,
    pub expiration_date: String,
}

impl Boleto {
    /// Normalizes the payment code and checks every non-empty field's shape.
    ///
    /// # Errors
    ///
    /// Returns [`CobradorError::Extraction`] if the payment code is not
    /// exactly 48 digits, the value lacks two fraction digits, or the
    /// expiration date is not an ISO-8601 date.
    pub fn validate(self) -> CobradorResult<Self> {
        let payment_code = normalize_payment_code(&self.payment_code);
        if !payment_code.is_empty() && !is_payment_code(&payment_code) {
            return Err(CobradorError::Extraction(format!(
                "payment_code must have exactly {PAYMENT_CODE_DIGITS} digits, got {}",
                payment_code.len()
            )));
        }

        let value = self.value.trim().to_string();
        if !value.is_empty() && !is_two_decimal(&value) {
            return Err(CobradorError::Extraction(format!(
                "value must be a decimal with two fraction digits, got {value:?}"
            )));
        }

        let expiration_date = self.expiration_date.trim().to_string();
        if !expiration_date.is_empty()
            && NaiveDate::parse_from_str(&expiration_date, "%Y-%m-%d").is_err()
        {
            return Err(CobradorError::Extraction(format!(
                "expiration_date must be an ISO-8601 date, got {expiration_date:?}"
            )));
        }

        Ok(Self {
            payment_code,
            value,
            expiration_date,
        })
    }

    /// Parsed amount, if the value is present and well-formed.
    #[must_use]
    pub fn amount(&self) -> Option<Decimal> {
        self.value.parse().ok()
    }

    /// Parsed due date, if present and well-formed.
    #[must_use]
    pub fn due_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.expiration_date, "%Y-%m-%d").ok()
    }

    /// Checks the boleto can be submitted to the bank.
    ///
    /// # Errors
    ///
    /// Returns [`CobradorError::Payment`] if the code, amount or due date is
    /// missing or malformed.
    pub fn ensure_payable(&self) -> CobradorResult<()> {
        let code = normalize_payment_code(&self.payment_code);
        if code.is_empty() {
            return Err(CobradorError::Payment(
                "boleto has no payment code".to_string(),
            ));
        }
        if !is_payment_code(&code) {
            return Err(CobradorError::Payment(format!(
                "boleto payment code has {} digits, expected {PAYMENT_CODE_DIGITS}",
                code.len()
            )));
        }
        match self.amount() {
            Some(amount) if amount > Decimal::ZERO => {}
            _ => {
                return Err(CobradorError::Payment(format!(
                    "boleto amount {:?} is not a positive decimal",
                    self.value
                )))
            }
        }
        if self.due_date().is_none() {
            return Err(CobradorError::Payment(format!(
                "boleto due date {:?} is not an ISO-8601 date",
                self.expiration_date
            )));
        }
        Ok(())
    }
}

fn is_payment_code(code: &str) -> bool {
    code.len() == PAYMENT_CODE_DIGITS && code.chars().all(|c| c.is_ascii_digit())
}

fn is_two_decimal(value: &str) -> bool {
    match value.split_once('.') {
        Some((int, frac)) => {
            !int.is_empty()
                && int.chars().all(|c| c.is_ascii_digit())
                && frac.len() == 2
                && frac.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}
