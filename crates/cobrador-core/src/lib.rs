//! Core types for cobrador.
//!
//! Holds the domain model (charges, tax documents, boletos, PIX codes), the
//! process-wide configuration loaded once at startup, and the error taxonomy
//! every other crate converts into.

pub mod config;
pub mod error;
pub mod models;

pub use config::{
    AccountingConfig, BankingConfig, CertificateSource, CobradorConfig, ConfigError,
    ExtractorConfig,
};
pub use error::{CobradorError, CobradorResult};
pub use models::{
    normalize_payment_code, Boleto, Charge, ChargeStatus, ChargeWithPix, PixCode, TaxDocument,
    BR_CODE_PREFIX, PAYMENT_CODE_DIGITS, TAX_DOCUMENT_TAGS,
};
