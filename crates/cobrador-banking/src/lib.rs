//! Banking service client for cobrador.
//!
//! Authenticates with a client certificate over mutual TLS, obtains a
//! client-credentials token, and submits PIX transfers and boleto payments.

pub mod auth;
pub mod client;
pub mod error;
pub mod identity;
pub mod payment;

pub use auth::BankingSession;
pub use client::BankingClient;
pub use error::{BankingError, BankingResult};
pub use payment::{
    AccountType, BoletoPayment, FinancialInstitution, PixDestination, PixPayment,
    PixPaymentResponse,
};
