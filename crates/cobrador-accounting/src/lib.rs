//! Accounting service client for cobrador.
//!
//! Logs in through the identity provider, trades the identity token for a
//! session cookie, and reads charges and tax documents through the service's
//! batched RPC endpoints.

pub mod client;
pub mod envelope;
pub mod error;
pub mod session;

pub use client::{normalize_invoice_url, AccountingClient};
pub use envelope::decode_batch;
pub use error::{AccountingError, AccountingResult};
pub use session::{parse_session_cookie, AccountingSession};
