//! Row types and their queries.

pub mod document;
pub mod payment_event;

pub use document::{NewDocument, PersistedDocument};
pub use payment_event::{NewPaymentEvent, PaymentEvent};
