//! Persisted reconciliation state for cobrador.
//!
//! Two tables back the pipeline's idempotence: `documents` (tax documents
//! already seen) and `payment_events` (charges already paid). Rows are
//! inserted at most once and never deleted here.

pub mod error;
pub mod memory;
pub mod models;
pub mod pg;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use models::{NewDocument, NewPaymentEvent, PaymentEvent, PersistedDocument};
pub use pg::PgStore;
pub use store::{DocumentStore, PaymentLedger};
