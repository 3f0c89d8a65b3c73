//! Reconciliation pipeline for cobrador.
//!
//! Ties the accounting, extraction and banking clients to the persisted
//! state. [`ReconciliationEngine::run_pass`] is the unit of work invoked by
//! the scheduler.

pub mod adapters;
pub mod engine;
pub mod ports;
pub mod summary;

pub use engine::{DocumentPayment, ReconciliationEngine};
pub use ports::{AccountingSource, PaymentGateway, PixCodeSource};
pub use summary::PassSummary;
