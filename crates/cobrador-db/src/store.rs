//! Store abstractions used by the reconciliation engine.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::models::{NewDocument, NewPaymentEvent, PersistedDocument, PaymentEvent};

/// Known tax documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Ids of every stored document.
    async fn document_ids(&self) -> StoreResult<HashSet<String>>;

    /// Inserts the document unless its id is already stored.
    ///
    /// Returns `false` when a row with the same id existed.
    async fn insert_document(&self, document: &NewDocument) -> StoreResult<bool>;

    /// Get a stored document.
    async fn find_document(&self, id: &str) -> StoreResult<Option<PersistedDocument>>;

    /// Flags a document as paid.
    ///
    /// Returns `false` if it was already paid, and
    /// [`StoreError::NotFound`](crate::StoreError::NotFound) if it is not stored.
    async fn mark_paid(&self, id: &str) -> StoreResult<bool>;
}

/// Append-only record of submitted payments.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Whether a payment was already recorded under `id`.
    async fn has_payment(&self, id: &str) -> StoreResult<bool>;

    /// Appends an event unless one exists for its id.
    ///
    /// Returns `false` when an event with the same id existed.
    async fn record_payment(&self, event: &NewPaymentEvent) -> StoreResult<bool>;

    /// Get the event recorded under `id`.
    async fn find_payment(&self, id: &str) -> StoreResult<Option<PaymentEvent>>;
}
