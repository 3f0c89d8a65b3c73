//! In-process store with the same insert-if-absent semantics as [`PgStore`].
//!
//! Backs tests and local dry runs. State is lost when the process exits.
//!
//! [`PgStore`]: crate::PgStore

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::models::{NewDocument, NewPaymentEvent, PersistedDocument, PaymentEvent};
use crate::store::{DocumentStore, PaymentLedger};

/// Store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, PersistedDocument>>,
    payments: RwLock<HashMap<String, PaymentEvent>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }

    /// All recorded payment events, in no particular order.
    pub async fn payments(&self) -> Vec<PaymentEvent> {
        self.payments.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn document_ids(&self) -> StoreResult<HashSet<String>> {
        Ok(self.documents.read().await.keys().cloned().collect())
    }

    async fn insert_document(&self, document: &NewDocument) -> StoreResult<bool> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(&document.id) {
            return Ok(false);
        }
        documents.insert(
            document.id.clone(),
            document.clone().into_persisted(Utc::now()),
        );
        Ok(true)
    }

    async fn find_document(&self, id: &str) -> StoreResult<Option<PersistedDocument>> {
        Ok(self.documents.read().await.get(id).cloned())
    }

    async fn mark_paid(&self, id: &str) -> StoreResult<bool> {
        let mut documents = self.documents.write().await;
        let document = documents
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("document {id}")))?;
        if document.paid {
            return Ok(false);
        }
        document.paid = true;
        Ok(true)
    }
}

#[async_trait]
impl PaymentLedger for MemoryStore {
    async fn has_payment(&self, id: &str) -> StoreResult<bool> {
        Ok(self.payments.read().await.contains_key(id))
    }

    async fn record_payment(&self, event: &NewPaymentEvent) -> StoreResult<bool> {
        let mut payments = self.payments.write().await;
        if payments.contains_key(&event.id) {
            return Ok(false);
        }
        payments.insert(
            event.id.clone(),
            PaymentEvent {
                id: event.id.clone(),
                description: event.description.clone(),
                tracking_id: event.tracking_id.clone(),
                created_at: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn find_payment(&self, id: &str) -> StoreResult<Option<PaymentEvent>> {
        Ok(self.payments.read().await.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(id: &str) -> NewDocument {
        NewDocument {
            id: id.into(),
            name: format!("{id}.pdf"),
            title: None,
            description: None,
            tags: vec!["guia".into()],
            payment_code: None,
            value: None,
            expiration_date: None,
            created_at: Utc::now(),
        }
    }

    fn event(id: &str, tracking: &str) -> NewPaymentEvent {
        NewPaymentEvent {
            id: id.into(),
            description: Some("Charge".into()),
            tracking_id: Some(tracking.into()),
        }
    }

    #[tokio::test]
    async fn test_document_inserted_once() {
        let store = MemoryStore::new();
        assert!(store.insert_document(&document("D1")).await.unwrap());

        let mut changed = document("D1");
        changed.name = "renamed.pdf".into();
        assert!(!store.insert_document(&changed).await.unwrap());

        let stored = store.find_document("D1").await.unwrap().unwrap();
        assert_eq!(stored.name, "D1.pdf");
        assert_eq!(store.document_ids().await.unwrap(), HashSet::from(["D1".to_string()]));
    }

    #[tokio::test]
    async fn test_mark_paid_is_one_way() {
        let store = MemoryStore::new();
        store.insert_document(&document("D1")).await.unwrap();

        assert!(store.mark_paid("D1").await.unwrap());
        assert!(!store.mark_paid("D1").await.unwrap());
        assert!(store.find_document("D1").await.unwrap().unwrap().paid);

        // Re-inserting never resets the flag.
        store.insert_document(&document("D1")).await.unwrap();
        assert!(store.find_document("D1").await.unwrap().unwrap().paid);
    }

    #[tokio::test]
    async fn test_mark_paid_unknown_document() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.mark_paid("nope").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_payment_recorded_once() {
        let store = MemoryStore::new();
        assert!(!store.has_payment("C1").await.unwrap());
        assert!(store.record_payment(&event("C1", "R1")).await.unwrap());
        assert!(!store.record_payment(&event("C1", "R2")).await.unwrap());

        assert!(store.has_payment("C1").await.unwrap());
        let stored = store.find_payment("C1").await.unwrap().unwrap();
        assert_eq!(stored.tracking_id.as_deref(), Some("R1"));
        assert_eq!(store.payments().await.len(), 1);
    }
}
