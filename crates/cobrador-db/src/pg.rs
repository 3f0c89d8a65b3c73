//! PostgreSQL-backed store.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::models::{NewDocument, NewPaymentEvent, PersistedDocument, PaymentEvent};
use crate::store::{DocumentStore, PaymentLedger};

/// Store over a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database at `database_url`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ConnectionFailed` if no connection can be made.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await
            .map_err(StoreError::ConnectionFailed)?;
        Ok(Self { pool })
    }

    /// Get the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run all pending database migrations.
    ///
    /// Migrations are embedded at compile time from the `migrations/` directory.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::MigrationFailed` if any migration fails to apply.
    pub async fn run_migrations(&self) -> StoreResult<()> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Migrations completed successfully");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn document_ids(&self) -> StoreResult<HashSet<String>> {
        let ids = PersistedDocument::list_ids(&self.pool).await?;
        Ok(ids.into_iter().collect())
    }

    async fn insert_document(&self, document: &NewDocument) -> StoreResult<bool> {
        let inserted = PersistedDocument::insert_if_absent(&self.pool, document).await?;
        debug!(document_id = %document.id, inserted, "Document insert");
        Ok(inserted)
    }

    async fn find_document(&self, id: &str) -> StoreResult<Option<PersistedDocument>> {
        Ok(PersistedDocument::find_by_id(&self.pool, id).await?)
    }

    async fn mark_paid(&self, id: &str) -> StoreResult<bool> {
        if PersistedDocument::mark_paid(&self.pool, id).await? {
            return Ok(true);
        }
        match PersistedDocument::find_by_id(&self.pool, id).await? {
            Some(_) => Ok(false),
            None => Err(StoreError::NotFound(format!("document {id}"))),
        }
    }
}

#[async_trait]
impl PaymentLedger for PgStore {
    async fn has_payment(&self, id: &str) -> StoreResult<bool> {
        Ok(PaymentEvent::exists(&self.pool, id).await?)
    }

    async fn record_payment(&self, event: &NewPaymentEvent) -> StoreResult<bool> {
        let inserted = PaymentEvent::insert_if_absent(&self.pool, event).await?;
        debug!(payment_id = %event.id, inserted, "Payment event insert");
        Ok(inserted)
    }

    async fn find_payment(&self, id: &str) -> StoreResult<Option<PaymentEvent>> {
        Ok(PaymentEvent::find_by_id(&self.pool, id).await?)
    }
}
