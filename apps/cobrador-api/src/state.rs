//! Shared handler state.

use std::sync::Arc;

use async_trait::async_trait;
use cobrador_core::CobradorResult;
use cobrador_db::{DocumentStore, PaymentLedger};
use cobrador_reconcile::{
    AccountingSource, DocumentPayment, PassSummary, PaymentGateway, PixCodeSource,
    ReconciliationEngine,
};
use secrecy::SecretString;
use tokio::sync::Mutex;

/// What the handlers need from the engine.
#[async_trait]
pub trait PassRunner: Send + Sync {
    async fn run_pass(&self) -> CobradorResult<PassSummary>;

    async fn pay_document(&self, document_id: &str) -> CobradorResult<DocumentPayment>;
}

#[async_trait]
impl<A, P, G, S> PassRunner for ReconciliationEngine<A, P, G, S>
where
    A: AccountingSource,
    P: PixCodeSource,
    G: PaymentGateway,
    S: DocumentStore + PaymentLedger,
{
    async fn run_pass(&self) -> CobradorResult<PassSummary> {
        ReconciliationEngine::run_pass(self).await
    }

    async fn pay_document(&self, document_id: &str) -> CobradorResult<DocumentPayment> {
        ReconciliationEngine::pay_document(self, document_id).await
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<dyn PassRunner>,
    pub cron_secret: SecretString,
    /// Held while a pass or payment runs; at most one at a time.
    pub work_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(runner: Arc<dyn PassRunner>, cron_secret: SecretString) -> Self {
        Self {
            runner,
            cron_secret,
            work_lock: Arc::new(Mutex::new(())),
        }
    }
}
