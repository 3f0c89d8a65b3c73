//! Seams between the engine and the outside world.
//!
//! The engine only talks to these traits; [`crate::adapters`] implements
//! them for the real HTTP clients, and tests substitute in-process fakes.

use async_trait::async_trait;
use cobrador_banking::PixPayment;
use cobrador_core::{Boleto, Charge, CobradorResult, PixCode, TaxDocument};

/// Read side of the accounting service.
#[async_trait]
pub trait AccountingSource: Send + Sync {
    /// Session handle valid for one pass.
    type Session: Send + Sync;

    async fn authenticate(&self) -> CobradorResult<Self::Session>;

    /// Charges in a payable status, invoice links in preview form.
    async fn list_pending_charges(&self, session: &Self::Session) -> CobradorResult<Vec<Charge>>;

    /// Documents carrying a tax tag.
    async fn list_tax_documents(&self, session: &Self::Session)
        -> CobradorResult<Vec<TaxDocument>>;

    async fn resolve_document_payment_code(
        &self,
        session: &Self::Session,
        document_id: &str,
    ) -> CobradorResult<Boleto>;
}

/// Finds the PIX code printed on an invoice page.
#[async_trait]
pub trait PixCodeSource: Send + Sync {
    /// Never fails: an unreachable page yields `None`.
    async fn extract_pix_code(&self, page_url: &str) -> Option<PixCode>;
}

/// Write side of the banking service.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Session handle valid for one pass.
    type Session: Send + Sync;

    async fn authenticate(&self) -> CobradorResult<Self::Session>;

    /// Submits a PIX transfer and returns the bank's tracking id.
    async fn pay_pix(&self, payment: &PixPayment, session: &Self::Session)
        -> CobradorResult<String>;

    async fn pay_boleto(&self, boleto: &Boleto, session: &Self::Session) -> CobradorResult<()>;
}
