//! The reconciliation pass.
//!
//! One pass authenticates to both services, lists pending charges and tax
//! documents concurrently, records documents it has not seen before, and
//! pays every charge that has a PIX code and no recorded payment. Items are
//! processed one at a time; a failing item is logged and counted, and the
//! loop moves on.

use std::sync::Arc;

use cobrador_banking::PixPayment;
use cobrador_core::{Boleto, Charge, ChargeWithPix, CobradorError, CobradorResult, TaxDocument};
use cobrador_db::{DocumentStore, NewDocument, NewPaymentEvent, PaymentLedger};
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};
use uuid::Uuid;

use crate::ports::{AccountingSource, PaymentGateway, PixCodeSource};
use crate::summary::PassSummary;

/// What happened to one charge.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChargeOutcome {
    /// Paid now; carries the bank's tracking id.
    Paid(String),
    /// A payment was already recorded.
    AlreadyPaid,
}

/// Result of [`ReconciliationEngine::pay_document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentPayment {
    Paid,
    AlreadyPaid,
    /// No document with that id has been recorded.
    NotFound,
}

/// Runs reconciliation passes against the configured services and store.
pub struct ReconciliationEngine<A, P, G, S> {
    accounting: A,
    scraper: P,
    gateway: G,
    store: Arc<S>,
}

impl<A, P, G, S> ReconciliationEngine<A, P, G, S>
where
    A: AccountingSource,
    P: PixCodeSource,
    G: PaymentGateway,
    S: DocumentStore + PaymentLedger,
{
    pub fn new(accounting: A, scraper: P, gateway: G, store: Arc<S>) -> Self {
        Self {
            accounting,
            scraper,
            gateway,
            store,
        }
    }

    /// Get the backing store.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Runs one full pass.
    ///
    /// # Errors
    ///
    /// Returns an authentication error if either service refuses the
    /// credentials, before any item is touched. If one listing fails the
    /// other is still processed, and the listing error is returned at the
    /// end. Per-item failures never fail the pass.
    pub async fn run_pass(&self) -> CobradorResult<PassSummary> {
        let pass_id = Uuid::new_v4();
        self.execute_pass(pass_id)
            .instrument(info_span!("reconcile_pass", %pass_id))
            .await
    }

    async fn execute_pass(&self, pass_id: Uuid) -> CobradorResult<PassSummary> {
        info!("Starting reconciliation pass");

        let bank = self.gateway.authenticate().await?;
        let session = self.accounting.authenticate().await?;

        let (charges, documents) = tokio::join!(
            self.accounting.list_pending_charges(&session),
            self.accounting.list_tax_documents(&session),
        );

        let mut summary = PassSummary::new(pass_id);
        let mut listing_error: Option<CobradorError> = None;

        let documents_result = match documents {
            Ok(documents) => {
                self.process_documents(&session, documents, &mut summary)
                    .await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = documents_result {
            if e.is_pass_fatal() {
                return Err(e);
            }
            error!(error = %e, kind = e.kind(), "Tax document reconciliation failed");
            listing_error.get_or_insert(e);
        }

        let charges_result = match charges {
            Ok(charges) => self.process_charges(&bank, charges, &mut summary).await,
            Err(e) => Err(e),
        };
        if let Err(e) = charges_result {
            if e.is_pass_fatal() {
                return Err(e);
            }
            error!(error = %e, kind = e.kind(), "Charge reconciliation failed");
            listing_error.get_or_insert(e);
        }

        info!(
            charges_seen = summary.charges_seen,
            charges_with_pix = summary.charges_with_pix,
            charges_paid = summary.charges_paid,
            charges_already_paid = summary.charges_already_paid,
            charges_failed = summary.charges_failed,
            documents_seen = summary.documents_seen,
            documents_new = summary.documents_new,
            documents_failed = summary.documents_failed,
            "Reconciliation pass finished"
        );

        match listing_error {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }

    // ── Documents ─────────────────────────────────────────────────────

    async fn process_documents(
        &self,
        session: &A::Session,
        documents: Vec<TaxDocument>,
        summary: &mut PassSummary,
    ) -> CobradorResult<()> {
        summary.documents_seen = documents.len();
        let known = self.store.document_ids().await?;

        let new_documents: Vec<TaxDocument> = documents
            .into_iter()
            .filter(|doc| !known.contains(&doc.id))
            .collect();
        debug!(new = new_documents.len(), "Diffed documents against store");

        for document in new_documents {
            let document_id = document.id.clone();
            match self.record_document(session, document).await {
                Ok(true) => summary.documents_new += 1,
                Ok(false) => debug!(document_id = %document_id, "Document stored concurrently"),
                Err(e) if e.is_pass_fatal() => return Err(e),
                Err(e) => {
                    warn!(
                        document_id = %document_id,
                        error = %e,
                        kind = e.kind(),
                        "Skipping document, will retry next pass"
                    );
                    summary.documents_failed += 1;
                }
            }
        }
        Ok(())
    }

    async fn record_document(
        &self,
        session: &A::Session,
        document: TaxDocument,
    ) -> CobradorResult<bool> {
        let boleto = self
            .accounting
            .resolve_document_payment_code(session, &document.id)
            .await?;
        let document = document.with_boleto(&boleto);
        let inserted = self
            .store
            .insert_document(&NewDocument::from(&document))
            .await?;
        if inserted {
            info!(
                document_id = %document.id,
                has_payment_code = document.payment_code.is_some(),
                "Recorded new tax document"
            );
        }
        Ok(inserted)
    }

    // ── Charges ───────────────────────────────────────────────────────

    async fn process_charges(
        &self,
        bank: &G::Session,
        charges: Vec<Charge>,
        summary: &mut PassSummary,
    ) -> CobradorResult<()> {
        summary.charges_seen = charges.len();

        for charge in charges {
            let Some(pix_code) = self.scraper.extract_pix_code(&charge.invoice_url).await else {
                warn!(
                    charge_id = %charge.id,
                    invoice_url = %charge.invoice_url,
                    "No PIX code on invoice page, skipping charge"
                );
                continue;
            };
            summary.charges_with_pix += 1;

            let charge_id = charge.id.clone();
            match self
                .pay_charge(bank, ChargeWithPix::new(charge, Some(pix_code)))
                .await
            {
                Ok(ChargeOutcome::Paid(tracking_id)) => {
                    info!(charge_id = %charge_id, tracking_id = %tracking_id, "Charge paid");
                    summary.charges_paid += 1;
                }
                Ok(ChargeOutcome::AlreadyPaid) => {
                    debug!(charge_id = %charge_id, "Charge already paid, skipping");
                    summary.charges_already_paid += 1;
                }
                Err(e) if e.is_pass_fatal() => return Err(e),
                Err(e) => {
                    error!(charge_id = %charge_id, error = %e, kind = e.kind(), "Charge payment failed");
                    summary.charges_failed += 1;
                }
            }
        }
        Ok(())
    }

    async fn pay_charge(
        &self,
        bank: &G::Session,
        charge: ChargeWithPix,
    ) -> CobradorResult<ChargeOutcome> {
        let ChargeWithPix { charge, pix_code } = charge;
        let Some(pix_code) = pix_code else {
            return Err(CobradorError::Payment(format!(
                "charge {} has no PIX code",
                charge.id
            )));
        };

        if self.store.has_payment(&charge.id).await? {
            return Ok(ChargeOutcome::AlreadyPaid);
        }

        let description = charge
            .description
            .clone()
            .unwrap_or_else(|| format!("Charge {}", charge.id));
        let payment = PixPayment::copy_and_paste(&pix_code, charge.value, description.clone());
        let tracking_id = self.gateway.pay_pix(&payment, bank).await?;

        let event = NewPaymentEvent {
            id: charge.id.clone(),
            description: Some(description),
            tracking_id: Some(tracking_id.clone()),
        };
        if let Err(e) = self.store.record_payment(&event).await {
            error!(
                charge_id = %charge.id,
                tracking_id = %tracking_id,
                error = %e,
                "Payment submitted but not recorded"
            );
            return Err(e.into());
        }

        Ok(ChargeOutcome::Paid(tracking_id))
    }

    // ── Boleto payment ────────────────────────────────────────────────

    /// Pays a stored tax document's boleto and flags it as paid.
    ///
    /// # Errors
    ///
    /// Returns a payment error, before contacting the bank, if the boleto is
    /// empty or malformed; otherwise bank and store errors are passed through.
    #[instrument(skip(self))]
    pub async fn pay_document(&self, document_id: &str) -> CobradorResult<DocumentPayment> {
        let Some(document) = self.store.find_document(document_id).await? else {
            warn!("Document is not known");
            return Ok(DocumentPayment::NotFound);
        };
        if document.paid {
            return Ok(DocumentPayment::AlreadyPaid);
        }

        let boleto = Boleto {
            payment_code: document.payment_code.unwrap_or_default(),
            value: document.value.unwrap_or_default(),
            expiration_date: document.expiration_date.unwrap_or_default(),
        };
        boleto.ensure_payable()?;

        let bank = self.gateway.authenticate().await?;
        self.gateway.pay_boleto(&boleto, &bank).await?;

        if !self.store.mark_paid(document_id).await? {
            warn!("Document was flagged as paid concurrently");
        }
        info!(value = %boleto.value, "Tax document paid");
        Ok(DocumentPayment::Paid)
    }
}
