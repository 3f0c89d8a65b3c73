//! Port implementations for the concrete clients.

use async_trait::async_trait;
use cobrador_accounting::{AccountingClient, AccountingSession};
use cobrador_banking::{BankingClient, BankingSession, PixPayment};
use cobrador_core::{Boleto, Charge, CobradorResult, PixCode, TaxDocument};
use cobrador_extract::InvoiceScraper;

use crate::ports::{AccountingSource, PaymentGateway, PixCodeSource};

#[async_trait]
impl AccountingSource for AccountingClient {
    type Session = AccountingSession;

    async fn authenticate(&self) -> CobradorResult<AccountingSession> {
        Ok(AccountingClient::authenticate(self).await?)
    }

    async fn list_pending_charges(&self, session: &AccountingSession) -> CobradorResult<Vec<Charge>> {
        Ok(AccountingClient::list_pending_charges(self, session).await?)
    }

    async fn list_tax_documents(
        &self,
        session: &AccountingSession,
    ) -> CobradorResult<Vec<TaxDocument>> {
        Ok(AccountingClient::list_tax_documents(self, session).await?)
    }

    async fn resolve_document_payment_code(
        &self,
        session: &AccountingSession,
        document_id: &str,
    ) -> CobradorResult<Boleto> {
        Ok(AccountingClient::resolve_document_payment_code(self, session, document_id).await?)
    }
}

#[async_trait]
impl PixCodeSource for InvoiceScraper {
    async fn extract_pix_code(&self, page_url: &str) -> Option<PixCode> {
        InvoiceScraper::extract_pix_code(self, page_url).await
    }
}

#[async_trait]
impl PaymentGateway for BankingClient {
    type Session = BankingSession;

    async fn authenticate(&self) -> CobradorResult<BankingSession> {
        Ok(BankingClient::authenticate(self).await?)
    }

    async fn pay_pix(&self, payment: &PixPayment, session: &BankingSession) -> CobradorResult<String> {
        Ok(BankingClient::pay_pix(self, payment, session).await?)
    }

    async fn pay_boleto(&self, boleto: &Boleto, session: &BankingSession) -> CobradorResult<()> {
        Ok(BankingClient::pay_boleto(self, boleto, session).await?)
    }
}
