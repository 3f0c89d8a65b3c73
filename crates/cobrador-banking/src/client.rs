//! Banking service HTTP client.

use std::time::Duration;

use cobrador_core::{BankingConfig, Boleto};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::auth::{self, BankingSession};
use crate::error::{BankingError, BankingResult};
use crate::identity;
use crate::payment::{BoletoPayment, PixPayment, PixPaymentResponse};

const ACCOUNT_HEADER: &str = "x-conta-corrente";

/// Client for the banking service.
///
/// The mutual-TLS HTTP client is built at authentication time, once the
/// certificate material has been loaded.
#[derive(Debug, Clone)]
pub struct BankingClient {
    config: BankingConfig,
    timeout: Duration,
    /// Pre-built client that bypasses certificate loading.
    http_client: Option<Client>,
}

impl BankingClient {
    /// Create a new banking client.
    #[must_use]
    pub fn new(config: BankingConfig, timeout: Duration) -> Self {
        Self {
            config,
            timeout,
            http_client: None,
        }
    }

    /// Create a client with a pre-built `reqwest::Client` (for testing).
    #[must_use]
    pub fn with_http_client(config: BankingConfig, http_client: Client) -> Self {
        Self {
            config,
            timeout: Duration::from_secs(30),
            http_client: Some(http_client),
        }
    }

    /// Loads the client identity and exchanges client credentials for a token.
    ///
    /// # Errors
    ///
    /// Returns [`BankingError::Certificate`] or [`BankingError::Auth`] if the
    /// credentials or certificate material are missing, or the bank rejects
    /// the exchange.
    #[instrument(skip(self))]
    pub async fn authenticate(&self) -> BankingResult<BankingSession> {
        let http_client = match &self.http_client {
            Some(client) => client.clone(),
            None => self.build_mtls_client().await?,
        };
        let session = auth::request_token(http_client, &self.config).await?;
        info!("Bank session established");
        Ok(session)
    }

    /// Submits a PIX transfer and returns the bank's tracking id.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    #[instrument(skip(self, payment, session), fields(tipo = destination_kind(payment)))]
    pub async fn pay_pix(
        &self,
        payment: &PixPayment,
        session: &BankingSession,
    ) -> BankingResult<String> {
        let response = self.post(session, "/banking/v2/pix", payment).await?;
        let body = response.text().await?;
        let ack: PixPaymentResponse = serde_json::from_str(&body)?;

        info!(
            tracking_id = %ack.codigo_solicitacao,
            tipo_retorno = ack.tipo_retorno.as_deref().unwrap_or_default(),
            "PIX payment accepted"
        );
        Ok(ack.codigo_solicitacao)
    }

    /// Pays a boleto by its digitable line.
    ///
    /// # Errors
    ///
    /// Returns [`BankingError::InvalidPayment`] before any request if the
    /// boleto is not payable, otherwise an error on transport failure or a
    /// non-success status.
    #[instrument(skip(self, boleto, session))]
    pub async fn pay_boleto(&self, boleto: &Boleto, session: &BankingSession) -> BankingResult<()> {
        let payment = BoletoPayment::try_from(boleto)?;
        self.post(session, "/banking/v2/pagamento", &payment).await?;
        info!(due = %payment.data_vencimento, "Boleto payment accepted");
        Ok(())
    }

    async fn build_mtls_client(&self) -> BankingResult<Client> {
        let identity = identity::load_identity(&self.config).await?;
        Client::builder()
            .timeout(self.timeout)
            .use_rustls_tls()
            .identity(identity)
            .build()
            .map_err(|e| BankingError::Certificate(format!("Failed to build mTLS client: {e}")))
    }

    async fn post<B: Serialize>(
        &self,
        session: &BankingSession,
        path: &str,
        body: &B,
    ) -> BankingResult<Response> {
        let url = format!("{}{}", self.config.api_url, path);
        debug!("Bank POST {}", url);
        let builder = session.http_client.post(&url).bearer_auth(session.bearer());
        let response = self.with_account(builder).json(body).send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(BankingError::Auth(format!(
                "Bank refused the access token with {status}"
            )))
        } else {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            Err(BankingError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }

    fn with_account(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.account_number {
            Some(account) => builder.header(ACCOUNT_HEADER, account),
            None => builder,
        }
    }
}

fn destination_kind(payment: &PixPayment) -> &'static str {
    use crate::payment::PixDestination;
    match payment.destinatario {
        PixDestination::Chave { .. } => "CHAVE",
        PixDestination::DadosBancarios { .. } => "DADOS_BANCARIOS",
        PixDestination::PixCopiaECola { .. } => "PIX_COPIA_E_COLA",
    }
}
