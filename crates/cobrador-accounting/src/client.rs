//! Accounting service HTTP client (reqwest-based).
//!
//! Read-only: the pipeline never writes back to the accounting service.

use std::time::Duration;

use cobrador_core::{AccountingConfig, Boleto, Charge, ChargeStatus, TaxDocument};
use cobrador_extract::DocumentCodeExtractor;
use reqwest::header::COOKIE;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};
use url::Url;

use crate::envelope::decode_batch;
use crate::error::{AccountingError, AccountingResult};
use crate::session::{self, AccountingSession};

const PREVIEW_PATH: &str = "/b/preview/";
const SHORT_LINK_PATH: &str = "/i/";

#[derive(Debug, Deserialize)]
struct AccountInfo {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DownloadUrl {
    url: Option<String>,
}

/// Client for the accounting service.
#[derive(Debug, Clone)]
pub struct AccountingClient {
    config: AccountingConfig,
    http_client: Client,
    extractor: DocumentCodeExtractor,
}

impl AccountingClient {
    /// Create a new accounting client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(
        config: AccountingConfig,
        extractor: DocumentCodeExtractor,
        timeout: Duration,
    ) -> AccountingResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AccountingError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            config,
            http_client,
            extractor,
        })
    }

    /// Create a client with a pre-built `reqwest::Client` (for testing).
    #[must_use]
    pub fn with_http_client(
        config: AccountingConfig,
        extractor: DocumentCodeExtractor,
        http_client: Client,
    ) -> Self {
        Self {
            config,
            http_client,
            extractor,
        }
    }

    /// Logs in and resolves the account the session operates on.
    ///
    /// # Errors
    ///
    /// Returns [`AccountingError::Auth`] if a credential is unset, the
    /// identity provider rejects it, or no session cookie comes back.
    #[instrument(skip(self))]
    pub async fn authenticate(&self) -> AccountingResult<AccountingSession> {
        let id_token = session::sign_in(&self.http_client, &self.config).await?;
        let session_id = session::exchange_session(&self.http_client, &self.config, &id_token).await?;

        let mut session = AccountingSession {
            session_id,
            account_id: self.config.account_id.clone().unwrap_or_default(),
        };
        if session.account_id.is_empty() {
            session.account_id = self.account_info(&session).await?;
        }

        info!(account_id = %session.account_id, "Accounting session established");
        Ok(session)
    }

    /// Id of the account attached to the session.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a malformed payload.
    pub async fn account_info(&self, session: &AccountingSession) -> AccountingResult<String> {
        let info: AccountInfo = self.query(session, "account.info", Value::Null).await?;
        Ok(info.id)
    }

    /// Charges still waiting for payment, with invoice links in preview form.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a malformed payload.
    #[instrument(skip(self, session))]
    pub async fn list_pending_charges(
        &self,
        session: &AccountingSession,
    ) -> AccountingResult<Vec<Charge>> {
        let charges: Vec<Charge> = self
            .query(
                session,
                "charges.list",
                json!({ "accountId": session.account_id }),
            )
            .await?;
        let total = charges.len();

        for charge in charges.iter().filter(|c| c.status == ChargeStatus::Other) {
            debug!(charge_id = %charge.id, "Charge has a status this service does not act on");
        }

        let pending: Vec<Charge> = charges
            .into_iter()
            .filter(|charge| charge.status.is_payable())
            .map(|mut charge| {
                charge.invoice_url =
                    normalize_invoice_url(&charge.invoice_url, &self.config.preview_base_url);
                charge
            })
            .collect();

        info!(total, pending = pending.len(), "Fetched charges");
        Ok(pending)
    }

    /// Documents tagged as tax guides or boletos.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a malformed payload.
    #[instrument(skip(self, session))]
    pub async fn list_tax_documents(
        &self,
        session: &AccountingSession,
    ) -> AccountingResult<Vec<TaxDocument>> {
        let documents: Vec<TaxDocument> = self
            .query(
                session,
                "documents.list",
                json!({ "accountId": session.account_id }),
            )
            .await?;
        let total = documents.len();

        let relevant: Vec<TaxDocument> = documents
            .into_iter()
            .filter(TaxDocument::is_tax_relevant)
            .collect();

        info!(total, tax = relevant.len(), "Fetched documents");
        Ok(relevant)
    }

    /// Reads the boleto fields out of a document's file.
    ///
    /// # Errors
    ///
    /// Returns [`AccountingError::InvalidPayload`] if the download URL is
    /// missing or malformed; extraction failures are passed through.
    #[instrument(skip(self, session))]
    pub async fn resolve_document_payment_code(
        &self,
        session: &AccountingSession,
        document_id: &str,
    ) -> AccountingResult<Boleto> {
        let download: DownloadUrl = self
            .query(
                session,
                "documents.downloadUrl",
                json!({ "accountId": session.account_id, "documentId": document_id }),
            )
            .await?;

        let url = download
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| AccountingError::InvalidPayload("download URL is missing".into()))?;
        let url = Url::parse(&url)
            .map_err(|e| AccountingError::InvalidPayload(format!("download URL is malformed: {e}")))?;

        Ok(self.extractor.extract(url.as_str()).await?)
    }

    // ── Internal HTTP Methods ─────────────────────────────────────────

    async fn query<T: DeserializeOwned>(
        &self,
        session: &AccountingSession,
        procedure: &str,
        input: Value,
    ) -> AccountingResult<T> {
        let url = format!("{}/api/trpc/{}", self.config.app_url, procedure);
        let input = json!({ "0": { "json": input } }).to_string();
        debug!("RPC GET {}", procedure);

        let response = self
            .http_client
            .get(&url)
            .query(&[("batch", "1"), ("input", input.as_str())])
            .header(COOKIE, session.cookie_header(&self.config.session_cookie))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AccountingError::Auth(format!(
                "{procedure} rejected the session with {status}"
            )));
        }
        if !status.is_success() {
            return Err(AccountingError::Upstream {
                procedure: procedure.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        decode_batch(&body, 0)
    }
}

/// Rewrites an invoice short link (`/i/{id}`) to its preview page.
///
/// Preview links, and anything not recognised as a short link, are returned
/// unchanged.
#[must_use]
pub fn normalize_invoice_url(invoice_url: &str, preview_base_url: &str) -> String {
    if invoice_url.contains(PREVIEW_PATH) {
        return invoice_url.to_string();
    }

    let path = match Url::parse(invoice_url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => invoice_url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    match path
        .strip_prefix(SHORT_LINK_PATH)
        .and_then(|rest| rest.split('/').next())
        .filter(|id| !id.is_empty())
    {
        Some(id) => format!(
            "{}{PREVIEW_PATH}{id}",
            preview_base_url.trim_end_matches('/')
        ),
        None => invoice_url.to_string(),
    }
}
