//! Client-credentials token exchange.

use std::fmt;

use cobrador_core::BankingConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::error::{BankingError, BankingResult};

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    scope: Option<String>,
}

/// Pass-scoped bank session: the mutual-TLS client and its access token.
///
/// The token is never refreshed. A new pass authenticates again.
#[derive(Clone)]
pub struct BankingSession {
    pub(crate) http_client: Client,
    pub(crate) access_token: SecretString,
    /// Token lifetime announced by the bank, in seconds.
    pub expires_in: Option<u64>,
}

impl fmt::Debug for BankingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BankingSession")
            .field("access_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

impl BankingSession {
    pub(crate) fn bearer(&self) -> &str {
        self.access_token.expose_secret()
    }
}

/// Requests an access token with the configured client credentials.
pub(crate) async fn request_token(
    http_client: Client,
    config: &BankingConfig,
) -> BankingResult<BankingSession> {
    let client_id = config
        .client_id
        .as_deref()
        .ok_or_else(|| BankingError::Auth("BANK_CLIENT_ID is not set".into()))?;
    let client_secret = config
        .client_secret
        .as_ref()
        .ok_or_else(|| BankingError::Auth("BANK_CLIENT_SECRET is not set".into()))?;

    let token_endpoint = format!("{}/oauth/v2/token", config.api_url);
    debug!("Fetching bank access token from {}", token_endpoint);

    let form = [
        ("client_id", client_id),
        ("client_secret", client_secret.expose_secret().as_str()),
        ("grant_type", "client_credentials"),
        ("scope", config.scopes.as_str()),
    ];
    let response = http_client
        .post(&token_endpoint)
        .form(&form)
        .send()
        .await
        .map_err(|e| BankingError::Auth(format!("Token request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        return Err(BankingError::Auth(format!(
            "Token endpoint returned {status}: {body}"
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| BankingError::Auth(format!("Failed to parse token response: {e}")))?;

    debug!(
        expires_in = ?token.expires_in,
        scope = token.scope.as_deref().unwrap_or_default(),
        "Bank access token issued"
    );

    Ok(BankingSession {
        http_client,
        access_token: SecretString::new(token.access_token),
        expires_in: token.expires_in,
    })
}
