//! Two-step login: identity provider password grant, then session exchange.
//!
//! The session is valid for one pass. Nothing here refreshes or caches it.

use cobrador_core::AccountingConfig;
use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AccountingError, AccountingResult};

/// Handle to an authenticated accounting session.
#[derive(Debug, Clone)]
pub struct AccountingSession {
    /// Value of the session cookie.
    pub session_id: SecretString,
    /// Account every RPC call is scoped to.
    pub account_id: String,
}

impl AccountingSession {
    /// `Cookie` header value for the given cookie name.
    pub(crate) fn cookie_header(&self, cookie_name: &str) -> String {
        format!("{cookie_name}={}", self.session_id.expose_secret())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionRequest<'a> {
    id_token: &'a str,
}

/// Exchanges the configured email and password for an identity token.
pub(crate) async fn sign_in(http: &Client, config: &AccountingConfig) -> AccountingResult<SecretString> {
    let api_key = config
        .api_key
        .as_ref()
        .ok_or_else(|| AccountingError::Auth("ACCOUNTING_API_KEY is not set".into()))?;
    let email = config
        .email
        .as_deref()
        .ok_or_else(|| AccountingError::Auth("ACCOUNTING_EMAIL is not set".into()))?;
    let password = config
        .password
        .as_ref()
        .ok_or_else(|| AccountingError::Auth("ACCOUNTING_PASSWORD is not set".into()))?;

    let url = format!("{}/v1/accounts:signInWithPassword", config.identity_url);
    debug!("Signing in to identity provider");
    let response = http
        .post(&url)
        .query(&[("key", api_key.expose_secret())])
        .json(&SignInRequest {
            email,
            password: password.expose_secret(),
            return_secure_token: true,
        })
        .send()
        .await
        .map_err(|e| AccountingError::Auth(format!("Identity request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        return Err(AccountingError::Auth(format!(
            "Identity provider returned {status}: {body}"
        )));
    }

    let token: SignInResponse = response
        .json()
        .await
        .map_err(|e| AccountingError::Auth(format!("Failed to parse identity response: {e}")))?;
    Ok(SecretString::new(token.id_token))
}

/// Trades an identity token for the session cookie value.
pub(crate) async fn exchange_session(
    http: &Client,
    config: &AccountingConfig,
    id_token: &SecretString,
) -> AccountingResult<SecretString> {
    let url = format!("{}/api/session", config.app_url);
    let response = http
        .post(&url)
        .json(&SessionRequest {
            id_token: id_token.expose_secret(),
        })
        .send()
        .await
        .map_err(|e| AccountingError::Auth(format!("Session request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AccountingError::Auth(format!(
            "Session exchange returned {status}"
        )));
    }

    if response.headers().get(SET_COOKIE).is_none() {
        return Err(AccountingError::Auth(
            "Session exchange returned no cookie".into(),
        ));
    }

    parse_session_cookie(response.headers(), &config.session_cookie).ok_or_else(|| {
        AccountingError::Auth(format!(
            "Session exchange returned no '{}' cookie",
            config.session_cookie
        ))
    })
}

/// Finds the value of cookie `name` among the `Set-Cookie` headers.
///
/// Attributes after the first `;` are ignored. An empty value counts as
/// absent.
#[must_use]
pub fn parse_session_cookie(headers: &HeaderMap, name: &str) -> Option<SecretString> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| {
            let pair = cookie.split(';').next()?;
            let (key, value) = pair.split_once('=')?;
            (key.trim() == name && !value.trim().is_empty()).then(|| value.trim().to_string())
        })
        .next()
        .map(SecretString::new)
}
