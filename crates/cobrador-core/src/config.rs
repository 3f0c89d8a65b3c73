//! Process-wide configuration loaded from environment variables.
//!
//! Configuration is read once at startup into an immutable [`CobradorConfig`]
//! and handed to each client constructor. Credentials are optional at load
//! time: their absence is reported as an authentication failure by the client
//! that needs them, not as a startup failure.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// Default identity provider endpoint used by the accounting service.
pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com";

/// Default host of the public invoice preview pages.
pub const DEFAULT_PREVIEW_BASE_URL: &str = "https://www.asaas.com";

/// Default session cookie set by the accounting service.
pub const DEFAULT_SESSION_COOKIE: &str = "__session";

/// Default banking API host.
pub const DEFAULT_BANK_API_URL: &str = "https://cdpj.partners.bancointer.com.br";

/// Scopes requested in the client-credentials exchange.
pub const DEFAULT_BANK_SCOPES: &str = "pagamento-pix.write pagamento-boleto.write";

/// Default document-understanding API host.
pub const DEFAULT_EXTRACTOR_API_URL: &str = "https://api.anthropic.com";

/// Default extraction model.
pub const DEFAULT_EXTRACTOR_MODEL: &str = "claude-3-5-sonnet-latest";

/// Configuration for the whole pipeline.
#[derive(Debug, Clone)]
pub struct CobradorConfig {
    pub accounting: AccountingConfig,
    pub banking: BankingConfig,
    pub extractor: ExtractorConfig,
    /// Upper bound applied to every outbound HTTP request.
    pub http_timeout: Duration,
}

/// Accounting service endpoints and credentials.
#[derive(Debug, Clone)]
pub struct AccountingConfig {
    /// Base URL of the accounting web application.
    pub app_url: String,
    /// Base URL of the identity provider.
    pub identity_url: String,
    /// Identity provider API key.
    pub api_key: Option<SecretString>,
    pub email: Option<String>,
    pub password: Option<SecretString>,
    /// Account to operate on. Resolved from the session when absent.
    pub account_id: Option<String>,
    /// Name of the cookie carrying the session id.
    pub session_cookie: String,
    /// Host used when rewriting invoice short links to preview pages.
    pub preview_base_url: String,
}

/// Where PEM material for the bank's mutual TLS comes from.
#[derive(Debug, Clone)]
pub enum CertificateSource {
    /// A PEM file on disk.
    Path(PathBuf),
    /// Base64-encoded PEM, typically injected through the environment.
    Inline(SecretString),
}

/// Banking service endpoints and client credentials.
#[derive(Debug, Clone)]
pub struct BankingConfig {
    pub api_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub certificate: Option<CertificateSource>,
    pub private_key: Option<CertificateSource>,
    /// Sent as `x-conta-corrente` when the credentials cover several accounts.
    pub account_number: Option<String>,
    pub scopes: String,
}

/// Document-understanding service settings.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub api_url: String,
    pub api_key: Option<SecretString>,
    pub model: String,
    pub max_tokens: u32,
}

impl CobradorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    ///
    /// Lets tests supply variables without touching the process environment.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let optional = |key: &str| reader(key).ok().filter(|v| !v.trim().is_empty());
        let required = |key: &str| optional(key).ok_or_else(|| ConfigError::MissingVar(key.into()));

        let http_timeout_secs = optional("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidValue("HTTP_TIMEOUT_SECS".into(), e.to_string()))?;
        if http_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "HTTP_TIMEOUT_SECS".into(),
                "must be greater than zero".into(),
            ));
        }

        let accounting = AccountingConfig {
            app_url: trim_url(required("ACCOUNTING_APP_URL")?),
            identity_url: trim_url(
                optional("ACCOUNTING_IDENTITY_URL").unwrap_or_else(|| DEFAULT_IDENTITY_URL.into()),
            ),
            api_key: optional("ACCOUNTING_API_KEY").map(SecretString::new),
            email: optional("ACCOUNTING_EMAIL"),
            password: optional("ACCOUNTING_PASSWORD").map(SecretString::new),
            account_id: optional("ACCOUNTING_ACCOUNT_ID"),
            session_cookie: optional("ACCOUNTING_SESSION_COOKIE")
                .unwrap_or_else(|| DEFAULT_SESSION_COOKIE.into()),
            preview_base_url: trim_url(
                optional("INVOICE_PREVIEW_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_PREVIEW_BASE_URL.into()),
            ),
        };

        let certificate = optional("BANK_CERT_B64")
            .map(|v| CertificateSource::Inline(SecretString::new(v)))
            .or_else(|| optional("BANK_CERT_PATH").map(|p| CertificateSource::Path(p.into())));
        let private_key = optional("BANK_KEY_B64")
            .map(|v| CertificateSource::Inline(SecretString::new(v)))
            .or_else(|| optional("BANK_KEY_PATH").map(|p| CertificateSource::Path(p.into())));

        let banking = BankingConfig {
            api_url: trim_url(optional("BANK_API_URL").unwrap_or_else(|| DEFAULT_BANK_API_URL.into())),
            client_id: optional("BANK_CLIENT_ID"),
            client_secret: optional("BANK_CLIENT_SECRET").map(SecretString::new),
            certificate,
            private_key,
            account_number: optional("BANK_ACCOUNT_NUMBER"),
            scopes: optional("BANK_SCOPES").unwrap_or_else(|| DEFAULT_BANK_SCOPES.into()),
        };

        let max_tokens = optional("EXTRACTOR_MAX_TOKENS")
            .unwrap_or_else(|| "1024".to_string())
            .parse::<u32>()
            .map_err(|e| ConfigError::InvalidValue("EXTRACTOR_MAX_TOKENS".into(), e.to_string()))?;

        let extractor = ExtractorConfig {
            api_url: trim_url(
                optional("EXTRACTOR_API_URL").unwrap_or_else(|| DEFAULT_EXTRACTOR_API_URL.into()),
            ),
            api_key: optional("EXTRACTOR_API_KEY").map(SecretString::new),
            model: optional("EXTRACTOR_MODEL").unwrap_or_else(|| DEFAULT_EXTRACTOR_MODEL.into()),
            max_tokens,
        };

        Ok(Self {
            accounting,
            banking,
            extractor,
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl From<ConfigError> for crate::CobradorError {
    fn from(err: ConfigError) -> Self {
        crate::CobradorError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;
    use std::env::VarError;

    /// Create a reader closure from a HashMap (no global env mutation).
    fn make_reader(vars: HashMap<&str, &str>) -> impl Fn(&str) -> Result<String, VarError> {
        let owned: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| owned.get(key).cloned().ok_or(VarError::NotPresent)
    }

    #[test]
    fn test_missing_app_url() {
        let err = CobradorConfig::from_reader(make_reader(HashMap::new())).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(_)));
        assert!(err.to_string().contains("ACCOUNTING_APP_URL"));
    }

    #[test]
    fn test_defaults() {
        let reader = make_reader(HashMap::from([(
            "ACCOUNTING_APP_URL",
            "https://app.example.com/",
        )]));
        let config = CobradorConfig::from_reader(reader).expect("defaults should load");

        assert_eq!(config.accounting.app_url, "https://app.example.com");
        assert_eq!(config.accounting.identity_url, DEFAULT_IDENTITY_URL);
        assert_eq!(config.accounting.session_cookie, DEFAULT_SESSION_COOKIE);
        assert!(config.accounting.email.is_none());
        assert_eq!(config.banking.api_url, DEFAULT_BANK_API_URL);
        assert!(config.banking.certificate.is_none());
        assert_eq!(config.extractor.model, DEFAULT_EXTRACTOR_MODEL);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_empty_values_are_unset() {
        let reader = make_reader(HashMap::from([
            ("ACCOUNTING_APP_URL", "https://app.example.com"),
            ("ACCOUNTING_EMAIL", "  "),
        ]));
        let config = CobradorConfig::from_reader(reader).unwrap();
        assert!(config.accounting.email.is_none());
    }

    #[test]
    fn test_inline_certificate_takes_precedence() {
        let reader = make_reader(HashMap::from([
            ("ACCOUNTING_APP_URL", "https://app.example.com"),
            ("BANK_CERT_B64", "LS0tLS1CRUdJTg=="),
            ("BANK_CERT_PATH", "/etc/bank/cert.pem"),
            ("BANK_KEY_PATH", "/etc/bank/key.pem"),
        ]));
        let config = CobradorConfig::from_reader(reader).unwrap();

        match config.banking.certificate {
            Some(CertificateSource::Inline(ref pem)) => {
                assert_eq!(pem.expose_secret(), "LS0tLS1CRUdJTg==");
            }
            other => panic!("expected inline certificate, got {other:?}"),
        }
        assert!(matches!(
            config.banking.private_key,
            Some(CertificateSource::Path(ref p)) if p == &PathBuf::from("/etc/bank/key.pem")
        ));
    }

    #[test]
    fn test_invalid_timeout() {
        let reader = make_reader(HashMap::from([
            ("ACCOUNTING_APP_URL", "https://app.example.com"),
            ("HTTP_TIMEOUT_SECS", "soon"),
        ]));
        let err = CobradorConfig::from_reader(reader).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref var, _) if var == "HTTP_TIMEOUT_SECS"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let reader = make_reader(HashMap::from([
            ("ACCOUNTING_APP_URL", "https://app.example.com"),
            ("HTTP_TIMEOUT_SECS", "0"),
        ]));
        assert!(CobradorConfig::from_reader(reader).is_err());
    }

    #[test]
    fn test_secrets_are_redacted_in_debug() {
        let reader = make_reader(HashMap::from([
            ("ACCOUNTING_APP_URL", "https://app.example.com"),
            ("ACCOUNTING_PASSWORD", "hunter2"),
            ("BANK_CLIENT_SECRET", "bank-secret"),
        ]));
        let config = CobradorConfig::from_reader(reader).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("bank-secret"));
    }
}
