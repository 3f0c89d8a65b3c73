//! Client certificate loading for the bank's mutual TLS.
//!
//! PEM material comes either from a file or from base64 text injected
//! through the environment. Only sizes are ever logged.

use base64::Engine;
use cobrador_core::{BankingConfig, CertificateSource};
use reqwest::Identity;
use secrecy::ExposeSecret;
use tracing::{debug, warn};

use crate::error::{BankingError, BankingResult};

const PEM_MARKER: &[u8] = b"-----BEGIN";

/// Builds the TLS client identity from the configured certificate and key.
///
/// # Errors
///
/// Returns [`BankingError::Certificate`] if either part is unconfigured,
/// unreadable, not PEM, or rejected by the TLS backend.
pub async fn load_identity(config: &BankingConfig) -> BankingResult<Identity> {
    let certificate = config
        .certificate
        .as_ref()
        .ok_or_else(|| BankingError::Certificate("client certificate is not configured".into()))?;
    let private_key = config
        .private_key
        .as_ref()
        .ok_or_else(|| BankingError::Certificate("private key is not configured".into()))?;

    let certificate = load_pem(certificate, "certificate").await?;
    let private_key = load_pem(private_key, "private key").await?;

    let mut bundle = private_key;
    if !bundle.ends_with(b"\n") {
        bundle.push(b'\n');
    }
    bundle.extend_from_slice(&certificate);

    let identity = Identity::from_pem(&bundle)
        .map_err(|e| BankingError::Certificate(format!("invalid client identity: {e}")))?;
    debug!(bytes = bundle.len(), "Client identity loaded");
    Ok(identity)
}

/// Reads one PEM item from its source.
///
/// # Errors
///
/// Returns [`BankingError::Certificate`] if the source cannot be read or
/// does not contain PEM.
pub async fn load_pem(source: &CertificateSource, what: &str) -> BankingResult<Vec<u8>> {
    let pem = match source {
        CertificateSource::Path(path) => {
            check_permissions(path);
            tokio::fs::read(path).await.map_err(|e| {
                BankingError::Certificate(format!("cannot read {what} '{}': {e}", path.display()))
            })?
        }
        CertificateSource::Inline(encoded) => decode_inline(encoded.expose_secret(), what)?,
    };

    if !contains_pem(&pem) {
        return Err(BankingError::Certificate(format!("{what} is not PEM encoded")));
    }
    debug!(what, bytes = pem.len(), "PEM material loaded");
    Ok(pem)
}

/// Decodes base64 PEM, tolerating line breaks from multi-line variables.
pub fn decode_inline(encoded: &str, what: &str) -> BankingResult<Vec<u8>> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| BankingError::Certificate(format!("{what} is not valid base64: {e}")))
}

fn contains_pem(bytes: &[u8]) -> bool {
    bytes.windows(PEM_MARKER.len()).any(|w| w == PEM_MARKER)
}

#[cfg(unix)]
fn check_permissions(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(metadata) = std::fs::metadata(path) {
        let mode = metadata.permissions().mode();
        if mode & 0o004 != 0 {
            warn!(
                path = %path.display(),
                mode = format!("{:o}", mode),
                "Key material is world-readable. Consider restricting permissions to 0600."
            );
        }
    }
}

#[cfg(not(unix))]
fn check_permissions(_path: &std::path::Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    const FAKE_PEM: &str = "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n";

    fn inline(text: &str) -> CertificateSource {
        let encoded = base64::engine::general_purpose::STANDARD.encode(text);
        CertificateSource::Inline(SecretString::new(encoded))
    }

    #[tokio::test]
    async fn test_inline_pem_decoded() {
        let pem = load_pem(&inline(FAKE_PEM), "certificate").await.unwrap();
        assert_eq!(pem, FAKE_PEM.as_bytes());
    }

    #[test]
    fn test_inline_tolerates_line_breaks() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(FAKE_PEM);
        let wrapped = format!("{}\n{}", &encoded[..10], &encoded[10..]);
        assert_eq!(decode_inline(&wrapped, "certificate").unwrap(), FAKE_PEM.as_bytes());
    }

    #[tokio::test]
    async fn test_inline_not_base64() {
        let source = CertificateSource::Inline(SecretString::new("%%%".into()));
        assert!(matches!(
            load_pem(&source, "certificate").await,
            Err(BankingError::Certificate(_))
        ));
    }

    #[tokio::test]
    async fn test_inline_not_pem() {
        let err = load_pem(&inline("just text"), "private key").await.unwrap_err();
        assert!(err.to_string().contains("private key is not PEM"));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let source = CertificateSource::Path("/nonexistent/cobrador/cert.pem".into());
        assert!(matches!(
            load_pem(&source, "certificate").await,
            Err(BankingError::Certificate(_))
        ));
    }

    #[tokio::test]
    async fn test_pem_file_read() {
        let path = std::env::temp_dir().join(format!("cobrador-test-{}.pem", std::process::id()));
        tokio::fs::write(&path, FAKE_PEM).await.unwrap();
        let pem = load_pem(&CertificateSource::Path(path.clone()), "certificate")
            .await
            .unwrap();
        tokio::fs::remove_file(&path).await.unwrap();
        assert_eq!(pem, FAKE_PEM.as_bytes());
    }

    #[tokio::test]
    async fn test_identity_requires_both_parts() {
        let config = BankingConfig {
            api_url: "https://bank.example.com".into(),
            client_id: Some("id".into()),
            client_secret: Some(SecretString::new("secret".into())),
            certificate: Some(inline(FAKE_PEM)),
            private_key: None,
            account_number: None,
            scopes: "pagamento-pix.write".into(),
        };
        let err = load_identity(&config).await.unwrap_err();
        assert!(err.to_string().contains("private key"));
    }
}
