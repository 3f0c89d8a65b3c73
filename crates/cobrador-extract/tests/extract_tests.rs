//! Integration tests for invoice scraping and boleto extraction against
//! mocked upstream services.

use cobrador_core::ExtractorConfig;
use cobrador_extract::{DocumentCodeExtractor, ExtractError, InvoiceScraper};
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PIX_CODE: &str =
    "00020101021226870014br.gov.bcb.pix2565qrcode.example.com/v2/xyz5204000053039865802BR6304BEEF";
const CODE_48: &str = "858900000050681002022504150000000000000000000001";

fn extractor(server: &MockServer, api_key: Option<&str>) -> DocumentCodeExtractor {
    let config = ExtractorConfig {
        api_url: server.uri(),
        api_key: api_key.map(|k| SecretString::new(k.to_string())),
        model: "test-model".to_string(),
        max_tokens: 512,
    };
    DocumentCodeExtractor::with_http_client(config, reqwest::Client::new())
}

fn text_answer(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_1",
        "type": "message",
        "role": "assistant",
        "content": [{ "type": "text", "text": text }]
    })
}

// ---------------------------------------------------------------------------
// Invoice scraper
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_scraper_extracts_code_from_preview_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/b/preview/XYZ"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<html><body><h2>Código Pix copia e cola</h2><p>{PIX_CODE}</p></body></html>"
        )))
        .expect(1)
        .mount(&server)
        .await;

    let scraper = InvoiceScraper::with_http_client(reqwest::Client::new());
    let code = scraper
        .extract_pix_code(&format!("{}/b/preview/XYZ", server.uri()))
        .await;

    assert_eq!(code.unwrap().as_str(), PIX_CODE);
}

#[tokio::test]
async fn test_scraper_downgrades_http_error_to_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/b/preview/GONE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let scraper = InvoiceScraper::with_http_client(reqwest::Client::new());
    let code = scraper
        .extract_pix_code(&format!("{}/b/preview/GONE", server.uri()))
        .await;

    assert!(code.is_none());
}

#[tokio::test]
async fn test_scraper_downgrades_connection_failure_to_none() {
    let scraper = InvoiceScraper::with_http_client(reqwest::Client::new());
    let code = scraper
        .extract_pix_code("http://127.0.0.1:1/b/preview/XYZ")
        .await;
    assert!(code.is_none());
}

// ---------------------------------------------------------------------------
// Document code extractor
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_extractor_returns_validated_boleto() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(body_string_contains("https://files.example.com/guia.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_answer(&format!(
            r#"{{"payment_code": "{CODE_48}", "value": "1075.61", "expiration_date": "2025-04-30"}}"#
        ))))
        .expect(1)
        .mount(&server)
        .await;

    let boleto = extractor(&server, Some("test-key"))
        .extract("https://files.example.com/guia.pdf")
        .await
        .unwrap();

    assert_eq!(boleto.payment_code, CODE_48);
    assert_eq!(boleto.value, "1075.61");
    assert_eq!(boleto.expiration_date, "2025-04-30");
}

#[tokio::test]
async fn test_extractor_rejects_short_payment_code() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_answer(
            r#"{"payment_code": "858-9000-0005-068", "value": "10.00", "expiration_date": "2025-04-30"}"#,
        )))
        .mount(&server)
        .await;

    let result = extractor(&server, Some("test-key"))
        .extract("https://files.example.com/guia.pdf")
        .await;

    assert!(matches!(result, Err(ExtractError::InvalidShape(_))));
}

#[tokio::test]
async fn test_extractor_rejects_non_text_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "type": "tool_use", "id": "t1", "name": "x", "input": {} }]
        })))
        .mount(&server)
        .await;

    let result = extractor(&server, Some("test-key"))
        .extract("https://files.example.com/guia.pdf")
        .await;

    assert!(matches!(result, Err(ExtractError::NonTextResponse)));
}

#[tokio::test]
async fn test_extractor_surfaces_service_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let result = extractor(&server, Some("test-key"))
        .extract("https://files.example.com/guia.pdf")
        .await;

    assert!(matches!(result, Err(ExtractError::Service { status: 529, .. })));
}

#[tokio::test]
async fn test_extractor_requires_api_key() {
    let server = MockServer::start().await;

    let result = extractor(&server, None)
        .extract("https://files.example.com/guia.pdf")
        .await;

    assert!(matches!(result, Err(ExtractError::MissingApiKey)));
    let err: cobrador_core::CobradorError = result.unwrap_err().into();
    assert_eq!(err.kind(), "extraction_error");
}
