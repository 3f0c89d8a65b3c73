//! Router tests against a scripted runner.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use cobrador_api::logging::init_test_logging;
use cobrador_api::{router, AppState, PassRunner};
use cobrador_core::{CobradorError, CobradorResult};
use cobrador_reconcile::{DocumentPayment, PassSummary};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "cron-secret";

#[derive(Default)]
struct ScriptedRunner {
    fail_with: Option<fn() -> CobradorError>,
    runs: AtomicUsize,
}

#[async_trait]
impl PassRunner for ScriptedRunner {
    async fn run_pass(&self) -> CobradorResult<PassSummary> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if let Some(make_error) = self.fail_with {
            return Err(make_error());
        }
        let mut summary = PassSummary::new(Uuid::new_v4());
        summary.charges_seen = 3;
        summary.charges_with_pix = 2;
        summary.charges_paid = 2;
        Ok(summary)
    }

    async fn pay_document(&self, document_id: &str) -> CobradorResult<DocumentPayment> {
        match document_id {
            "D1" => Ok(DocumentPayment::Paid),
            "D2" => Ok(DocumentPayment::AlreadyPaid),
            "D3" => Err(CobradorError::Payment("boleto payment code is empty".into())),
            _ => Ok(DocumentPayment::NotFound),
        }
    }
}

fn app_with(runner: Arc<ScriptedRunner>) -> (Router, AppState) {
    init_test_logging();
    let state = AppState::new(runner, SecretString::new(SECRET.to_string()));
    (router(state.clone()), state)
}

fn post(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app_with(Arc::new(ScriptedRunner::default()));
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn test_reconcile_without_token_is_rejected() {
    let runner = Arc::new(ScriptedRunner::default());
    let (app, _) = app_with(runner.clone());

    let response = app.oneshot(post("/v1/reconcile", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "unauthorized");
    assert_eq!(runner.runs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_reconcile_with_wrong_token_is_rejected() {
    let runner = Arc::new(ScriptedRunner::default());
    let (app, _) = app_with(runner.clone());

    let response = app
        .oneshot(post("/v1/reconcile", Some("cron-secreT")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(runner.runs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_reconcile_with_basic_scheme_is_rejected() {
    let (app, _) = app_with(Arc::new(ScriptedRunner::default()));
    let request = Request::builder()
        .method("POST")
        .uri("/v1/reconcile")
        .header(header::AUTHORIZATION, format!("Basic {SECRET}"))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reconcile_returns_paid_count() {
    let runner = Arc::new(ScriptedRunner::default());
    let (app, _) = app_with(runner.clone());

    let response = app
        .oneshot(post("/v1/reconcile", Some(SECRET)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["summary"]["charges_seen"], 3);
    assert!(body["summary"]["pass_id"].is_string());
    assert_eq!(runner.runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_pass_returns_error_body() {
    let runner = Arc::new(ScriptedRunner {
        fail_with: Some(|| CobradorError::Auth("INVALID_PASSWORD".into())),
        ..Default::default()
    });
    let (app, _) = app_with(runner);

    let response = app
        .oneshot(post("/v1/reconcile", Some(SECRET)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "auth_error");
    assert_eq!(body["status"], 500);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("INVALID_PASSWORD"));
}

#[tokio::test]
async fn test_concurrent_pass_is_refused() {
    let runner = Arc::new(ScriptedRunner::default());
    let (app, state) = app_with(runner.clone());
    let _running = state.work_lock.lock().await;

    let response = app
        .oneshot(post("/v1/reconcile", Some(SECRET)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["error"], "pass_in_progress");
    assert_eq!(runner.runs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_pay_document() {
    let (app, _) = app_with(Arc::new(ScriptedRunner::default()));

    let response = app
        .clone()
        .oneshot(post("/v1/documents/D1/pay", Some(SECRET)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["document_id"], "D1");
    assert_eq!(body["already_paid"], false);

    let response = app
        .oneshot(post("/v1/documents/D2/pay", Some(SECRET)))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["already_paid"], true);
}

#[tokio::test]
async fn test_pay_unknown_document() {
    let (app, _) = app_with(Arc::new(ScriptedRunner::default()));

    let response = app
        .oneshot(post("/v1/documents/NOPE/pay", Some(SECRET)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn test_pay_document_with_unpayable_boleto() {
    let (app, _) = app_with(Arc::new(ScriptedRunner::default()));

    let response = app
        .oneshot(post("/v1/documents/D3/pay", Some(SECRET)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["error"], "payment_error");
}

#[tokio::test]
async fn test_pay_document_requires_token() {
    let (app, _) = app_with(Arc::new(ScriptedRunner::default()));
    let response = app
        .oneshot(post("/v1/documents/D1/pay", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
