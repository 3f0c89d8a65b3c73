//! HTTP routes.

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use cobrador_reconcile::{DocumentPayment, PassSummary};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::{json, Value};
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Body returned by a successful pass.
#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    /// Charges paid during the pass.
    pub count: usize,
    pub summary: PassSummary,
}

/// Body returned by a document payment.
#[derive(Debug, Serialize)]
pub struct DocumentPaymentResponse {
    pub document_id: String,
    pub already_paid: bool,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/reconcile", post(reconcile))
        .route("/v1/documents/:id/pay", post(pay_document))
        .with_state(state)
}

async fn health() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

async fn reconcile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ReconcileResponse>, ApiError> {
    authorize(&state, &headers)?;
    let _guard = state
        .work_lock
        .try_lock()
        .map_err(|_| ApiError::PassInProgress)?;

    let summary = state.runner.run_pass().await?;
    info!(pass_id = %summary.pass_id, count = summary.charges_paid, "Pass completed");
    Ok(Json(ReconcileResponse {
        count: summary.charges_paid,
        summary,
    }))
}

async fn pay_document(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<DocumentPaymentResponse>, ApiError> {
    authorize(&state, &headers)?;
    let _guard = state
        .work_lock
        .try_lock()
        .map_err(|_| ApiError::PassInProgress)?;

    let already_paid = match state.runner.pay_document(&document_id).await? {
        DocumentPayment::Paid => false,
        DocumentPayment::AlreadyPaid => true,
        DocumentPayment::NotFound => return Err(ApiError::NotFound(document_id)),
    };
    Ok(Json(DocumentPaymentResponse {
        document_id,
        already_paid,
    }))
}

/// Checks `Authorization: Bearer <CRON_SECRET>` in constant time.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| {
            warn!("Rejected request without bearer token");
            ApiError::Unauthorized
        })?;

    let expected = state.cron_secret.expose_secret().as_bytes();
    if bool::from(presented.as_bytes().ct_eq(expected)) {
        Ok(())
    } else {
        warn!("Rejected request with invalid bearer token");
        Err(ApiError::Unauthorized)
    }
}
