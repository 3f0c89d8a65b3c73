//! Payment ledger rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// Record of a payment submitted for a charge. Its id is the charge id.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub id: String,
    pub description: Option<String>,
    /// Request tracking id returned by the bank.
    pub tracking_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Data for recording a payment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPaymentEvent {
    pub id: String,
    pub description: Option<String>,
    pub tracking_id: Option<String>,
}

impl PaymentEvent {
    /// Whether a payment has been recorded for `id`.
    pub async fn exists(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM payment_events WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Get the event recorded for `id`.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT id, description, tracking_id, created_at FROM payment_events WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Append an event unless one exists for the id. Returns whether a row was written.
    pub async fn insert_if_absent(pool: &PgPool, data: &NewPaymentEvent) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO payment_events (id, description, tracking_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&data.id)
        .bind(&data.description)
        .bind(&data.tracking_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
