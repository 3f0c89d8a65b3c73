//! Persisted tax documents.

use chrono::{DateTime, Utc};
use cobrador_core::TaxDocument;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// A tax document as stored after its first sighting.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PersistedDocument {
    pub id: String,
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub payment_code: Option<String>,
    pub value: Option<String>,
    pub expiration_date: Option<String>,
    pub paid: bool,
    pub created_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
}

/// Data for inserting a document.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub id: String,
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub payment_code: Option<String>,
    pub value: Option<String>,
    pub expiration_date: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&TaxDocument> for NewDocument {
    fn from(doc: &TaxDocument) -> Self {
        Self {
            id: doc.id.clone(),
            name: doc.name.clone(),
            title: doc.title.clone(),
            description: doc.description.clone(),
            tags: doc.tags.iter().cloned().collect(),
            payment_code: doc.payment_code.clone(),
            value: doc.value.clone(),
            expiration_date: doc.expiration_date.clone(),
            created_at: doc.created_at,
        }
    }
}

impl NewDocument {
    /// Stored form of this document, unpaid and recorded at `recorded_at`.
    #[must_use]
    pub fn into_persisted(self, recorded_at: DateTime<Utc>) -> PersistedDocument {
        PersistedDocument {
            id: self.id,
            name: self.name,
            title: self.title,
            description: self.description,
            tags: self.tags,
            payment_code: self.payment_code,
            value: self.value,
            expiration_date: self.expiration_date,
            paid: false,
            created_at: self.created_at,
            recorded_at,
        }
    }
}

impl PersistedDocument {
    /// Ids of every stored document.
    pub async fn list_ids(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT id FROM documents")
            .fetch_all(pool)
            .await
    }

    /// Get a document by id.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT id, name, title, description, tags, payment_code, value,
                   expiration_date, paid, created_at, recorded_at
            FROM documents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Insert unless a row with the same id exists. Returns whether a row was written.
    pub async fn insert_if_absent(pool: &PgPool, data: &NewDocument) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO documents (id, name, title, description, tags, payment_code,
                                   value, expiration_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&data.id)
        .bind(&data.name)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.tags)
        .bind(&data.payment_code)
        .bind(&data.value)
        .bind(&data.expiration_date)
        .bind(data.created_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Flag an unpaid document as paid. Returns whether the flag changed.
    pub async fn mark_paid(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE documents SET paid = TRUE WHERE id = $1 AND paid = FALSE")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_new_document_from_tax_document() {
        let doc = TaxDocument {
            id: "D1".into(),
            name: "das.pdf".into(),
            title: Some("DAS 04/2025".into()),
            description: None,
            tags: BTreeSet::from(["guia".to_string(), "2025".to_string()]),
            created_at: Utc::now(),
            payment_code: Some("1".repeat(48)),
            value: Some("99.90".into()),
            expiration_date: None,
        };

        let new = NewDocument::from(&doc);
        assert_eq!(new.id, "D1");
        assert_eq!(new.tags, vec!["2025".to_string(), "guia".to_string()]);
        assert_eq!(new.value.as_deref(), Some("99.90"));

        let persisted = new.into_persisted(Utc::now());
        assert!(!persisted.paid);
    }
}
