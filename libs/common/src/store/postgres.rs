//! PostgreSQL-backed document store
//!
//! Every collection lives in one `documents` table keyed by
//! `(collection, id)` with the record itself in a JSONB `body` column.
//! Filters use JSONB containment and updates merge the `$set` object into
//! the stored body.

use async_trait::async_trait;
use regex::Regex;
use sqlx::{PgPool, types::Json};
use std::sync::OnceLock;
use tracing::info;

use super::{Document, DocumentStore, ID_FIELD, InsertOneResult, UpdateResult, unique_index_name};
use crate::error::{StoreError, StoreResult};

const CREATE_DOCUMENTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        body JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (collection, id)
    )
"#;

const CREATE_BODY_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS documents_body_idx
    ON documents USING GIN (body jsonb_path_ops)
"#;

/// Check that `name` can be spliced into DDL as a bare identifier
fn validate_identifier(name: &str) -> StoreResult<()> {
    static IDENTIFIER_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = IDENTIFIER_REGEX.get_or_init(|| {
        Regex::new(r"^[a-z][a-z0-9_]{0,47}$").expect("Failed to compile identifier regex")
    });

    if regex.is_match(name) {
        Ok(())
    } else {
        Err(StoreError::Configuration(format!(
            "'{name}' is not a valid collection or field name"
        )))
    }
}

/// Document store persisting into PostgreSQL JSONB rows
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Create a new store over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `documents` table and its containment index
    pub async fn migrate(&self) -> StoreResult<()> {
        info!("Ensuring documents table exists");

        sqlx::query(CREATE_DOCUMENTS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_query)?;
        sqlx::query(CREATE_BODY_INDEX)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_query)?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find(&self, collection: &str, filter: &Document) -> StoreResult<Vec<Document>> {
        let rows = sqlx::query_scalar::<_, Json<Document>>(
            r#"
            SELECT body
            FROM documents
            WHERE collection = $1 AND body @> $2
            ORDER BY created_at
            "#,
        )
        .bind(collection)
        .bind(Json(filter))
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_query)?;

        Ok(rows.into_iter().map(|Json(document)| document).collect())
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Document,
    ) -> StoreResult<Option<Document>> {
        let row = sqlx::query_scalar::<_, Json<Document>>(
            r#"
            SELECT body
            FROM documents
            WHERE collection = $1 AND body @> $2
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(collection)
        .bind(Json(filter))
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_query)?;

        Ok(row.map(|Json(document)| document))
    }

    async fn insert_one(
        &self,
        collection: &str,
        document: Document,
    ) -> StoreResult<InsertOneResult> {
        let inserted_id = document
            .get(ID_FIELD)
            .and_then(|id| id.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                StoreError::Configuration(format!(
                    "document inserted into '{collection}' has no string '{ID_FIELD}'"
                ))
            })?;

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(collection)
        .bind(&inserted_id)
        .bind(Json(&document))
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_query)?;

        Ok(InsertOneResult { inserted_id })
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Document,
        set: &Document,
    ) -> StoreResult<UpdateResult> {
        let modified = sqlx::query_scalar::<_, bool>(
            r#"
            WITH target AS (
                SELECT collection, id, body
                FROM documents
                WHERE collection = $1 AND body @> $2
                ORDER BY created_at
                LIMIT 1
                FOR UPDATE
            )
            UPDATE documents AS d
            SET body = d.body || $3
            FROM target AS t
            WHERE d.collection = t.collection AND d.id = t.id
            RETURNING t.body <> d.body
            "#,
        )
        .bind(collection)
        .bind(Json(filter))
        .bind(Json(set))
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_query)?;

        Ok(match modified {
            Some(modified) => UpdateResult {
                matched_count: 1,
                modified_count: u64::from(modified),
            },
            None => UpdateResult::default(),
        })
    }

    async fn create_unique_index(&self, collection: &str, field: &str) -> StoreResult<()> {
        validate_identifier(collection)?;
        validate_identifier(field)?;

        let index = unique_index_name(collection, field);
        info!("Ensuring unique index {}", index);

        let statement = format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {index} \
             ON documents ((body ->> '{field}')) \
             WHERE collection = '{collection}'"
        );
        sqlx::query(&statement)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_query)?;

        Ok(())
    }
}
