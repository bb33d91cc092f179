//! SQLite-backed [`DocumentStore`] implementation.
//!
//! Collections are rows of the `collections` table; documents are keyed by
//! `(collection, id)` in the `documents` table, with metadata stored as a
//! JSON object. See [`crate::migrate`] for the schema.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use cliplin_core::models::{DocumentMetadata, IndexedDocument};
use cliplin_core::store::{Collection, DocumentStore, StoreError, StoredDocument};

/// SQLite implementation of the [`DocumentStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Handle to one collection of a [`SqliteStore`].
pub struct SqliteCollection {
    pool: SqlitePool,
    name: String,
}

impl SqliteCollection {
    fn handle(pool: &SqlitePool, name: &str) -> Arc<dyn Collection> {
        Arc::new(Self {
            pool: pool.clone(),
            name: name.to_string(),
        })
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn list_collections(&self) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM collections ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(names)
    }

    async fn get_or_create_collection(&self, name: &str) -> Result<Arc<dyn Collection>> {
        sqlx::query(
            "INSERT INTO collections (name, created_at) VALUES (?, ?) ON CONFLICT(name) DO NOTHING",
        )
        .bind(name)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(SqliteCollection::handle(&self.pool, name))
    }

    async fn collection(&self, name: &str) -> Result<Arc<dyn Collection>> {
        let found: bool = sqlx::query_scalar("SELECT COUNT(*) > 0 FROM collections WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        if !found {
            return Err(StoreError::CollectionNotFound(name.to_string()).into());
        }
        Ok(SqliteCollection::handle(&self.pool, name))
    }
}

#[async_trait]
impl Collection for SqliteCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        let found: bool = sqlx::query_scalar(
            "SELECT COUNT(*) > 0 FROM documents WHERE collection = ? AND id = ?",
        )
        .bind(&self.name)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(found)
    }

    async fn get(&self, id: &str) -> Result<Option<StoredDocument>> {
        let row = sqlx::query(
            "SELECT id, content, metadata_json FROM documents WHERE collection = ? AND id = ?",
        )
        .bind(&self.name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let metadata_json: String = row.get("metadata_json");
        let metadata: DocumentMetadata = serde_json::from_str(&metadata_json)
            .with_context(|| format!("Corrupt metadata for document '{}'", id))?;

        Ok(Some(StoredDocument {
            id: row.get("id"),
            content: row.get("content"),
            metadata,
        }))
    }

    async fn insert(&self, doc: &IndexedDocument) -> Result<()> {
        let metadata_json = serde_json::to_string(&doc.metadata)?;
        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, content, metadata_json, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.name)
        .bind(&doc.id)
        .bind(&doc.content)
        .bind(&metadata_json)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::DuplicateDocument {
                    collection: self.name.clone(),
                    id: doc.id.clone(),
                }
                .into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, doc: &IndexedDocument) -> Result<()> {
        let metadata_json = serde_json::to_string(&doc.metadata)?;
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET content = ?, metadata_json = ?, updated_at = ?
            WHERE collection = ? AND id = ?
            "#,
        )
        .bind(&doc.content)
        .bind(&metadata_json)
        .bind(chrono::Utc::now().timestamp())
        .bind(&self.name)
        .bind(&doc.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::DocumentNotFound {
                collection: self.name.clone(),
                id: doc.id.clone(),
            }
            .into());
        }
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(&self.name)
            .fetch_one(&self.pool)
            .await?;
        Ok(n as usize)
    }
}
