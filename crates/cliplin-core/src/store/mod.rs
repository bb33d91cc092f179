//! Document store abstraction.
//!
//! The [`DocumentStore`] trait is the only way the bootstrap and
//! reconciliation code touches persistent state. A store is a set of named
//! collections; a [`Collection`] handle addresses documents by identifier.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//! [`memory::InMemoryStore`] backs the tests; the `cliplin` crate provides a
//! SQLite-backed store.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`list_collections`](DocumentStore::list_collections) | Names of existing collections |
//! | [`get_or_create_collection`](DocumentStore::get_or_create_collection) | Create a collection if missing |
//! | [`collection`](DocumentStore::collection) | Handle to an existing collection |
//! | [`exists`](Collection::exists) | Existence check by identifier |
//! | [`insert`](Collection::insert) | Insert a new document |
//! | [`update`](Collection::update) | Replace content and metadata of an existing document |

pub mod memory;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::models::{DocumentMetadata, IndexedDocument};

/// Errors a store reports for well-defined misuse. Backend failures
/// (I/O, SQL) travel as plain `anyhow` errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("collection '{0}' does not exist")]
    CollectionNotFound(String),

    #[error("document '{id}' already exists in collection '{collection}'")]
    DuplicateDocument { collection: String, id: String },

    #[error("document '{id}' does not exist in collection '{collection}'")]
    DocumentNotFound { collection: String, id: String },
}

/// A document as read back from a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub id: String,
    pub content: String,
    pub metadata: DocumentMetadata,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Names of all collections currently in the store.
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Return the named collection, creating it first if it is missing.
    async fn get_or_create_collection(&self, name: &str) -> Result<Arc<dyn Collection>>;

    /// Return the named collection; fails with
    /// [`StoreError::CollectionNotFound`] when it does not exist.
    async fn collection(&self, name: &str) -> Result<Arc<dyn Collection>>;
}

#[async_trait]
pub trait Collection: Send + Sync {
    fn name(&self) -> &str;

    async fn exists(&self, id: &str) -> Result<bool>;

    async fn get(&self, id: &str) -> Result<Option<StoredDocument>>;

    /// Insert a new document. Fails with [`StoreError::DuplicateDocument`]
    /// when the identifier is taken.
    async fn insert(&self, doc: &IndexedDocument) -> Result<()>;

    /// Replace the content and metadata of an existing document. Fails with
    /// [`StoreError::DocumentNotFound`] when the identifier is unknown.
    async fn update(&self, doc: &IndexedDocument) -> Result<()>;

    async fn count(&self) -> Result<usize>;
}
