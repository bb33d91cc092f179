//! In-memory [`DocumentStore`] implementation for tests.
//!
//! Collections and documents live in `BTreeMap`s behind `std::sync::RwLock`.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::IndexedDocument;

use super::{Collection, DocumentStore, StoreError, StoredDocument};

/// In-memory store for tests.
pub struct InMemoryStore {
    collections: RwLock<BTreeMap<String, Arc<InMemoryCollection>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(BTreeMap::new()),
        }
    }

    /// Concrete handle to a collection, for assertions in tests.
    pub fn collection_handle(&self, name: &str) -> Option<Arc<InMemoryCollection>> {
        self.collections.read().ok()?.get(name).cloned()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

pub struct InMemoryCollection {
    name: String,
    docs: RwLock<BTreeMap<String, StoredDocument>>,
}

impl InMemoryCollection {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            docs: RwLock::new(BTreeMap::new()),
        }
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn list_collections(&self) -> Result<Vec<String>> {
        let collections = self.collections.read().map_err(poisoned)?;
        Ok(collections.keys().cloned().collect())
    }

    async fn get_or_create_collection(&self, name: &str) -> Result<Arc<dyn Collection>> {
        let mut collections = self.collections.write().map_err(poisoned)?;
        let handle: Arc<dyn Collection> = collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(InMemoryCollection::new(name)))
            .clone();
        Ok(handle)
    }

    async fn collection(&self, name: &str) -> Result<Arc<dyn Collection>> {
        let collections = self.collections.read().map_err(poisoned)?;
        match collections.get(name) {
            Some(handle) => {
                let handle: Arc<dyn Collection> = handle.clone();
                Ok(handle)
            }
            None => Err(StoreError::CollectionNotFound(name.to_string()).into()),
        }
    }
}

#[async_trait]
impl Collection for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.docs.read().map_err(poisoned)?.contains_key(id))
    }

    async fn get(&self, id: &str) -> Result<Option<StoredDocument>> {
        Ok(self.docs.read().map_err(poisoned)?.get(id).cloned())
    }

    async fn insert(&self, doc: &IndexedDocument) -> Result<()> {
        let mut docs = self.docs.write().map_err(poisoned)?;
        if docs.contains_key(&doc.id) {
            return Err(StoreError::DuplicateDocument {
                collection: self.name.clone(),
                id: doc.id.clone(),
            }
            .into());
        }
        docs.insert(doc.id.clone(), to_stored(doc));
        Ok(())
    }

    async fn update(&self, doc: &IndexedDocument) -> Result<()> {
        let mut docs = self.docs.write().map_err(poisoned)?;
        match docs.get_mut(&doc.id) {
            Some(slot) => {
                *slot = to_stored(doc);
                Ok(())
            }
            None => Err(StoreError::DocumentNotFound {
                collection: self.name.clone(),
                id: doc.id.clone(),
            }
            .into()),
        }
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.docs.read().map_err(poisoned)?.len())
    }
}

fn to_stored(doc: &IndexedDocument) -> StoredDocument {
    StoredDocument {
        id: doc.id.clone(),
        content: doc.content.clone(),
        metadata: doc.metadata.clone(),
    }
}
