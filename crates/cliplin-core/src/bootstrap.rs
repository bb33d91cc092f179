//! Collection bootstrap.
//!
//! Makes sure every collection of the [`CollectionTable`] exists before any
//! document is reconciled. Creation failures are returned to the caller and
//! never retried.

use anyhow::{Context, Result};
use tracing::info;

use crate::collections::CollectionTable;
use crate::store::DocumentStore;

/// Names of required collections missing from the store, in table order.
pub async fn missing_collections(
    store: &dyn DocumentStore,
    table: &CollectionTable,
) -> Result<Vec<String>> {
    let existing = store
        .list_collections()
        .await
        .context("Failed to list collections")?;

    Ok(table
        .collection_names()
        .into_iter()
        .filter(|name| !existing.iter().any(|e| e == name))
        .map(str::to_string)
        .collect())
}

/// Create every missing collection and return the names that were created.
///
/// Running it a second time returns an empty list.
pub async fn ensure_collections(
    store: &dyn DocumentStore,
    table: &CollectionTable,
) -> Result<Vec<String>> {
    let missing = missing_collections(store, table).await?;

    for name in &missing {
        store
            .get_or_create_collection(name)
            .await
            .with_context(|| format!("Failed to create collection '{}'", name))?;
        info!(collection = %name, "created collection");
    }

    Ok(missing)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::bail;
    use async_trait::async_trait;

    use super::*;
    use crate::store::memory::InMemoryStore;
    use crate::store::Collection;

    #[tokio::test]
    async fn second_run_creates_nothing() {
        let store = InMemoryStore::new();
        let table = CollectionTable::default();

        let created = ensure_collections(&store, &table).await.unwrap();
        assert_eq!(
            created,
            vec!["business-and-architecture", "features", "tech-specs", "uisi"]
        );

        let created = ensure_collections(&store, &table).await.unwrap();
        assert!(created.is_empty());
    }

    #[tokio::test]
    async fn only_missing_collections_are_created() {
        let store = InMemoryStore::new();
        store.get_or_create_collection("features").await.unwrap();
        store.get_or_create_collection("unrelated").await.unwrap();

        let table = CollectionTable::default();
        let created = ensure_collections(&store, &table).await.unwrap();
        assert_eq!(
            created,
            vec!["business-and-architecture", "tech-specs", "uisi"]
        );
    }

    struct ReadOnlyStore;

    #[async_trait]
    impl DocumentStore for ReadOnlyStore {
        async fn list_collections(&self) -> Result<Vec<String>> {
            Ok(vec![])
        }
        async fn get_or_create_collection(&self, _name: &str) -> Result<Arc<dyn Collection>> {
            bail!("store is read-only")
        }
        async fn collection(&self, name: &str) -> Result<Arc<dyn Collection>> {
            bail!("no collection {}", name)
        }
    }

    #[tokio::test]
    async fn creation_failure_is_fatal() {
        let err = ensure_collections(&ReadOnlyStore, &CollectionTable::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("business-and-architecture"));
    }
}
