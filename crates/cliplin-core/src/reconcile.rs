//! Add-or-update reconciliation of a single file against the store.
//!
//! The document identifier is the file's project-relative path. If the
//! existence check itself fails, the document is treated as new so that a
//! lookup error never blocks insertion; the insert then succeeds or fails on
//! its own.
//!
//! Updates are full replaces of content and metadata. With
//! [`ReconcilePolicy::SkipUnchanged`] a content hash is stored in the
//! metadata and an existing document with the same hash is left alone.

use std::fmt;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::models::{content_hash, Classification, FileRecord, IndexedDocument, ReconcileOutcome};
use crate::store::{Collection, DocumentStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReconcilePolicy {
    /// Always rewrite existing documents.
    #[default]
    AlwaysUpdate,
    /// Compare content hashes and return [`ReconcileOutcome::Skipped`] when
    /// the stored document is identical.
    SkipUnchanged,
}

/// What a dry run reports for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannedAction {
    Add,
    Update,
}

impl PlannedAction {
    pub fn status(&self) -> &'static str {
        match self {
            PlannedAction::Add => "New",
            PlannedAction::Update => "Exists",
        }
    }
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedAction::Add => f.write_str("Add"),
            PlannedAction::Update => f.write_str("Update"),
        }
    }
}

/// Insert or update one document. Never returns [`ReconcileOutcome::Errored`];
/// failures come back as `Err` for the caller to count.
pub async fn reconcile(
    store: &dyn DocumentStore,
    record: &FileRecord,
    policy: ReconcilePolicy,
) -> Result<ReconcileOutcome> {
    let collection = store
        .collection(record.collection())
        .await
        .with_context(|| format!("Failed to open collection '{}'", record.collection()))?;

    let with_hash = policy == ReconcilePolicy::SkipUnchanged;
    let doc = IndexedDocument::from_record(record, with_hash);

    if !exists(collection.as_ref(), record.id()).await {
        collection
            .insert(&doc)
            .await
            .with_context(|| format!("Failed to add {}", record.id()))?;
        debug!(id = record.id(), collection = record.collection(), "added");
        return Ok(ReconcileOutcome::Added);
    }

    if with_hash && is_unchanged(collection.as_ref(), record).await {
        debug!(id = record.id(), "unchanged, skipped");
        return Ok(ReconcileOutcome::Skipped);
    }

    collection
        .update(&doc)
        .await
        .with_context(|| format!("Failed to update {}", record.id()))?;
    debug!(id = record.id(), collection = record.collection(), "updated");
    Ok(ReconcileOutcome::Updated)
}

/// Decide what [`reconcile`] would do for a classified path, without
/// reading the file or writing anything.
pub async fn plan(
    store: &dyn DocumentStore,
    classification: &Classification,
) -> Result<PlannedAction> {
    let collection = store
        .collection(classification.collection())
        .await
        .with_context(|| {
            format!(
                "Failed to open collection '{}'",
                classification.collection()
            )
        })?;

    if exists(collection.as_ref(), classification.relative_path()).await {
        Ok(PlannedAction::Update)
    } else {
        Ok(PlannedAction::Add)
    }
}

async fn exists(collection: &dyn Collection, id: &str) -> bool {
    match collection.exists(id).await {
        Ok(found) => found,
        Err(e) => {
            warn!(id, collection = collection.name(), error = %e, "existence check failed, treating as new");
            false
        }
    }
}

async fn is_unchanged(collection: &dyn Collection, record: &FileRecord) -> bool {
    match collection.get(record.id()).await {
        Ok(Some(stored)) => {
            stored.metadata.content_hash.as_deref() == Some(content_hash(&record.content).as_str())
        }
        Ok(None) => false,
        Err(e) => {
            warn!(id = record.id(), error = %e, "could not read stored document, updating");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use anyhow::bail;
    use async_trait::async_trait;

    use super::*;
    use crate::bootstrap::ensure_collections;
    use crate::collections::CollectionTable;
    use crate::store::memory::InMemoryStore;
    use crate::store::StoredDocument;

    fn record(rel: &str, content: &str) -> FileRecord {
        let table = CollectionTable::default();
        let classification = table.classify_relative(Path::new(rel)).unwrap();
        FileRecord::new(Path::new(rel), classification, content.to_string())
    }

    async fn bootstrapped() -> InMemoryStore {
        let store = InMemoryStore::new();
        ensure_collections(&store, &CollectionTable::default())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn added_then_updated_with_full_replace() {
        let store = bootstrapped().await;
        let first = record("docs/features/login.feature", "Feature: Login");
        assert_eq!(
            reconcile(&store, &first, ReconcilePolicy::AlwaysUpdate)
                .await
                .unwrap(),
            ReconcileOutcome::Added
        );

        let second = record("docs/features/login.feature", "Feature: Login v2");
        assert_eq!(
            reconcile(&store, &second, ReconcilePolicy::AlwaysUpdate)
                .await
                .unwrap(),
            ReconcileOutcome::Updated
        );

        let col = store.collection_handle("features").unwrap();
        let stored = col.get("docs/features/login.feature").await.unwrap().unwrap();
        assert_eq!(stored.content, "Feature: Login v2");
        assert_eq!(stored.metadata.doc_type, "feature");
        assert_eq!(stored.metadata.collection, "features");
        assert_eq!(stored.metadata.file_path, "docs/features/login.feature");
        assert_eq!(stored.metadata.content_hash, None);
        assert_eq!(col.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unchanged_content_is_still_updated_by_default() {
        let store = bootstrapped().await;
        let rec = record("docs/adrs/0001.md", "# ADR");
        reconcile(&store, &rec, ReconcilePolicy::AlwaysUpdate)
            .await
            .unwrap();
        assert_eq!(
            reconcile(&store, &rec, ReconcilePolicy::AlwaysUpdate)
                .await
                .unwrap(),
            ReconcileOutcome::Updated
        );
    }

    #[tokio::test]
    async fn skip_unchanged_policy_compares_hashes() {
        let store = bootstrapped().await;
        let policy = ReconcilePolicy::SkipUnchanged;
        let rec = record("docs/ts4/naming.ts4", "rule: snake_case");

        assert_eq!(
            reconcile(&store, &rec, policy).await.unwrap(),
            ReconcileOutcome::Added
        );
        assert_eq!(
            reconcile(&store, &rec, policy).await.unwrap(),
            ReconcileOutcome::Skipped
        );

        let edited = record("docs/ts4/naming.ts4", "rule: camelCase");
        assert_eq!(
            reconcile(&store, &edited, policy).await.unwrap(),
            ReconcileOutcome::Updated
        );
    }

    #[tokio::test]
    async fn skip_unchanged_updates_documents_stored_without_hash() {
        let store = bootstrapped().await;
        let rec = record("docs/ts4/naming.ts4", "rule");
        reconcile(&store, &rec, ReconcilePolicy::AlwaysUpdate)
            .await
            .unwrap();
        assert_eq!(
            reconcile(&store, &rec, ReconcilePolicy::SkipUnchanged)
                .await
                .unwrap(),
            ReconcileOutcome::Updated
        );
    }

    #[tokio::test]
    async fn missing_collection_is_an_error() {
        let store = InMemoryStore::new();
        let rec = record("docs/features/a.feature", "x");
        assert!(reconcile(&store, &rec, ReconcilePolicy::AlwaysUpdate)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn plan_does_not_write() {
        let store = bootstrapped().await;
        let rec = record("docs/features/a.feature", "x");
        assert_eq!(plan(&store, &rec.classification).await.unwrap(), PlannedAction::Add);
        assert_eq!(plan(&store, &rec.classification).await.unwrap(), PlannedAction::Add);

        reconcile(&store, &rec, ReconcilePolicy::AlwaysUpdate)
            .await
            .unwrap();
        assert_eq!(plan(&store, &rec.classification).await.unwrap(), PlannedAction::Update);
    }

    /// Collection whose existence check always fails.
    struct BlindCollection {
        inner: Arc<dyn Collection>,
    }

    #[async_trait]
    impl Collection for BlindCollection {
        fn name(&self) -> &str {
            self.inner.name()
        }
        async fn exists(&self, _id: &str) -> Result<bool> {
            bail!("lookup unavailable")
        }
        async fn get(&self, id: &str) -> Result<Option<StoredDocument>> {
            self.inner.get(id).await
        }
        async fn insert(&self, doc: &IndexedDocument) -> Result<()> {
            self.inner.insert(doc).await
        }
        async fn update(&self, doc: &IndexedDocument) -> Result<()> {
            self.inner.update(doc).await
        }
        async fn count(&self) -> Result<usize> {
            self.inner.count().await
        }
    }

    struct BlindStore(InMemoryStore);

    #[async_trait]
    impl DocumentStore for BlindStore {
        async fn list_collections(&self) -> Result<Vec<String>> {
            self.0.list_collections().await
        }
        async fn get_or_create_collection(&self, name: &str) -> Result<Arc<dyn Collection>> {
            self.0.get_or_create_collection(name).await
        }
        async fn collection(&self, name: &str) -> Result<Arc<dyn Collection>> {
            let inner = self.0.collection(name).await?;
            let blind: Arc<dyn Collection> = Arc::new(BlindCollection { inner });
            Ok(blind)
        }
    }

    #[tokio::test]
    async fn failed_existence_check_falls_back_to_insert() {
        let store = BlindStore(bootstrapped().await);
        let rec = record("docs/ui-intent/home.yaml", "screen: home");

        assert_eq!(
            reconcile(&store, &rec, ReconcilePolicy::AlwaysUpdate)
                .await
                .unwrap(),
            ReconcileOutcome::Added
        );
        // The second insert collides with the stored document.
        assert!(reconcile(&store, &rec, ReconcilePolicy::AlwaysUpdate)
            .await
            .is_err());
        assert_eq!(plan(&store, &rec.classification).await.unwrap(), PlannedAction::Add);
    }
}
