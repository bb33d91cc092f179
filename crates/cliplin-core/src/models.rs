//! Core data models that flow through classification and reconciliation.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Result of classifying a path against a [`CollectionTable`](crate::collections::CollectionTable).
///
/// Only the table can produce one, so every [`FileRecord`] is backed by a
/// successful classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    relative_path: String,
    collection: String,
    doc_type: String,
}

impl Classification {
    pub(crate) fn new(relative_path: String, collection: &str, doc_type: &str) -> Self {
        Self {
            relative_path,
            collection: collection.to_string(),
            doc_type: doc_type.to_string(),
        }
    }

    /// Project-relative path with `/` separators. Doubles as the document ID.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }
}

/// A classified file together with its content, ready for reconciliation.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub absolute_path: PathBuf,
    pub classification: Classification,
    pub content: String,
}

impl FileRecord {
    pub fn new(absolute_path: &Path, classification: Classification, content: String) -> Self {
        Self {
            absolute_path: absolute_path.to_path_buf(),
            classification,
            content,
        }
    }

    /// The document identifier in the store.
    pub fn id(&self) -> &str {
        self.classification.relative_path()
    }

    pub fn collection(&self) -> &str {
        self.classification.collection()
    }

    pub fn doc_type(&self) -> &str {
        self.classification.doc_type()
    }
}

/// Metadata written alongside each document's content.
///
/// `content_hash` is only present when the skip-unchanged policy is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub file_path: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub collection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

/// The payload handed to [`Collection::insert`](crate::store::Collection::insert)
/// and [`Collection::update`](crate::store::Collection::update).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedDocument {
    pub id: String,
    pub content: String,
    pub metadata: DocumentMetadata,
}

impl IndexedDocument {
    pub fn from_record(record: &FileRecord, with_hash: bool) -> Self {
        Self {
            id: record.id().to_string(),
            content: record.content.clone(),
            metadata: DocumentMetadata {
                file_path: record.id().to_string(),
                doc_type: record.doc_type().to_string(),
                collection: record.collection().to_string(),
                content_hash: with_hash.then(|| content_hash(&record.content)),
            },
        }
    }
}

/// Per-file result of a reindex pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileOutcome {
    Added,
    Updated,
    Skipped,
    Errored,
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReconcileOutcome::Added => "added",
            ReconcileOutcome::Updated => "updated",
            ReconcileOutcome::Skipped => "skipped",
            ReconcileOutcome::Errored => "errored",
        };
        f.write_str(s)
    }
}

/// Outcome counts for a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReindexSummary {
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl ReindexSummary {
    pub fn record(&mut self, outcome: ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Added => self.added += 1,
            ReconcileOutcome::Updated => self.updated += 1,
            ReconcileOutcome::Skipped => self.skipped += 1,
            ReconcileOutcome::Errored => self.errors += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.added + self.updated + self.skipped + self.errors
    }
}

/// SHA-256 of the document content, hex encoded.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_serializes_three_fields_without_hash() {
        let meta = DocumentMetadata {
            file_path: "docs/features/login.feature".to_string(),
            doc_type: "feature".to_string(),
            collection: "features".to_string(),
            content_hash: None,
        };
        let value = serde_json::to_value(&meta).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert_eq!(obj["type"], "feature");
        assert_eq!(obj["file_path"], "docs/features/login.feature");
    }

    #[test]
    fn summary_counts_each_outcome() {
        let mut summary = ReindexSummary::default();
        summary.record(ReconcileOutcome::Added);
        summary.record(ReconcileOutcome::Updated);
        summary.record(ReconcileOutcome::Updated);
        summary.record(ReconcileOutcome::Errored);
        assert_eq!(summary.added, 1);
        assert_eq!(summary.updated, 2);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.total(), 4);
    }

    #[test]
    fn content_hash_is_stable() {
        assert_eq!(content_hash("abc"), content_hash("abc"));
        assert_ne!(content_hash("abc"), content_hash("abd"));
        assert_eq!(content_hash("").len(), 64);
    }
}
