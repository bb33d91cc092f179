//! File set resolution for `cliplin reindex`.
//!
//! Turns a [`Selection`] into the sorted, deduplicated list of files to
//! reconcile. Directories are walked recursively with `walkdir`; every
//! candidate is re-checked with the collection classifier, so a file that
//! does not classify never reaches the reconciliation engine.
//!
//! | Selection | Source directories | Missing directory |
//! |-----------|--------------------|-------------------|
//! | `File` | — | `FileNotFound` |
//! | `Kind` | every directory of every mapping whose pattern has that extension | skipped |
//! | `Directory` | the given, registered directory | `DirectoryNotFound` |
//! | `All` | every registered directory | skipped |

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use cliplin_core::collections::{CollectionMapping, CollectionTable};

/// Which files a reindex run covers. Exactly one mode per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// One file, relative to the project root or absolute inside it.
    File(PathBuf),
    /// Every file of a kind (`md`, `feature`, `ts4`, `yaml`).
    Kind(String),
    /// Every matching file under one registered directory.
    Directory(PathBuf),
    /// Every classified file in the project.
    All,
}

impl Selection {
    /// Build a selection from the mutually exclusive CLI arguments.
    pub fn from_args(
        file: Option<PathBuf>,
        kind: Option<String>,
        directory: Option<PathBuf>,
    ) -> Result<Self, SelectionError> {
        match (file, kind, directory) {
            (None, None, None) => Ok(Selection::All),
            (Some(f), None, None) => Ok(Selection::File(f)),
            (None, Some(k), None) => Ok(Selection::Kind(k)),
            (None, None, Some(d)) => Ok(Selection::Directory(d)),
            _ => Err(SelectionError::Conflicting),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::File(p) => write!(f, "file {}", p.display()),
            Selection::Kind(k) => write!(f, "type {}", k),
            Selection::Directory(d) => write!(f, "directory {}", d.display()),
            Selection::All => f.write_str("all"),
        }
    }
}

/// Classification and selection failures. All of them abort the run.
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("Only one of FILE, --type and --directory may be given")]
    Conflicting,

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("File is not in a valid context directory: {path}\nValid directories: {valid}")]
    NotIndexable { path: String, valid: String },

    #[error("Unknown file type: {kind}\nValid types: {valid}")]
    UnknownKind { kind: String, valid: String },

    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("Directory is not a valid context directory: {dir}\nValid directories: {valid}")]
    UnregisteredDirectory { dir: String, valid: String },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    pub follow_symlinks: bool,
}

/// Resolve `selection` to absolute file paths under `project_root`.
///
/// `project_root` must be absolute. The result is sorted by path and free
/// of duplicates.
pub fn resolve(
    project_root: &Path,
    table: &CollectionTable,
    selection: &Selection,
    options: ResolveOptions,
) -> Result<Vec<PathBuf>, SelectionError> {
    let mut files = BTreeSet::new();

    match selection {
        Selection::File(path) => {
            let full = if path.is_absolute() {
                path.clone()
            } else {
                project_root.join(path)
            };
            if !full.is_file() {
                return Err(SelectionError::FileNotFound(path.display().to_string()));
            }
            let classification = table.classify(&full, project_root).ok_or_else(|| {
                SelectionError::NotIndexable {
                    path: path.display().to_string(),
                    valid: table.directories().join(", "),
                }
            })?;
            files.insert(project_root.join(classification.relative_path()));
        }
        Selection::Kind(kind) => {
            let pairs = table.pairs_for_kind(kind);
            if pairs.is_empty() {
                return Err(SelectionError::UnknownKind {
                    kind: kind.clone(),
                    valid: table.kinds().join(", "),
                });
            }
            for (dir, mapping) in pairs {
                walk(project_root, Path::new(dir), mapping, table, options, &mut files);
            }
        }
        Selection::Directory(dir) => {
            if !project_root.join(dir).is_dir() {
                return Err(SelectionError::DirectoryNotFound(dir.display().to_string()));
            }
            let mapping = table.mapping_for_directory(dir).ok_or_else(|| {
                SelectionError::UnregisteredDirectory {
                    dir: dir.display().to_string(),
                    valid: table.directories().join(", "),
                }
            })?;
            walk(project_root, dir, mapping, table, options, &mut files);
        }
        Selection::All => {
            for mapping in table.mappings() {
                for dir in mapping.directories() {
                    walk(project_root, Path::new(dir), mapping, table, options, &mut files);
                }
            }
        }
    }

    Ok(files.into_iter().collect())
}

/// Collect files under `project_root/dir` matching `mapping`'s pattern.
/// A missing directory contributes nothing.
fn walk(
    project_root: &Path,
    dir: &Path,
    mapping: &CollectionMapping,
    table: &CollectionTable,
    options: ResolveOptions,
    out: &mut BTreeSet<PathBuf>,
) {
    let base = project_root.join(dir);
    if !base.is_dir() {
        debug!(dir = %dir.display(), "source directory absent, skipping");
        return;
    }

    for entry in WalkDir::new(&base).follow_links(options.follow_symlinks) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %base.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !mapping.matches_file_name(&name) {
            continue;
        }

        if let Some(classification) = table.classify(entry.path(), project_root) {
            out.insert(project_root.join(classification.relative_path()));
        }
    }
}
