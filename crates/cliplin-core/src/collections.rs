//! Collection table and path classifier.
//!
//! A [`CollectionTable`] is an immutable, ordered list of
//! [`CollectionMapping`]s. Each mapping owns a set of project-relative
//! source directories and a file-name glob; a file belongs to the mapping
//! whose directory contains it **and** whose glob matches its file name.
//!
//! Directory containment is tested per path segment, so
//! `docs/featuresExtra/a.feature` is not inside `docs/features`.
//!
//! # Default table
//!
//! | Collection | Directories | Pattern | Type |
//! |------------|-------------|---------|------|
//! | `business-and-architecture` | `docs/adrs`, `docs/business` | `*.md` | `adr` |
//! | `features` | `docs/features` | `*.feature` | `feature` |
//! | `tech-specs` | `docs/ts4` | `*.ts4` | `ts4` |
//! | `uisi` | `docs/ui-intent` | `*.yaml` | `ui-intent` |
//!
//! # Example
//!
//! ```rust
//! use cliplin_core::collections::CollectionTable;
//! use std::path::Path;
//!
//! let table = CollectionTable::default();
//! let hit = table.classify_relative(Path::new("docs/ts4/naming.ts4")).unwrap();
//! assert_eq!(hit.collection(), "tech-specs");
//! assert!(table.classify_relative(Path::new("docs/ts4/naming.md")).is_none());
//! ```

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobMatcher};
use thiserror::Error;

use crate::models::Classification;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("collection table has no mappings")]
    Empty,

    #[error("collection '{0}' is defined more than once")]
    DuplicateName(String),

    #[error("invalid file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("invalid source directory '{0}': must be a non-empty relative path")]
    InvalidDirectory(String),

    #[error("source directory '{first}' overlaps '{second}' of another collection")]
    OverlappingDirectories { first: String, second: String },
}

/// One collection: its name, source directories, file pattern, and type tag.
#[derive(Debug, Clone)]
pub struct CollectionMapping {
    name: String,
    directories: Vec<String>,
    pattern: String,
    doc_type: String,
    matcher: GlobMatcher,
}

impl CollectionMapping {
    pub fn new(
        name: &str,
        directories: &[&str],
        pattern: &str,
        doc_type: &str,
    ) -> Result<Self, TableError> {
        let matcher = Glob::new(pattern)
            .map_err(|source| TableError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?
            .compile_matcher();

        let mut dirs = Vec::with_capacity(directories.len());
        for dir in directories {
            let normalized = normalize_relative(Path::new(dir))
                .filter(|p| p.components().next().is_some())
                .ok_or_else(|| TableError::InvalidDirectory(dir.to_string()))?;
            dirs.push(path_to_id(&normalized));
        }

        Ok(Self {
            name: name.to_string(),
            directories: dirs,
            pattern: pattern.to_string(),
            doc_type: doc_type.to_string(),
            matcher,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directories(&self) -> &[String] {
        &self.directories
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    /// The selection kind for `--type`: the extension of the file pattern
    /// (`*.md` → `md`).
    pub fn kind(&self) -> Option<&str> {
        Path::new(&self.pattern).extension().and_then(|e| e.to_str())
    }

    /// Whether a file name matches this mapping's glob.
    pub fn matches_file_name(&self, file_name: &str) -> bool {
        self.matcher.is_match(file_name)
    }

    fn directory_containing(&self, relative: &Path) -> Option<&str> {
        self.directories
            .iter()
            .find(|dir| relative.starts_with(dir.as_str()) && relative != Path::new(dir.as_str()))
            .map(String::as_str)
    }
}

/// Ordered, validated set of collection mappings.
///
/// No directory of one mapping may equal or nest inside a directory of
/// another mapping, so at most one mapping can match any given path.
#[derive(Debug, Clone)]
pub struct CollectionTable {
    mappings: Vec<CollectionMapping>,
}

impl CollectionTable {
    pub fn new(mappings: Vec<CollectionMapping>) -> Result<Self, TableError> {
        if mappings.is_empty() {
            return Err(TableError::Empty);
        }

        let mut names = HashSet::new();
        for m in &mappings {
            if !names.insert(m.name.as_str()) {
                return Err(TableError::DuplicateName(m.name.clone()));
            }
        }

        for (i, a) in mappings.iter().enumerate() {
            for b in mappings.iter().skip(i + 1) {
                for da in &a.directories {
                    for db in &b.directories {
                        let (pa, pb) = (Path::new(da), Path::new(db));
                        if pa.starts_with(pb) || pb.starts_with(pa) {
                            return Err(TableError::OverlappingDirectories {
                                first: da.clone(),
                                second: db.clone(),
                            });
                        }
                    }
                }
            }
        }

        Ok(Self { mappings })
    }

    pub fn mappings(&self) -> &[CollectionMapping] {
        &self.mappings
    }

    /// Names of every collection the store must contain, in table order.
    pub fn collection_names(&self) -> Vec<&str> {
        self.mappings.iter().map(|m| m.name()).collect()
    }

    /// Every registered source directory, in table order.
    pub fn directories(&self) -> Vec<&str> {
        self.mappings
            .iter()
            .flat_map(|m| m.directories.iter().map(String::as_str))
            .collect()
    }

    /// Distinct selection kinds, in table order.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = Vec::new();
        for kind in self.mappings.iter().filter_map(|m| m.kind()) {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        kinds
    }

    /// All `(directory, mapping)` pairs that a `--type <kind>` selection
    /// enumerates. Empty for an unknown kind.
    pub fn pairs_for_kind(&self, kind: &str) -> Vec<(&str, &CollectionMapping)> {
        self.mappings
            .iter()
            .filter(|m| m.kind() == Some(kind))
            .flat_map(|m| m.directories.iter().map(move |d| (d.as_str(), m)))
            .collect()
    }

    /// The mapping that registers exactly this directory.
    pub fn mapping_for_directory(&self, directory: &Path) -> Option<&CollectionMapping> {
        let normalized = normalize_relative(directory)?;
        self.mappings
            .iter()
            .find(|m| m.directories.iter().any(|d| Path::new(d) == normalized))
    }

    /// Classify `path` (absolute, or relative to `project_root`).
    ///
    /// Returns `None` for paths outside the project root and for paths no
    /// mapping claims.
    pub fn classify(&self, path: &Path, project_root: &Path) -> Option<Classification> {
        let relative = if path.is_absolute() {
            path.strip_prefix(project_root).ok()?
        } else {
            path
        };
        self.classify_relative(relative)
    }

    pub fn classify_relative(&self, relative: &Path) -> Option<Classification> {
        let relative = normalize_relative(relative)?;
        let file_name = relative.file_name()?.to_str()?;

        self.mappings.iter().find_map(|m| {
            m.directory_containing(&relative)?;
            if !m.matches_file_name(file_name) {
                return None;
            }
            Some(Classification::new(
                path_to_id(&relative),
                m.name(),
                m.doc_type(),
            ))
        })
    }
}

impl Default for CollectionTable {
    fn default() -> Self {
        let mappings = [
            (
                "business-and-architecture",
                &["docs/adrs", "docs/business"][..],
                "*.md",
                "adr",
            ),
            ("features", &["docs/features"][..], "*.feature", "feature"),
            ("tech-specs", &["docs/ts4"][..], "*.ts4", "ts4"),
            ("uisi", &["docs/ui-intent"][..], "*.yaml", "ui-intent"),
        ]
        .into_iter()
        .map(|(name, dirs, pattern, ty)| CollectionMapping::new(name, dirs, pattern, ty))
        .collect::<Result<Vec<_>, _>>()
        .and_then(CollectionTable::new);

        mappings.expect("built-in collection table is valid")
    }
}

/// Resolve `.` and `..` segments lexically. Absolute paths and paths that
/// climb above their starting point are rejected.
fn normalize_relative(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(seg) => out.push(seg),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}

/// Join path segments with `/` regardless of platform.
fn path_to_id(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
