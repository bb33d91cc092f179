//! Project initialization (`cliplin init`).
//!
//! Creates the source directories of the collection table, the store
//! database and schema, and the required collections. Running it on an
//! initialized project changes nothing.

use anyhow::{Context, Result};

use cliplin_core::bootstrap::ensure_collections;
use cliplin_core::collections::CollectionTable;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_store::SqliteStore;

#[derive(Debug, Clone, Default)]
pub struct InitReport {
    pub directories_created: Vec<String>,
    pub collections_created: Vec<String>,
}

pub async fn init_project(config: &Config, table: &CollectionTable) -> Result<InitReport> {
    let mut report = InitReport::default();

    for dir in table.directories() {
        let path = config.project_root.join(dir);
        if !path.is_dir() {
            std::fs::create_dir_all(&path)
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
            report.directories_created.push(dir.to_string());
        }
    }

    let pool = db::connect(&config.store_path(), true).await?;
    migrate::run_migrations(&pool).await?;
    let store = SqliteStore::new(pool);
    let created = ensure_collections(&store, table).await;
    store.close().await;
    report.collections_created = created?;

    Ok(report)
}

/// CLI entry point for `cliplin init`.
pub async fn run_init(config: &Config, table: &CollectionTable) -> Result<()> {
    let report = init_project(config, table).await?;

    for dir in &report.directories_created {
        println!("  ✓ Created directory {}/", dir);
    }
    for name in &report.collections_created {
        println!("  ✓ Collection '{}' initialized", name);
    }
    println!("Store initialized at {}", config.store_path().display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use tempfile::TempDir;

    #[tokio::test]
    async fn init_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let cfg = load_config(tmp.path(), None).unwrap();
        let table = CollectionTable::default();

        let first = init_project(&cfg, &table).await.unwrap();
        assert_eq!(first.directories_created.len(), 5);
        assert_eq!(first.collections_created.len(), 4);
        assert!(cfg.store_path().exists());

        let second = init_project(&cfg, &table).await.unwrap();
        assert!(second.directories_created.is_empty());
        assert!(second.collections_created.is_empty());
    }
}
