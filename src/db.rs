//! SQLite connection management for the document store.
//!
//! WAL journal mode is enabled on every connection. `cliplin init` is the
//! only command allowed to create the database file; every other command
//! expects it to exist already.

use anyhow::{bail, Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;

/// Open a connection pool to the store database at `db_path`.
///
/// With `create` set, parent directories and the database file are created
/// when missing. Without it, a missing file is a setup error.
pub async fn connect(db_path: &Path, create: bool) -> Result<SqlitePool> {
    if create {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create store directory: {}", parent.display())
            })?;
        }
    } else if !db_path.exists() {
        bail!(
            "Store is not initialized at {}. Run 'cliplin init' first.",
            db_path.display()
        );
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(create)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open store: {}", db_path.display()))?;

    Ok(pool)
}
