//! Project structure validation.
//!
//! Used by `cliplin validate`. Checks that every source directory of the
//! collection table and the store directory exist, that the store database
//! opens, and that every required collection is present. A missing config
//! file is only a warning.

use anyhow::Result;

use cliplin_core::bootstrap::missing_collections;
use cliplin_core::collections::CollectionTable;

use crate::config::{Config, STORE_DIR};
use crate::db;
use crate::sqlite_store::SqliteStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckLevel {
    Ok,
    Warning,
    Error,
}

/// Outcome of one validation check.
#[derive(Debug, Clone)]
pub struct Check {
    /// Check group, e.g. `"directories"` or `"store"`.
    pub group: &'static str,
    pub subject: String,
    pub level: CheckLevel,
    pub notes: Option<String>,
}

impl Check {
    fn new(group: &'static str, subject: String, level: CheckLevel, notes: Option<String>) -> Self {
        Self {
            group,
            subject,
            level,
            notes,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub checks: Vec<Check>,
}

impl ValidationReport {
    pub fn errors(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.level == CheckLevel::Error)
            .count()
    }

    pub fn warnings(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.level == CheckLevel::Warning)
            .count()
    }

    pub fn passed(&self) -> bool {
        self.errors() == 0
    }
}

/// Run every check against the project described by `config`.
pub async fn validate(config: &Config, table: &CollectionTable) -> ValidationReport {
    let mut report = ValidationReport::default();
    let root = &config.project_root;

    for dir in table.directories().into_iter().chain([STORE_DIR]) {
        let level = if root.join(dir).is_dir() {
            CheckLevel::Ok
        } else {
            CheckLevel::Error
        };
        let notes = (level == CheckLevel::Error).then(|| "missing".to_string());
        report
            .checks
            .push(Check::new("directories", format!("{}/", dir), level, notes));
    }

    let store_path = config.store_path();
    let shown = store_path
        .strip_prefix(root)
        .unwrap_or(&store_path)
        .display()
        .to_string();

    if !store_path.exists() {
        report.checks.push(Check::new(
            "store",
            shown,
            CheckLevel::Error,
            Some("store database not found".to_string()),
        ));
    } else {
        match check_collections(config, table).await {
            Ok(missing) => {
                report
                    .checks
                    .push(Check::new("store", shown, CheckLevel::Ok, None));
                for name in table.collection_names() {
                    let present = !missing.iter().any(|m| m == name);
                    report.checks.push(Check::new(
                        "collections",
                        name.to_string(),
                        if present {
                            CheckLevel::Ok
                        } else {
                            CheckLevel::Error
                        },
                        (!present).then(|| "missing".to_string()),
                    ));
                }
            }
            Err(e) => report.checks.push(Check::new(
                "store",
                shown,
                CheckLevel::Error,
                Some(format!("failed to access store: {:#}", e)),
            )),
        }
    }

    let config_file = config
        .source
        .clone()
        .unwrap_or_else(|| config.default_config_path());
    let config_shown = config_file
        .strip_prefix(root)
        .unwrap_or(&config_file)
        .display()
        .to_string();
    if config_file.exists() {
        report
            .checks
            .push(Check::new("config", config_shown, CheckLevel::Ok, None));
    } else {
        report.checks.push(Check::new(
            "config",
            config_shown,
            CheckLevel::Warning,
            Some("not found (optional)".to_string()),
        ));
    }

    report
}

async fn check_collections(config: &Config, table: &CollectionTable) -> Result<Vec<String>> {
    let pool = db::connect(&config.store_path(), false).await?;
    let store = SqliteStore::new(pool);
    let missing = missing_collections(&store, table).await;
    store.close().await;
    missing
}

/// CLI entry point for `cliplin validate`. Returns whether validation passed.
pub async fn run_validate(config: &Config, table: &CollectionTable) -> Result<bool> {
    let report = validate(config, table).await;

    let mut group = "";
    for check in &report.checks {
        if check.group != group {
            group = check.group;
            println!("{}:", group);
        }
        let mark = match check.level {
            CheckLevel::Ok => "✓",
            CheckLevel::Warning => "⚠",
            CheckLevel::Error => "✗",
        };
        match &check.notes {
            Some(notes) => println!("  {} {} ({})", mark, check.subject, notes),
            None => println!("  {} {}", mark, check.subject),
        }
    }

    println!();
    if report.passed() {
        println!(
            "Validation passed: {} warning(s).",
            report.warnings()
        );
    } else {
        println!(
            "Validation failed: {} error(s), {} warning(s).",
            report.errors(),
            report.warnings()
        );
    }

    Ok(report.passed())
}
