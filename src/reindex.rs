//! Reindex pipeline orchestration.
//!
//! Coordinates a full run: collection bootstrap → file set resolution →
//! per-file classification, read, and reconciliation → summary.
//!
//! Setup and selection errors abort the run before any file is touched.
//! Per-file errors (unreadable file, store write failure) are logged,
//! recorded as [`ReconcileOutcome::Errored`], and processing continues with
//! the next file. Files are reconciled strictly one after another.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, warn};

use cliplin_core::bootstrap::{ensure_collections, missing_collections};
use cliplin_core::collections::CollectionTable;
use cliplin_core::models::{FileRecord, ReconcileOutcome, ReindexSummary};
use cliplin_core::reconcile::{plan, reconcile, PlannedAction, ReconcilePolicy};
use cliplin_core::store::DocumentStore;

use crate::config::Config;
use crate::db;
use crate::progress::{ProgressMode, ReindexProgressEvent, ReindexProgressReporter};
use crate::resolve::{resolve, ResolveOptions, Selection};
use crate::sqlite_store::SqliteStore;

/// How many files `--interactive` lists before asking.
const CONFIRM_PREVIEW: usize = 10;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReindexOptions {
    /// Report what would happen without writing to the store.
    pub dry_run: bool,
    pub policy: ReconcilePolicy,
    pub follow_symlinks: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileResult {
    Reconciled(ReconcileOutcome),
    Planned(PlannedAction),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    /// Project-relative path with `/` separators.
    pub relative_path: String,
    pub result: FileResult,
}

#[derive(Debug, Clone, Default)]
pub struct ReindexReport {
    pub collections_created: Vec<String>,
    pub files: Vec<FileReport>,
    pub summary: ReindexSummary,
}

/// Collections created during bootstrap and the resolved file set.
#[derive(Debug, Clone, Default)]
pub struct Prepared {
    pub collections_created: Vec<String>,
    pub files: Vec<PathBuf>,
}

/// Bootstrap collections (skipped on dry runs) and resolve the selection.
pub async fn prepare(
    store: &dyn DocumentStore,
    table: &CollectionTable,
    project_root: &Path,
    selection: &Selection,
    options: &ReindexOptions,
    progress: &dyn ReindexProgressReporter,
) -> Result<Prepared> {
    let collections_created = if options.dry_run {
        Vec::new()
    } else {
        ensure_collections(store, table).await?
    };

    progress.report(ReindexProgressEvent::Scanning {
        selection: selection.to_string(),
    });
    let files = resolve(
        project_root,
        table,
        selection,
        ResolveOptions {
            follow_symlinks: options.follow_symlinks,
        },
    )?;
    debug!(count = files.len(), %selection, "resolved file set");

    Ok(Prepared {
        collections_created,
        files,
    })
}

/// Reconcile (or, on dry runs, plan) each file in order.
///
/// Only a failure to list collections on a dry run is returned as `Err`;
/// everything that goes wrong for a single file ends up in its
/// [`FileReport`].
pub async fn reindex_files(
    store: &dyn DocumentStore,
    table: &CollectionTable,
    project_root: &Path,
    files: &[PathBuf],
    options: &ReindexOptions,
    progress: &dyn ReindexProgressReporter,
) -> Result<ReindexReport> {
    let absent = if options.dry_run {
        missing_collections(store, table).await?
    } else {
        Vec::new()
    };

    let mut report = ReindexReport::default();
    let total = files.len() as u64;

    for (i, path) in files.iter().enumerate() {
        let relative_path = relative_id(path, project_root);

        let result = if options.dry_run {
            match plan_file(store, table, project_root, path, &absent).await {
                Ok(action) => FileResult::Planned(action),
                Err(e) => FileResult::Failed(format!("{:#}", e)),
            }
        } else {
            match reconcile_file(store, table, project_root, path, options.policy).await {
                Ok(outcome) => FileResult::Reconciled(outcome),
                Err(e) => FileResult::Failed(format!("{:#}", e)),
            }
        };

        match &result {
            FileResult::Reconciled(outcome) => report.summary.record(*outcome),
            FileResult::Planned(_) => {}
            FileResult::Failed(error) => {
                warn!(path = %relative_path, %error, "failed to reindex file");
                report.summary.record(ReconcileOutcome::Errored);
            }
        }

        progress.report(ReindexProgressEvent::Reconciling {
            n: i as u64 + 1,
            total,
            path: relative_path.clone(),
        });

        report.files.push(FileReport {
            path: path.clone(),
            relative_path,
            result,
        });
    }

    Ok(report)
}

/// Full run: [`prepare`] followed by [`reindex_files`].
pub async fn reindex(
    store: &dyn DocumentStore,
    table: &CollectionTable,
    project_root: &Path,
    selection: &Selection,
    options: &ReindexOptions,
    progress: &dyn ReindexProgressReporter,
) -> Result<ReindexReport> {
    let prepared = prepare(store, table, project_root, selection, options, progress).await?;
    let mut report = reindex_files(
        store,
        table,
        project_root,
        &prepared.files,
        options,
        progress,
    )
    .await?;
    report.collections_created = prepared.collections_created;
    Ok(report)
}

async fn reconcile_file(
    store: &dyn DocumentStore,
    table: &CollectionTable,
    project_root: &Path,
    path: &Path,
    policy: ReconcilePolicy,
) -> Result<ReconcileOutcome> {
    let classification = table
        .classify(path, project_root)
        .ok_or_else(|| anyhow!("Cannot determine collection for {}", path.display()))?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let record = FileRecord::new(path, classification, content);
    reconcile(store, &record, policy).await
}

async fn plan_file(
    store: &dyn DocumentStore,
    table: &CollectionTable,
    project_root: &Path,
    path: &Path,
    absent: &[String],
) -> Result<PlannedAction> {
    let classification = table
        .classify(path, project_root)
        .ok_or_else(|| anyhow!("Cannot determine collection for {}", path.display()))?;
    if absent.iter().any(|c| c == classification.collection()) {
        return Ok(PlannedAction::Add);
    }
    plan(store, &classification).await
}

fn relative_id(path: &Path, project_root: &Path) -> String {
    path.strip_prefix(project_root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

// ─── CLI command ────────────────────────────────────────────────────

/// Flags of `cliplin reindex`.
#[derive(Debug, Clone)]
pub struct ReindexArgs {
    pub selection: Selection,
    pub dry_run: bool,
    pub verbose: bool,
    pub interactive: bool,
    pub skip_unchanged: bool,
    pub progress: Option<ProgressMode>,
}

/// Run `cliplin reindex` against the project's SQLite store and print the
/// report.
pub async fn run_reindex(config: &Config, table: &CollectionTable, args: ReindexArgs) -> Result<()> {
    let pool = db::connect(&config.store_path(), false).await?;
    let store = SqliteStore::new(pool);

    let options = ReindexOptions {
        dry_run: args.dry_run,
        policy: if args.skip_unchanged || config.reindex.skip_unchanged {
            ReconcilePolicy::SkipUnchanged
        } else {
            ReconcilePolicy::AlwaysUpdate
        },
        follow_symlinks: config.reindex.follow_symlinks,
    };
    let progress = args
        .progress
        .unwrap_or_else(ProgressMode::default_for_tty)
        .reporter();
    let root = &config.project_root;

    let prepared = prepare(
        &store,
        table,
        root,
        &args.selection,
        &options,
        progress.as_ref(),
    )
    .await?;

    if !prepared.collections_created.is_empty() {
        println!("Creating missing collections...");
        for name in &prepared.collections_created {
            println!("  ✓ Created collection '{}'", name);
        }
    }

    if prepared.files.is_empty() {
        println!("No files found to reindex.");
        store.close().await;
        return Ok(());
    }

    if args.interactive && !args.dry_run && !confirm(root, &prepared.files)? {
        println!("Aborted.");
        store.close().await;
        return Ok(());
    }

    let report = reindex_files(
        &store,
        table,
        root,
        &prepared.files,
        &options,
        progress.as_ref(),
    )
    .await?;
    store.close().await;

    if args.dry_run {
        print_dry_run(&report);
    } else {
        if args.verbose {
            print_file_lines(&report);
        }
        print_summary(&args.selection, &report.summary);
    }

    Ok(())
}

fn confirm(project_root: &Path, files: &[PathBuf]) -> Result<bool> {
    println!("Files to reindex: {}", files.len());
    for path in files.iter().take(CONFIRM_PREVIEW) {
        println!("  • {}", relative_id(path, project_root));
    }
    if files.len() > CONFIRM_PREVIEW {
        println!("  ... and {} more", files.len() - CONFIRM_PREVIEW);
    }
    print!("Reindex these files? [y/N] ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_dry_run(report: &ReindexReport) {
    let width = report
        .files
        .iter()
        .map(|f| f.relative_path.len())
        .max()
        .unwrap_or(0)
        .max(4);

    println!("reindex (dry-run)");
    println!("{:<width$}  {:<8} ACTION", "PATH", "STATUS", width = width);
    for file in &report.files {
        let (status, action) = match &file.result {
            FileResult::Planned(a) => (a.status(), a.to_string()),
            FileResult::Failed(_) => ("Invalid", "Skip".to_string()),
            FileResult::Reconciled(o) => ("Done", o.to_string()),
        };
        println!(
            "{:<width$}  {:<8} {}",
            file.relative_path,
            status,
            action,
            width = width
        );
    }
}

fn print_file_lines(report: &ReindexReport) {
    for file in &report.files {
        match &file.result {
            FileResult::Reconciled(ReconcileOutcome::Added) => {
                println!("  + Added {}", file.relative_path)
            }
            FileResult::Reconciled(ReconcileOutcome::Updated) => {
                println!("  ↻ Updated {}", file.relative_path)
            }
            FileResult::Reconciled(ReconcileOutcome::Skipped) => {
                println!("  = Unchanged {}", file.relative_path)
            }
            FileResult::Failed(e) => {
                println!("  ✗ Error processing {}: {}", file.relative_path, e)
            }
            FileResult::Reconciled(ReconcileOutcome::Errored) | FileResult::Planned(_) => {}
        }
    }
}

fn print_summary(selection: &Selection, summary: &ReindexSummary) {
    println!("reindex {}", selection);
    println!("  added: {}", summary.added);
    println!("  updated: {}", summary.updated);
    println!("  skipped: {}", summary.skipped);
    if summary.errors > 0 {
        println!("  errors: {}", summary.errors);
        println!("completed with {} error(s)", summary.errors);
    } else {
        println!("ok");
    }
}
