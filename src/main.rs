//! # Cliplin CLI (`cliplin`)
//!
//! Indexes a project's context documents into the local document store.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cliplin init` | Create source directories, the store, and its collections |
//! | `cliplin reindex` | Add or update documents in the store |
//! | `cliplin validate` | Check project structure and store health |
//!
//! ## Examples
//!
//! ```bash
//! cliplin init
//! cliplin reindex                              # every context file
//! cliplin reindex docs/features/login.feature  # one file
//! cliplin reindex --type md                    # ADRs and business docs
//! cliplin reindex --directory docs/ts4 --dry-run
//! cliplin validate
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use cliplin::collections::CollectionTable;
use cliplin::config;
use cliplin::init;
use cliplin::progress::ProgressMode;
use cliplin::reindex::{self, ReindexArgs};
use cliplin::resolve::Selection;
use cliplin::validate;

/// Cliplin — keep project context documents indexed in a local document store.
#[derive(Parser)]
#[command(name = "cliplin", version)]
struct Cli {
    /// Project root. Source directories and the store are resolved against it.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Path to a TOML configuration file.
    ///
    /// Defaults to `<root>/.cliplin/config.toml` when that file exists.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the store and source directories.
    ///
    /// Creates missing source directories, the store database, and the
    /// required collections. Running it again is safe.
    Init,

    /// Reindex context files into the store.
    ///
    /// With no selection every classified file in the project is reindexed.
    /// New documents are added; existing ones are replaced.
    Reindex {
        /// A single file to reindex (relative to the project root).
        #[arg(conflicts_with_all = ["kind", "directory"])]
        file: Option<PathBuf>,

        /// Reindex every file of one type (md, feature, ts4, yaml).
        #[arg(long = "type", value_name = "TYPE", conflicts_with = "directory")]
        kind: Option<String>,

        /// Reindex every file under one registered directory.
        #[arg(long)]
        directory: Option<PathBuf>,

        /// Show what would be added or updated without writing.
        #[arg(long)]
        dry_run: bool,

        /// Print one line per file and enable debug logging.
        #[arg(long)]
        verbose: bool,

        /// List the files and ask for confirmation before reindexing.
        #[arg(long)]
        interactive: bool,

        /// Leave documents whose content hash is unchanged untouched.
        #[arg(long)]
        skip_unchanged: bool,

        /// Progress output on stderr. Defaults to `human` on a TTY, `off` otherwise.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Validate project structure and store health.
    ///
    /// Exits with status 1 when any check fails.
    Validate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config(&cli.root, cli.config.as_deref())?;

    let verbose = matches!(cli.command, Commands::Reindex { verbose: true, .. });
    let filter = if verbose {
        EnvFilter::new("warn,cliplin=debug,cliplin_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log.level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let table = CollectionTable::default();

    match cli.command {
        Commands::Init => {
            init::run_init(&cfg, &table).await?;
        }
        Commands::Reindex {
            file,
            kind,
            directory,
            dry_run,
            verbose,
            interactive,
            skip_unchanged,
            progress,
        } => {
            let selection = Selection::from_args(file, kind, directory)?;
            reindex::run_reindex(
                &cfg,
                &table,
                ReindexArgs {
                    selection,
                    dry_run,
                    verbose,
                    interactive,
                    skip_unchanged,
                    progress,
                },
            )
            .await?;
        }
        Commands::Validate => {
            if !validate::run_validate(&cfg, &table).await? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
