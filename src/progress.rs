//! Reindex progress reporting.
//!
//! Progress goes to **stderr** so stdout (dry-run tables, summaries) stays
//! parseable for scripts.

use std::io::Write;

use clap::ValueEnum;

/// A single progress event for a reindex run.
#[derive(Clone, Debug)]
pub enum ReindexProgressEvent {
    /// Resolving the selection to a file set. Total unknown.
    Scanning { selection: String },
    /// `n` of `total` files reconciled; `path` is the one just finished.
    Reconciling { n: u64, total: u64, path: String },
}

/// Reports reindex progress. Implementations write to stderr (human or JSON).
pub trait ReindexProgressReporter: Send + Sync {
    fn report(&self, event: ReindexProgressEvent);
}

/// Human-friendly progress on stderr: "reindex  12 / 340 files  docs/adrs/0001.md".
pub struct StderrProgress;

impl ReindexProgressReporter for StderrProgress {
    fn report(&self, event: ReindexProgressEvent) {
        let line = match &event {
            ReindexProgressEvent::Scanning { selection } => {
                format!("reindex {}  scanning...\n", selection)
            }
            ReindexProgressEvent::Reconciling { n, total, path } => format!(
                "reindex  {} / {} files  {}\n",
                format_number(*n),
                format_number(*total),
                path
            ),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ReindexProgressReporter for JsonProgress {
    fn report(&self, event: ReindexProgressEvent) {
        let obj = match &event {
            ReindexProgressEvent::Scanning { selection } => serde_json::json!({
                "event": "progress",
                "phase": "scanning",
                "selection": selection
            }),
            ReindexProgressEvent::Reconciling { n, total, path } => serde_json::json!({
                "event": "progress",
                "phase": "reconciling",
                "n": n,
                "total": total,
                "path": path
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ReindexProgressReporter for NoProgress {
    fn report(&self, _event: ReindexProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ReindexProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
