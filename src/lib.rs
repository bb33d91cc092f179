//! # Cliplin
//!
//! Keeps a project's context documents (architecture decision records,
//! business docs, feature files, TS4 technical specs, UI-intent YAML)
//! indexed in a local document store.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌─────────────┐   ┌──────────────┐   ┌──────────┐
//! │ bootstrap  │──▶│  resolve    │──▶│  classify +  │──▶│  SQLite  │
//! │ collections│   │  file set   │   │  reconcile   │   │  store   │
//! └────────────┘   └─────────────┘   └──────────────┘   └──────────┘
//! ```
//!
//! The pure logic (collection table, store trait, bootstrap, reconciliation)
//! lives in `cliplin-core`; this crate adds filesystem enumeration, the
//! SQLite store, configuration, and the `cliplin` CLI.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Optional TOML configuration |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Store schema (idempotent) |
//! | [`sqlite_store`] | SQLite `DocumentStore` implementation |
//! | [`resolve`] | Selection modes → sorted file set |
//! | [`reindex`] | Reindex pipeline and `cliplin reindex` |
//! | [`init`] | `cliplin init` |
//! | [`validate`] | `cliplin validate` |
//! | [`progress`] | Progress reporting on stderr |

pub mod config;
pub mod db;
pub mod init;
pub mod migrate;
pub mod progress;
pub mod reindex;
pub mod resolve;
pub mod sqlite_store;
pub mod validate;

pub use cliplin_core::{bootstrap, collections, models, reconcile, store};
