//! # Cliplin Core
//!
//! Pure indexing logic for Cliplin: the collection table and path
//! classifier, the document store abstraction, collection bootstrap, and
//! the add-or-update reconciliation engine.
//!
//! This crate performs no filesystem I/O and depends on no async runtime.
//! File enumeration, file reads, and the persistent SQLite store live in
//! the `cliplin` crate.
//!
//! ## Flow
//!
//! ```text
//! ensure_collections ─▶ resolve files ─▶ classify ─▶ reconcile ─▶ summary
//!   (bootstrap)          (cliplin)      (collections)  (reconcile)
//! ```

pub mod bootstrap;
pub mod collections;
pub mod models;
pub mod reconcile;
pub mod store;
