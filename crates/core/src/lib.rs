//! docbranch core library.
//!
//! A branching version store for single text documents: an append-only
//! commit log, named branch pointers with one active branch, a merge engine
//! with a configurable conflict policy, line diffs, and SQLite persistence
//! behind the [`db::StateStore`] trait.

pub mod branch;
pub mod commit_log;
pub mod config;
pub mod conflict;
pub mod db;
pub mod diff;
pub mod errors;
pub mod gc;
pub mod message;
pub mod models;
pub mod repository;

// Re-exports for convenience.
pub use config::AppConfig;
pub use conflict::{ConflictPolicy, MergeOutcome, MergeSession, Resolution};
pub use db::{Database, MemoryStore, StateStore};
pub use errors::{CoreError, StoreError};
pub use models::{Branch, Checkout, Commit, RepoState};
pub use repository::{RepoSettings, Repository};
