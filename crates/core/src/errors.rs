//! Error types for the docbranch core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

/// Errors from branch, commit and merge operations.
///
/// Every operation that returns one of these leaves the repository state
/// exactly as it was before the call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A branch or commit id does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A branch with this name already exists.
    #[error("branch already exists: {0}")]
    AlreadyExists(String),

    /// The branch is `main` or the active branch and cannot be deleted.
    #[error("branch '{name}' is protected: {reason}")]
    Protected { name: String, reason: String },

    /// The commit message is empty, whitespace-only or too long.
    #[error("invalid commit message: {0}")]
    InvalidMessage(String),

    /// One side of a merge has no commits.
    #[error("nothing to merge: branch '{0}' has no commits")]
    NothingToMerge(String),

    /// Merge completion was requested with unresolved conflicts.
    #[error("{unresolved} conflict(s) still unresolved")]
    ConflictsPending { unresolved: usize },
}

impl StoreError {
    pub(crate) fn branch_not_found(name: &str) -> Self {
        Self::NotFound {
            entity: "branch".into(),
            id: name.to_string(),
        }
    }

    pub(crate) fn commit_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "commit".into(),
            id: id.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Database errors
// ---------------------------------------------------------------------------

/// Errors from the SQLite persistence layer.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Underlying rusqlite error.
    #[error("database error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// A migration failed.
    #[error("database migration failed (version {version}): {detail}")]
    MigrationFailed { version: u32, detail: String },

    /// The stored state blob could not be encoded or decoded.
    #[error("stored state is not valid: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic I/O error (e.g. creating the data directory).
    #[error("database I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
