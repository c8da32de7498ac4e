//! Persistence for docbranch.
//!
//! The store core reads the whole repository state once at start-up and
//! writes the whole state after every mutation. [`StateStore`] is that
//! contract. [`Database`] implements it on SQLite with WAL-mode journaling
//! and versioned migrations; [`MemoryStore`] implements it in memory for
//! tests and embedding.

pub mod queries;
pub mod schema;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use tracing::{debug, info};

use crate::errors::DatabaseError;
use crate::models::RepoState;

/// Load-on-start / save-on-mutation collaborator.
///
/// `save` replaces the previously saved state atomically from the caller's
/// point of view.
pub trait StateStore {
    /// The last saved state, or `None` if nothing was ever saved.
    fn load(&self) -> Result<Option<RepoState>, DatabaseError>;

    /// Replace the saved state.
    fn save(&self, state: &RepoState) -> Result<(), DatabaseError>;
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

/// Main database handle wrapping a SQLite connection.
///
/// The inner connection is wrapped in a `Mutex` so that `Database` is
/// `Send + Sync`.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path`, creating the parent
    /// directory if needed.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening database");

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;

        debug!("database opened successfully with WAL mode");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (useful for testing).
    pub fn in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run all schema migrations to bring the database up to date.
    pub fn initialize(&self) -> Result<(), DatabaseError> {
        info!("initializing database schema");
        let conn = self.conn();
        schema::run_migrations(&conn)?;
        debug!("database schema is up to date");
        Ok(())
    }

    /// Obtain a lock on the underlying connection.
    ///
    /// If the Mutex is poisoned, the lock is recovered rather than
    /// propagating a panic.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("database mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Execute a closure inside a SQLite transaction. If the closure returns
    /// `Ok`, the transaction is committed; otherwise it is rolled back.
    pub fn transaction<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// A [`StateStore`] that keeps the serialized state in memory.
///
/// States are stored as JSON so a round trip exercises the same encoding as
/// the SQLite store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blob: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes currently saved, for diagnostics.
    pub fn saved_len(&self) -> usize {
        self.blob
            .lock()
            .map(|b| b.as_ref().map_or(0, String::len))
            .unwrap_or(0)
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<RepoState>, DatabaseError> {
        let blob = self.blob.lock().unwrap_or_else(|p| p.into_inner());
        match blob.as_deref() {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, state: &RepoState) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(state)?;
        *self.blob.lock().unwrap_or_else(|p| p.into_inner()) = Some(json);
        Ok(())
    }
}
