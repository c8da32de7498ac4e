//! Typed query helpers for the docbranch database.

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection};
use tracing::debug;

use super::{Database, StateStore};
use crate::errors::DatabaseError;
use crate::models::{Commit, RepoState};

/// `kv_state` key under which the serialized repository state lives.
pub const REPO_STATE_KEY: &str = "repo_state";

/// A row from the `commit_index` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitIndexEntry {
    pub id: String,
    pub branch: String,
    pub parent_id: Option<String>,
    pub author: String,
    pub message: String,
    pub created_at: String,
}

impl Database {
    // -- kv_state -----------------------------------------------------------

    /// Get a key-value state entry.
    pub fn get_state(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let conn = self.conn();
        get_state_on(&conn, key)
    }

    /// Set a key-value state entry (upsert).
    pub fn set_state(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        let conn = self.conn();
        set_state_on(&conn, key, value)
    }

    // -- commit_index -------------------------------------------------------

    /// Indexed commits on `branch`, newest first.
    pub fn list_commit_index(
        &self,
        branch: &str,
        limit: u32,
    ) -> Result<Vec<CommitIndexEntry>, DatabaseError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, branch, parent_id, author, message, created_at
             FROM commit_index WHERE branch = ?1
             ORDER BY created_at DESC LIMIT ?2",
        )?;
        let entries = stmt
            .query_map(params![branch, limit], |row| {
                Ok(CommitIndexEntry {
                    id: row.get(0)?,
                    branch: row.get(1)?,
                    parent_id: row.get(2)?,
                    author: row.get(3)?,
                    message: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Total number of indexed commits.
    pub fn count_indexed_commits(&self) -> Result<i64, DatabaseError> {
        let conn = self.conn();
        let count = conn.query_row("SELECT COUNT(*) FROM commit_index", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl StateStore for Database {
    fn load(&self) -> Result<Option<RepoState>, DatabaseError> {
        match self.get_state(REPO_STATE_KEY)? {
            Some(json) => {
                let state: RepoState = serde_json::from_str(&json)?;
                debug!(
                    branches = state.branches.len(),
                    commits = state.commits.len(),
                    "loaded repo_state"
                );
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    fn save(&self, state: &RepoState) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(state)?;
        self.transaction(|conn| {
            set_state_on(conn, REPO_STATE_KEY, &json)?;
            refresh_commit_index(conn, &state.commits)?;
            Ok(())
        })?;
        debug!(bytes = json.len(), commits = state.commits.len(), "saved repo_state");
        Ok(())
    }
}

fn get_state_on(conn: &Connection, key: &str) -> Result<Option<String>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT value FROM kv_state WHERE key = ?1")?;
    let mut rows = stmt.query_map(params![key], |row| row.get::<_, String>(0))?;
    match rows.next() {
        Some(Ok(val)) => Ok(Some(val)),
        Some(Err(e)) => Err(e.into()),
        None => Ok(None),
    }
}

fn set_state_on(conn: &Connection, key: &str, value: &str) -> Result<(), DatabaseError> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO kv_state (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, now],
    )?;
    debug!(key, "set kv_state");
    Ok(())
}

/// Rewrite the lookup index to match `commits` exactly. Timestamps are
/// fixed-width so `created_at` sorts lexically.
fn refresh_commit_index(conn: &Connection, commits: &[Commit]) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM commit_index", [])?;
    let mut stmt = conn.prepare(
        "INSERT INTO commit_index (id, branch, parent_id, author, message, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for commit in commits {
        stmt.execute(params![
            commit.id,
            commit.branch,
            commit.parent_id,
            commit.author,
            commit.message,
            commit.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
        ])?;
    }
    Ok(())
}
