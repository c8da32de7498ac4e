//! Domain model types used throughout docbranch.
//!
//! These types bridge the in-memory store, the persistence layer and the
//! CLI. Field names serialize in camelCase so a saved state blob reads the
//! same as the read model exposed to UI collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the protected default branch.
pub const MAIN_BRANCH: &str = "main";

/// Author recorded on commits the store manufactures itself.
pub const SYSTEM_AUTHOR: &str = "System";

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// An immutable, timestamped text snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub id: String,
    /// Branch that was active when the commit was created.
    pub branch: String,
    pub content: String,
    pub message: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    /// Commit this one was created from; `None` for the first commit of a lineage.
    pub parent_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Branch
// ---------------------------------------------------------------------------

/// A named, mutable pointer into the commit log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub name: String,
    /// Most recent commit reachable on this branch, or `None` before the
    /// first commit.
    pub head_commit_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_protected: bool,
}

impl Branch {
    /// Create a branch pointing at `head`. Only `main` is protected.
    pub fn new(name: impl Into<String>, head: Option<String>) -> Self {
        let name = name.into();
        let is_protected = name == MAIN_BRANCH;
        Self {
            name,
            head_commit_id: head,
            created_at: Utc::now(),
            is_protected,
        }
    }

    /// Whether the branch has a head commit yet.
    pub fn has_commits(&self) -> bool {
        self.head_commit_id.is_some()
    }
}

// ---------------------------------------------------------------------------
// Read model / persisted state
// ---------------------------------------------------------------------------

/// Whole repository state: the read model handed to UI collaborators and
/// the blob handed to the persistence collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepoState {
    pub branches: Vec<Branch>,
    /// The full commit log in append order.
    pub commits: Vec<Commit>,
    pub current_branch: String,
}

impl RepoState {
    /// A single empty, protected `main` branch that is also active.
    pub fn initial() -> Self {
        Self {
            branches: vec![Branch::new(MAIN_BRANCH, None)],
            commits: Vec::new(),
            current_branch: MAIN_BRANCH.to_string(),
        }
    }
}

impl Default for RepoState {
    fn default() -> Self {
        Self::initial()
    }
}

// ---------------------------------------------------------------------------
// Switch result
// ---------------------------------------------------------------------------

/// Result of switching to a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checkout {
    /// The branch head's content.
    Content(String),
    /// The branch has no commits yet.
    Empty,
}

impl Checkout {
    /// The checked-out content, if any.
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Content(c) => Some(c),
            Self::Empty => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = RepoState::initial();
        assert_eq!(state.current_branch, MAIN_BRANCH);
        assert_eq!(state.branches.len(), 1);
        assert!(state.branches[0].is_protected);
        assert!(!state.branches[0].has_commits());
        assert!(state.commits.is_empty());
    }

    #[test]
    fn test_only_main_is_protected() {
        assert!(Branch::new("main", None).is_protected);
        assert!(!Branch::new("feature", None).is_protected);
        assert!(!Branch::new("Main", None).is_protected);
    }

    #[test]
    fn test_state_serializes_camel_case() {
        let json = serde_json::to_string(&RepoState::initial()).unwrap();
        assert!(json.contains("\"currentBranch\":\"main\""));
        assert!(json.contains("\"headCommitId\":null"));
        assert!(json.contains("\"isProtected\":true"));
    }

    #[test]
    fn test_checkout_content() {
        assert_eq!(Checkout::Content("x".into()).content(), Some("x"));
        assert_eq!(Checkout::Empty.content(), None);
    }
}
