//! Branch pointers and the active-branch pointer.
//!
//! The [`BranchManager`] owns every [`Branch`] record and refers to commits
//! by id only. It never reads or copies snapshot content; resolving a head
//! id to content is the commit log's job.

use tracing::{info, warn};

use crate::errors::StoreError;
use crate::models::{Branch, MAIN_BRANCH};

/// Named pointers into the commit log plus the single active branch.
#[derive(Debug, Clone)]
pub struct BranchManager {
    branches: Vec<Branch>,
    current: String,
}

impl Default for BranchManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BranchManager {
    /// A manager holding a single empty `main` branch, which is active.
    pub fn new() -> Self {
        Self {
            branches: vec![Branch::new(MAIN_BRANCH, None)],
            current: MAIN_BRANCH.to_string(),
        }
    }

    /// Rebuild from persisted records.
    ///
    /// Restores the invariants if the stored data violates them: a missing
    /// `main` is recreated empty, `main` is always marked protected, duplicate
    /// names keep their first record, and an unknown active branch falls back
    /// to `main`.
    pub fn from_parts(branches: Vec<Branch>, current: String) -> Self {
        let mut deduped: Vec<Branch> = Vec::with_capacity(branches.len());
        for mut branch in branches {
            if deduped.iter().any(|b| b.name == branch.name) {
                warn!(branch = %branch.name, "dropping duplicate branch record");
                continue;
            }
            branch.is_protected = branch.name == MAIN_BRANCH;
            deduped.push(branch);
        }

        if !deduped.iter().any(|b| b.name == MAIN_BRANCH) {
            warn!("stored state has no main branch, recreating it");
            deduped.insert(0, Branch::new(MAIN_BRANCH, None));
        }

        let current = if deduped.iter().any(|b| b.name == current) {
            current
        } else {
            warn!(branch = %current, "stored active branch does not exist, using main");
            MAIN_BRANCH.to_string()
        };

        Self {
            branches: deduped,
            current,
        }
    }

    /// Name of the active branch.
    pub fn current(&self) -> &str {
        &self.current
    }

    /// All branches in creation order.
    pub fn list(&self) -> &[Branch] {
        &self.branches
    }

    pub fn get(&self, name: &str) -> Option<&Branch> {
        self.branches.iter().find(|b| b.name == name)
    }

    /// Resolve a branch or fail with `NotFound`.
    pub fn require(&self, name: &str) -> Result<&Branch, StoreError> {
        self.get(name)
            .ok_or_else(|| StoreError::branch_not_found(name))
    }

    /// Fork `name` from `from` (the active branch when `None`).
    ///
    /// The new branch starts at the source's head; no commit is created.
    pub fn create(&mut self, name: &str, from: Option<&str>) -> Result<&Branch, StoreError> {
        if self.get(name).is_some() {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }
        let source_name = from.unwrap_or(&self.current).to_string();
        let head = self.require(&source_name)?.head_commit_id.clone();

        info!(branch = name, from = %source_name, "branch created");
        self.branches.push(Branch::new(name, head));
        Ok(&self.branches[self.branches.len() - 1])
    }

    /// Remove a branch. `main` and the active branch are protected.
    pub fn delete(&mut self, name: &str) -> Result<Branch, StoreError> {
        if name == MAIN_BRANCH {
            return Err(StoreError::Protected {
                name: name.to_string(),
                reason: "the main branch cannot be deleted".into(),
            });
        }
        if name == self.current {
            return Err(StoreError::Protected {
                name: name.to_string(),
                reason: "the active branch cannot be deleted".into(),
            });
        }
        let position = self
            .branches
            .iter()
            .position(|b| b.name == name)
            .ok_or_else(|| StoreError::branch_not_found(name))?;

        info!(branch = name, "branch deleted");
        Ok(self.branches.remove(position))
    }

    /// Move the active-branch pointer.
    pub fn switch(&mut self, name: &str) -> Result<&Branch, StoreError> {
        let position = self
            .branches
            .iter()
            .position(|b| b.name == name)
            .ok_or_else(|| StoreError::branch_not_found(name))?;
        if self.current != name {
            info!(from = %self.current, to = name, "switched branch");
            self.current = name.to_string();
        }
        Ok(&self.branches[position])
    }

    /// Advance a branch head. Only the repository calls this, right after
    /// appending the commit.
    pub(crate) fn set_head(&mut self, name: &str, commit_id: &str) -> Result<(), StoreError> {
        let branch = self
            .branches
            .iter_mut()
            .find(|b| b.name == name)
            .ok_or_else(|| StoreError::branch_not_found(name))?;
        branch.head_commit_id = Some(commit_id.to_string());
        Ok(())
    }

    /// Every head id currently pointed to.
    pub fn heads(&self) -> impl Iterator<Item = &str> {
        self.branches
            .iter()
            .filter_map(|b| b.head_commit_id.as_deref())
    }
}
