//! The typed operation surface over one repository state.
//!
//! A [`Repository`] is a plain value: the commit log, the branch pointers
//! and the active-branch pointer all live inside it, and every operation is
//! a synchronous state transition on `&mut self`. There is no global or
//! shared state, so several repositories can coexist in one process.
//!
//! Every fallible operation validates completely before it mutates. On
//! `Err` the repository is exactly as it was before the call.
//!
//! The repository assumes a single writer. Persisting after each mutation
//! is the caller's job via [`Repository::persist`].

use tracing::{info, warn};

use crate::branch::BranchManager;
use crate::commit_log::CommitLog;
use crate::conflict::{
    merge_message, ConflictPolicy, MergeEngine, MergeOutcome, MergePlan, MergeSession,
    ResolverAuthor,
};
use crate::db::StateStore;
use crate::diff::{calculate_similarity, generate_diff, Hunk};
use crate::errors::{DatabaseError, StoreError};
use crate::gc::{self, GcResult};
use crate::message::{format_commit_message, MAX_MESSAGE_LEN};
use crate::models::{Branch, Checkout, Commit, RepoState, SYSTEM_AUTHOR};

/// Behavioural knobs, normally taken from [`crate::config::AppConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepoSettings {
    pub policy: ConflictPolicy,
    pub resolver_author: ResolverAuthor,
    pub max_message_len: usize,
}

impl Default for RepoSettings {
    fn default() -> Self {
        Self {
            policy: ConflictPolicy::default(),
            resolver_author: ResolverAuthor::default(),
            max_message_len: MAX_MESSAGE_LEN,
        }
    }
}

/// Message recorded on rollback commits.
pub fn rollback_message(commit_id: &str) -> String {
    format!("Reverted to version {commit_id}")
}

/// Branches, commits and the active-branch pointer.
#[derive(Debug, Clone)]
pub struct Repository {
    branches: BranchManager,
    log: CommitLog,
    engine: MergeEngine,
    max_message_len: usize,
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository {
    /// An empty repository: one empty `main` branch, active.
    pub fn new() -> Self {
        Self::with_settings(RepoSettings::default())
    }

    pub fn with_settings(settings: RepoSettings) -> Self {
        Self::from_state(RepoState::initial(), settings)
    }

    /// Rebuild a repository from a previously saved state.
    ///
    /// `settings.max_message_len` is clamped to `1..=MAX_MESSAGE_LEN`.
    pub fn from_state(state: RepoState, settings: RepoSettings) -> Self {
        let max_message_len = settings.max_message_len.clamp(1, MAX_MESSAGE_LEN);
        if max_message_len != settings.max_message_len {
            warn!(
                requested = settings.max_message_len,
                using = max_message_len,
                "max_message_len out of range, clamping"
            );
        }
        let branches = BranchManager::from_parts(state.branches, state.current_branch);
        let log = CommitLog::from_commits(state.commits);
        for branch in branches.list() {
            if let Some(head) = branch.head_commit_id.as_deref() {
                if !log.contains(head) {
                    warn!(branch = %branch.name, head, "branch head is not in the commit log");
                }
            }
        }
        Self {
            branches,
            log,
            engine: MergeEngine {
                policy: settings.policy,
                resolver_author: settings.resolver_author,
            },
            max_message_len,
        }
    }

    /// Load-on-start: the last saved state, or a fresh repository.
    pub fn open(store: &dyn StateStore, settings: RepoSettings) -> Result<Self, DatabaseError> {
        match store.load()? {
            Some(state) => {
                info!(
                    branches = state.branches.len(),
                    commits = state.commits.len(),
                    "loaded repository state"
                );
                Ok(Self::from_state(state, settings))
            }
            None => {
                info!("no saved state, starting with an empty main branch");
                Ok(Self::with_settings(settings))
            }
        }
    }

    /// Save-on-mutation: hand the whole state to the store.
    pub fn persist(&self, store: &dyn StateStore) -> Result<(), DatabaseError> {
        store.save(&self.to_state())
    }

    /// Snapshot of the read model.
    pub fn to_state(&self) -> RepoState {
        RepoState {
            branches: self.branches.list().to_vec(),
            commits: self.log.commits().to_vec(),
            current_branch: self.branches.current().to_string(),
        }
    }

    pub fn settings(&self) -> RepoSettings {
        RepoSettings {
            policy: self.engine.policy,
            resolver_author: self.engine.resolver_author,
            max_message_len: self.max_message_len,
        }
    }

    // -- read model ---------------------------------------------------------

    pub fn current_branch(&self) -> &str {
        self.branches.current()
    }

    pub fn list_branches(&self) -> &[Branch] {
        self.branches.list()
    }

    pub fn branch(&self, name: &str) -> Option<&Branch> {
        self.branches.get(name)
    }

    /// The full log in append order.
    pub fn commits(&self) -> &[Commit] {
        self.log.commits()
    }

    pub fn get_commit(&self, id: &str) -> Option<&Commit> {
        self.log.get(id)
    }

    // -- branch lifecycle ---------------------------------------------------

    /// Fork `name` from `from`, or from the active branch when `None`.
    pub fn create_branch(
        &mut self,
        name: &str,
        from: Option<&str>,
    ) -> Result<&Branch, StoreError> {
        self.branches.create(name, from)
    }

    /// Delete a branch. Its commits stay in the log.
    pub fn delete_branch(&mut self, name: &str) -> Result<Branch, StoreError> {
        self.branches.delete(name)
    }

    /// Make `name` the active branch and return its head content.
    pub fn switch_branch(&mut self, name: &str) -> Result<Checkout, StoreError> {
        let checkout = self.head_content(name)?;
        self.branches.switch(name)?;
        Ok(checkout)
    }

    /// Head content of `name` without moving the active pointer.
    pub fn head_content(&self, name: &str) -> Result<Checkout, StoreError> {
        let branch = self.branches.require(name)?;
        match branch.head_commit_id.as_deref() {
            None => Ok(Checkout::Empty),
            Some(id) => {
                let commit = self
                    .log
                    .get(id)
                    .ok_or_else(|| StoreError::commit_not_found(id))?;
                Ok(Checkout::Content(commit.content.clone()))
            }
        }
    }

    // -- commit log ---------------------------------------------------------

    /// Commit `content` on the active branch and return the new commit id.
    ///
    /// The parent is the active branch's current head, which may have been
    /// inherited from the branch it was forked from.
    pub fn commit(
        &mut self,
        content: &str,
        message: &str,
        author: &str,
    ) -> Result<String, StoreError> {
        let message = format_commit_message(message, self.max_message_len)?;
        let branch = self.branches.current().to_string();
        let id = self.append_on(&branch, content, &message, author)?;
        info!(branch = %branch, id = %id, author, "committed");
        Ok(id)
    }

    /// Commits authored while `branch` was active, newest first.
    ///
    /// Unknown branches yield an empty list. Inherited ancestor commits are
    /// not included; see [`Repository::lineage`].
    pub fn get_history(&self, branch: &str) -> Vec<&Commit> {
        self.log.history(branch)
    }

    /// The full ancestor chain of `branch`'s head, newest first.
    pub fn lineage(&self, branch: &str) -> Result<Vec<&Commit>, StoreError> {
        let head = self.branches.require(branch)?.head_commit_id.as_deref();
        Ok(self.log.lineage(head))
    }

    /// Restore an old snapshot by committing a copy of it on its own branch.
    ///
    /// Returns the restored content. History only grows.
    pub fn rollback(&mut self, commit_id: &str) -> Result<String, StoreError> {
        let (branch, content) = {
            let commit = self
                .log
                .get(commit_id)
                .ok_or_else(|| StoreError::commit_not_found(commit_id))?;
            (commit.branch.clone(), commit.content.clone())
        };
        let message = rollback_message(commit_id);
        let id = self.append_on(&branch, &content, &message, SYSTEM_AUTHOR)?;
        info!(branch = %branch, restored = commit_id, id = %id, "rolled back");
        Ok(content)
    }

    // -- merge --------------------------------------------------------------

    /// Merge `source`'s head into `target`.
    ///
    /// On a clean merge a commit carrying the source content is appended to
    /// `target`. On conflict nothing changes and the returned session must be
    /// resolved and passed to [`Repository::finish_merge`].
    pub fn merge(&mut self, source: &str, target: &str) -> Result<MergeOutcome, StoreError> {
        match self.engine.plan(&self.branches, &self.log, source, target)? {
            MergePlan::Clean { content } => {
                let message = merge_message(source, target);
                let id = self.append_on(target, &content, &message, SYSTEM_AUTHOR)?;
                info!(source, target, id = %id, "merged");
                Ok(MergeOutcome::Merged { commit_id: id })
            }
            MergePlan::Conflicted(session) => {
                info!(
                    source,
                    target,
                    conflicts = session.conflicts().len(),
                    "merge stopped on conflicts"
                );
                Ok(MergeOutcome::Conflicted(session))
            }
        }
    }

    /// Commit the resolved content of a conflicted merge onto its target.
    ///
    /// Fails with `ConflictsPending` while any conflict is open, and with
    /// `NotFound` if either branch has since been deleted. `resolved_by` is
    /// recorded as author only under [`ResolverAuthor::Resolver`].
    pub fn finish_merge(
        &mut self,
        session: &MergeSession,
        resolved_by: &str,
    ) -> Result<String, StoreError> {
        let content = session.resolved_content()?;
        self.branches.require(&session.source)?;
        let target_head = self
            .branches
            .require(&session.target)?
            .head_commit_id
            .as_deref();
        if target_head != Some(session.target_head.as_str()) {
            warn!(
                target = %session.target,
                expected = %session.target_head,
                "target head moved while conflicts were being resolved"
            );
        }

        let author = match self.engine.resolver_author {
            ResolverAuthor::System => SYSTEM_AUTHOR,
            ResolverAuthor::Resolver => resolved_by,
        };
        let message = merge_message(&session.source, &session.target);
        let id = self.append_on(&session.target, &content, &message, author)?;
        info!(
            source = %session.source,
            target = %session.target,
            id = %id,
            resolved_by,
            "merge completed after resolution"
        );
        Ok(id)
    }

    // -- diff helpers -------------------------------------------------------

    /// Display hunks between two stored snapshots.
    pub fn diff_commits(&self, old_id: &str, new_id: &str) -> Result<Vec<Hunk>, StoreError> {
        let (old, new) = self.content_pair(old_id, new_id)?;
        Ok(generate_diff(old, new))
    }

    /// Similarity percentage between two stored snapshots.
    pub fn similarity(&self, a_id: &str, b_id: &str) -> Result<u8, StoreError> {
        let (a, b) = self.content_pair(a_id, b_id)?;
        Ok(calculate_similarity(a, b))
    }

    // -- compaction ---------------------------------------------------------

    /// Drop commits unreachable from every branch head. Opt-in only.
    pub fn compact(&mut self) -> GcResult {
        gc::collect_garbage(&self.branches, &mut self.log)
    }

    /// Report what [`Repository::compact`] would remove.
    pub fn compact_dry_run(&self) -> GcResult {
        gc::dry_run(&self.branches, &self.log)
    }

    // -- internals ----------------------------------------------------------

    fn content_pair(&self, a_id: &str, b_id: &str) -> Result<(&str, &str), StoreError> {
        let a = self
            .log
            .get(a_id)
            .ok_or_else(|| StoreError::commit_not_found(a_id))?;
        let b = self
            .log
            .get(b_id)
            .ok_or_else(|| StoreError::commit_not_found(b_id))?;
        Ok((&a.content, &b.content))
    }

    /// Append a commit on `branch` with the branch head as parent and move
    /// the head. The branch is resolved before anything is written.
    fn append_on(
        &mut self,
        branch: &str,
        content: &str,
        message: &str,
        author: &str,
    ) -> Result<String, StoreError> {
        let parent = self.branches.require(branch)?.head_commit_id.clone();
        let id = self
            .log
            .append(branch, content, message, author, parent)
            .id
            .clone();
        self.branches.set_head(branch, &id)?;
        Ok(id)
    }
}
