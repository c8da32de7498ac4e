//! Branch merge engine.
//!
//! The engine owns no persistent state. It borrows both head snapshots from
//! the commit log for the duration of one merge, asks the detector to
//! classify them, and returns a [`MergePlan`] that the repository applies.
//! Nothing is written until the plan is clean or every conflict is resolved.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::detector::{ConflictDetector, ConflictPolicy};
use super::resolver::MergeSession;
use crate::branch::BranchManager;
use crate::commit_log::CommitLog;
use crate::errors::StoreError;

/// Who is recorded as the author of a merge commit that completed after
/// manual conflict resolution.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResolverAuthor {
    /// Always the system author.
    #[default]
    System,
    /// The user who resolved the conflicts.
    Resolver,
}

/// What a merge decided, before anything is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergePlan {
    /// The heads can be combined; commit `content` on the target.
    Clean { content: String },
    /// The caller must resolve the session's conflicts first.
    Conflicted(MergeSession),
}

/// Result of [`Repository::merge`](crate::repository::Repository::merge).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// A merge commit was appended to the target branch.
    Merged { commit_id: String },
    /// Conflicts were found; no state was changed.
    Conflicted(MergeSession),
}

impl MergeOutcome {
    pub fn is_merged(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }
}

/// Commit message used for every merge commit.
pub fn merge_message(source: &str, target: &str) -> String {
    format!("Merge {source} into {target}")
}

/// Stateless merge planner configured with a conflict policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeEngine {
    pub policy: ConflictPolicy,
    pub resolver_author: ResolverAuthor,
}

impl MergeEngine {
    pub fn new(policy: ConflictPolicy) -> Self {
        Self {
            policy,
            resolver_author: ResolverAuthor::default(),
        }
    }

    /// Decide how `source` merges into `target`.
    ///
    /// Fails with `NotFound` if either branch is missing and with
    /// `NothingToMerge` if either has no commits.
    pub fn plan(
        &self,
        branches: &BranchManager,
        log: &CommitLog,
        source: &str,
        target: &str,
    ) -> Result<MergePlan, StoreError> {
        info!(source, target, policy = %self.policy, "planning merge");

        let source_branch = branches.require(source)?;
        let target_branch = branches.require(target)?;

        let source_head = source_branch
            .head_commit_id
            .as_deref()
            .ok_or_else(|| StoreError::NothingToMerge(source.to_string()))?;
        let target_head = target_branch
            .head_commit_id
            .as_deref()
            .ok_or_else(|| StoreError::NothingToMerge(target.to_string()))?;

        let source_content = &log
            .get(source_head)
            .ok_or_else(|| StoreError::commit_not_found(source_head))?
            .content;
        let target_content = &log
            .get(target_head)
            .ok_or_else(|| StoreError::commit_not_found(target_head))?
            .content;

        let conflicts = ConflictDetector::detect(source_content, target_content, self.policy);
        if conflicts.is_empty() {
            debug!(source, target, "clean merge, source content wins");
            return Ok(MergePlan::Clean {
                content: source_content.clone(),
            });
        }

        debug!(source, target, count = conflicts.len(), "merge needs resolution");
        Ok(MergePlan::Conflicted(MergeSession::new(
            source,
            target,
            source_head,
            target_head,
            conflicts,
        )))
    }
}
