//! Opt-in compaction of the commit log.
//!
//! Normal operation never removes commits, so commits authored on deleted
//! branches stay in the log forever. This module provides an explicit
//! mark-sweep pass that drops every commit not reachable from some branch
//! head through `parent_id` links. Nothing calls it implicitly.

use std::collections::HashSet;

use tracing::info;

use crate::branch::BranchManager;
use crate::commit_log::CommitLog;

/// Statistics from a compaction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcResult {
    /// Commits reachable from a branch head.
    pub retained: usize,
    /// Commits removed (or that would be removed, for a dry run).
    pub removed: usize,
}

impl GcResult {
    pub fn did_remove(&self) -> bool {
        self.removed > 0
    }
}

/// Remove every commit unreachable from a branch head.
pub fn collect_garbage(branches: &BranchManager, log: &mut CommitLog) -> GcResult {
    let reachable = mark(branches, log);
    let removed = log.retain_ids(&reachable);
    info!(retained = reachable.len(), removed, "commit log compacted");
    GcResult {
        retained: reachable.len(),
        removed,
    }
}

/// Compute what [`collect_garbage`] would remove without removing it.
pub fn dry_run(branches: &BranchManager, log: &CommitLog) -> GcResult {
    let reachable = mark(branches, log);
    GcResult {
        retained: reachable.len(),
        removed: log.len() - reachable.len(),
    }
}

/// Ids reachable from any branch head.
fn mark(branches: &BranchManager, log: &CommitLog) -> HashSet<String> {
    let mut reachable = HashSet::new();
    for head in branches.heads() {
        for commit in log.lineage(Some(head)) {
            if !reachable.insert(commit.id.clone()) {
                break;
            }
        }
    }
    reachable
}
