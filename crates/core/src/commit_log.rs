//! Append-only commit log.
//!
//! The log exclusively owns every [`Commit`]. Commits are never mutated or
//! removed by normal operation; the only way to shrink the log is the
//! explicit compaction pass in [`crate::gc`].

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::models::Commit;

/// Append-only collection of immutable snapshots, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct CommitLog {
    commits: Vec<Commit>,
    index: HashMap<String, usize>,
}

impl CommitLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from previously persisted commits (append order).
    pub fn from_commits(commits: Vec<Commit>) -> Self {
        let index = commits
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        Self { commits, index }
    }

    /// Append a new snapshot and return it.
    ///
    /// The caller is responsible for validating the message and advancing
    /// the branch head.
    pub fn append(
        &mut self,
        branch: &str,
        content: &str,
        message: &str,
        author: &str,
        parent_id: Option<String>,
    ) -> &Commit {
        let commit = Commit {
            id: Uuid::new_v4().to_string(),
            branch: branch.to_string(),
            content: content.to_string(),
            message: message.to_string(),
            author: author.to_string(),
            created_at: self.next_timestamp(),
            parent_id,
        };
        debug!(
            id = %commit.id,
            branch,
            parent = commit.parent_id.as_deref().unwrap_or("-"),
            "appending commit"
        );

        let position = self.commits.len();
        self.index.insert(commit.id.clone(), position);
        self.commits.push(commit);
        &self.commits[position]
    }

    /// Look up a commit by id.
    pub fn get(&self, id: &str) -> Option<&Commit> {
        self.index.get(id).map(|&i| &self.commits[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Commits whose `branch` tag equals `branch`, newest first.
    ///
    /// This is the per-branch view: commits inherited from a fork ancestor
    /// are not included. See [`CommitLog::lineage`] for the full chain.
    pub fn history(&self, branch: &str) -> Vec<&Commit> {
        let mut commits: Vec<(usize, &Commit)> = self
            .commits
            .iter()
            .enumerate()
            .filter(|(_, c)| c.branch == branch)
            .collect();
        commits.sort_by(|(ia, a), (ib, b)| b.created_at.cmp(&a.created_at).then(ib.cmp(ia)));
        commits.into_iter().map(|(_, c)| c).collect()
    }

    /// Walk `parent_id` links from `head`, newest first.
    ///
    /// Stops at the first commit without a parent, at a parent that is no
    /// longer in the log (compacted), or on a repeated id.
    pub fn lineage(&self, head: Option<&str>) -> Vec<&Commit> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = head;
        while let Some(id) = cursor {
            if !seen.insert(id) {
                break;
            }
            let Some(commit) = self.get(id) else {
                break;
            };
            chain.push(commit);
            cursor = commit.parent_id.as_deref();
        }
        chain
    }

    /// All commits in append order.
    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Keep only the commits whose id is in `keep`. Returns how many were
    /// dropped. Used by compaction only.
    pub(crate) fn retain_ids(&mut self, keep: &HashSet<String>) -> usize {
        let before = self.commits.len();
        self.commits.retain(|c| keep.contains(&c.id));
        self.index = self
            .commits
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        before - self.commits.len()
    }

    pub fn into_commits(self) -> Vec<Commit> {
        self.commits
    }

    /// A timestamp strictly after every existing commit.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.commits.iter().map(|c| c.created_at).max() {
            Some(latest) if now <= latest => latest + Duration::microseconds(1),
            _ => now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_get() {
        let mut log = CommitLog::new();
        let id = log.append("main", "hello", "Init", "alice", None).id.clone();
        let commit = log.get(&id).unwrap();
        assert_eq!(commit.content, "hello");
        assert_eq!(commit.branch, "main");
        assert_eq!(commit.author, "alice");
        assert!(commit.parent_id.is_none());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut log = CommitLog::new();
        let a = log.append("main", "x", "A", "u", None).id.clone();
        let b = log.append("main", "x", "B", "u", Some(a.clone())).id.clone();
        assert_ne!(a, b);
    }

    #[test]
    fn test_timestamps_strictly_increase() {
        let mut log = CommitLog::new();
        for i in 0..50 {
            log.append("main", &i.to_string(), "M", "u", None);
        }
        let stamps: Vec<_> = log.commits().iter().map(|c| c.created_at).collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_history_filters_by_branch_newest_first() {
        let mut log = CommitLog::new();
        let first = log.append("main", "1", "One", "u", None).id.clone();
        log.append("feature", "f", "Feature", "u", Some(first.clone()));
        let second = log.append("main", "2", "Two", "u", Some(first.clone())).id.clone();

        let history = log.history("main");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, second);
        assert_eq!(history[1].id, first);

        assert_eq!(log.history("feature").len(), 1);
        assert!(log.history("nope").is_empty());
    }

    #[test]
    fn test_lineage_crosses_branches() {
        let mut log = CommitLog::new();
        let root = log.append("main", "1", "One", "u", None).id.clone();
        let feat = log.append("feature", "2", "Two", "u", Some(root.clone())).id.clone();

        let chain: Vec<&str> = log.lineage(Some(&feat)).iter().map(|c| c.id.as_str()).collect();
        assert_eq!(chain, vec![feat.as_str(), root.as_str()]);
        assert!(log.lineage(None).is_empty());
    }

    #[test]
    fn test_from_commits_rebuilds_index() {
        let mut log = CommitLog::new();
        let id = log.append("main", "x", "X", "u", None).id.clone();
        let rebuilt = CommitLog::from_commits(log.into_commits());
        assert!(rebuilt.contains(&id));
    }

    #[test]
    fn test_retain_ids() {
        let mut log = CommitLog::new();
        let keep = log.append("main", "a", "A", "u", None).id.clone();
        let drop = log.append("gone", "b", "B", "u", None).id.clone();

        let removed = log.retain_ids(&HashSet::from([keep.clone()]));
        assert_eq!(removed, 1);
        assert!(log.contains(&keep));
        assert!(!log.contains(&drop));
        assert!(log.get(&keep).is_some());
    }
}
