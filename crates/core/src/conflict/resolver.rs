//! Conflict resolution actions.
//!
//! A [`MergeSession`] holds the conflicts of one in-progress merge together
//! with a resolution slot per conflict. The caller fills the slots with
//! [`Resolution`]s and hands the session back to
//! [`Repository::finish_merge`](crate::repository::Repository::finish_merge).

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::detector::MergeConflict;
use crate::errors::StoreError;

/// Named resolution strategies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "strategy", content = "text")]
pub enum Resolution {
    /// Keep the target branch's content.
    AcceptCurrent,
    /// Take the source branch's content.
    AcceptIncoming,
    /// Target content, a blank line, then source content.
    AcceptBoth,
    /// Caller-supplied text.
    Manual(String),
}

impl Resolution {
    /// Parse a strategy name as used on the command line. `Manual` needs
    /// text and is not parseable here.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "current" | "accept-current" | "accept_current" => Some(Self::AcceptCurrent),
            "incoming" | "accept-incoming" | "accept_incoming" => Some(Self::AcceptIncoming),
            "both" | "accept-both" | "accept_both" => Some(Self::AcceptBoth),
            _ => None,
        }
    }

    /// The text this resolution produces for `conflict`.
    pub fn apply(&self, conflict: &MergeConflict) -> String {
        match self {
            Self::AcceptCurrent => conflict.current.clone(),
            Self::AcceptIncoming => conflict.incoming.clone(),
            Self::AcceptBoth => format!("{}\n\n{}", conflict.current, conflict.incoming),
            Self::Manual(text) => text.clone(),
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AcceptCurrent => write!(f, "accept_current"),
            Self::AcceptIncoming => write!(f, "accept_incoming"),
            Self::AcceptBoth => write!(f, "accept_both"),
            Self::Manual(_) => write!(f, "manual"),
        }
    }
}

/// An in-progress merge that stopped on conflicts. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSession {
    pub source: String,
    pub target: String,
    /// Source head id when the merge was started.
    pub source_head: String,
    /// Target head id when the merge was started.
    pub target_head: String,
    conflicts: Vec<MergeConflict>,
    resolved: Vec<Option<String>>,
}

impl MergeSession {
    pub(crate) fn new(
        source: &str,
        target: &str,
        source_head: &str,
        target_head: &str,
        conflicts: Vec<MergeConflict>,
    ) -> Self {
        let resolved = vec![None; conflicts.len()];
        Self {
            source: source.to_string(),
            target: target.to_string(),
            source_head: source_head.to_string(),
            target_head: target_head.to_string(),
            conflicts,
            resolved,
        }
    }

    pub fn conflicts(&self) -> &[MergeConflict] {
        &self.conflicts
    }

    /// Resolve the conflict with the given id. Resolving again replaces the
    /// earlier choice.
    pub fn resolve(&mut self, conflict_id: &str, resolution: Resolution) -> Result<(), StoreError> {
        let position = self
            .conflicts
            .iter()
            .position(|c| c.id == conflict_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "conflict".into(),
                id: conflict_id.to_string(),
            })?;
        self.resolve_at(position, resolution)
    }

    /// Resolve the conflict at `index`.
    pub fn resolve_at(&mut self, index: usize, resolution: Resolution) -> Result<(), StoreError> {
        let conflict = self.conflicts.get(index).ok_or_else(|| StoreError::NotFound {
            entity: "conflict".into(),
            id: index.to_string(),
        })?;
        let text = resolution.apply(conflict);
        info!(
            conflict_id = %conflict.id,
            section = %conflict.section,
            %resolution,
            "conflict resolved"
        );
        self.resolved[index] = Some(text);
        Ok(())
    }

    /// Resolve every conflict still open with the same strategy.
    pub fn resolve_remaining(&mut self, resolution: &Resolution) {
        for (conflict, slot) in self.conflicts.iter().zip(self.resolved.iter_mut()) {
            if slot.is_none() {
                debug!(conflict_id = %conflict.id, %resolution, "bulk resolving conflict");
                *slot = Some(resolution.apply(conflict));
            }
        }
    }

    /// The first conflict without a resolution.
    pub fn next_unresolved(&self) -> Option<&MergeConflict> {
        self.conflicts
            .iter()
            .zip(&self.resolved)
            .find(|(_, slot)| slot.is_none())
            .map(|(c, _)| c)
    }

    pub fn unresolved(&self) -> usize {
        self.resolved.iter().filter(|s| s.is_none()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.unresolved() == 0
    }

    /// Concatenation of every resolved section, or `ConflictsPending`.
    pub fn resolved_content(&self) -> Result<String, StoreError> {
        let unresolved = self.unresolved();
        if unresolved > 0 {
            return Err(StoreError::ConflictsPending { unresolved });
        }
        Ok(self.resolved.iter().flatten().map(String::as_str).collect())
    }
}
