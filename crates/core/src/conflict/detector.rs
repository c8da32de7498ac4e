//! Conflict detection logic.
//!
//! Given the head snapshots of a merge's source and target branches, the
//! detector decides whether they can be combined automatically or must be
//! surfaced as a conflict. The decision is a configurable policy, see
//! [`ConflictPolicy`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// Line-count difference above which the default policy reports a conflict.
pub const DEFAULT_LINE_DELTA_THRESHOLD: usize = 5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How a pair of differing snapshots is classified.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "policy")]
pub enum ConflictPolicy {
    /// Conflict only when the line counts differ by more than `threshold`.
    /// Below that the source wins silently, so two different single-line
    /// documents always merge without a conflict.
    LineDelta { threshold: usize },
    /// Any byte-level difference is a conflict.
    Strict,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        Self::LineDelta {
            threshold: DEFAULT_LINE_DELTA_THRESHOLD,
        }
    }
}

impl std::fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LineDelta { threshold } => write!(f, "line_delta({threshold})"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

/// Which part of the document a conflict covers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSection {
    /// The whole document body.
    Middle,
}

impl std::fmt::Display for ConflictSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Middle => write!(f, "middle"),
        }
    }
}

/// A pair of diverging text bodies awaiting a resolution choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MergeConflict {
    /// Unique conflict ID.
    pub id: String,
    pub section: ConflictSection,
    /// The merge target's content for this section.
    pub current: String,
    /// The merge source's content for this section.
    pub incoming: String,
}

impl MergeConflict {
    /// Create a new conflict with a fresh UUID.
    pub fn new(section: ConflictSection, current: &str, incoming: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            section,
            current: current.to_string(),
            incoming: incoming.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

/// Stateless conflict detector.
pub struct ConflictDetector;

impl ConflictDetector {
    /// Classify `source` against `target` under `policy`.
    ///
    /// Byte-identical inputs never conflict. Otherwise the result holds at
    /// most one whole-document conflict.
    pub fn detect(source: &str, target: &str, policy: ConflictPolicy) -> Vec<MergeConflict> {
        if source == target {
            debug!("source == target, nothing to reconcile");
            return Vec::new();
        }

        let conflicted = match policy {
            ConflictPolicy::Strict => true,
            ConflictPolicy::LineDelta { threshold } => {
                let delta = source.lines().count().abs_diff(target.lines().count());
                debug!(delta, threshold, "line count delta");
                delta > threshold
            }
        };

        let conflicts = if conflicted {
            vec![MergeConflict::new(ConflictSection::Middle, target, source)]
        } else {
            Vec::new()
        };

        info!(%policy, count = conflicts.len(), "conflict detection complete");
        conflicts
    }
}

/// Convenience wrapper over [`ConflictDetector::detect`].
pub fn detect_conflicts(source: &str, target: &str, policy: ConflictPolicy) -> Vec<MergeConflict> {
    ConflictDetector::detect(source, target, policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> String {
        (1..=n).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_identical_never_conflicts() {
        let text = numbered(10);
        assert!(detect_conflicts(&text, &text, ConflictPolicy::default()).is_empty());
        assert!(detect_conflicts(&text, &text, ConflictPolicy::Strict).is_empty());
    }

    #[test]
    fn test_small_delta_auto_merges() {
        // Semantically different single-line documents are not flagged.
        let conflicts = detect_conflicts("Hello World", "Hello", ConflictPolicy::default());
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_delta_at_threshold_auto_merges() {
        let conflicts = detect_conflicts(&numbered(15), &numbered(10), ConflictPolicy::default());
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_large_delta_conflicts() {
        let target = numbered(10);
        let source = numbered(18);
        let conflicts = detect_conflicts(&source, &target, ConflictPolicy::default());
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].section, ConflictSection::Middle);
        assert_eq!(conflicts[0].current, target);
        assert_eq!(conflicts[0].incoming, source);
    }

    #[test]
    fn test_delta_is_symmetric() {
        let conflicts = detect_conflicts(&numbered(2), &numbered(9), ConflictPolicy::default());
        assert_eq!(conflicts.len(), 1);
    }

    #[test]
    fn test_custom_threshold() {
        let policy = ConflictPolicy::LineDelta { threshold: 0 };
        assert_eq!(detect_conflicts("a\nb", "a", policy).len(), 1);
        assert!(detect_conflicts("a", "b", policy).is_empty());
    }

    #[test]
    fn test_strict_flags_any_difference() {
        let conflicts = detect_conflicts("Hello World", "Hello", ConflictPolicy::Strict);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].current, "Hello");
        assert_eq!(conflicts[0].incoming, "Hello World");
    }

    #[test]
    fn test_section_display() {
        assert_eq!(ConflictSection::Middle.to_string(), "middle");
        assert_eq!(ConflictPolicy::default().to_string(), "line_delta(5)");
    }
}
