//! Conflict detection, merge planning, and resolution.
//!
//! The conflict subsystem is responsible for:
//! 1. **Detection** -- classifying two head snapshots as mergeable or conflicting.
//! 2. **Merging** -- planning a merge of one branch into another.
//! 3. **Resolution** -- collecting per-conflict choices until a merge can complete.

pub mod detector;
pub mod merger;
pub mod resolver;

pub use detector::{
    detect_conflicts, ConflictDetector, ConflictPolicy, ConflictSection, MergeConflict,
    DEFAULT_LINE_DELTA_THRESHOLD,
};
pub use merger::{merge_message, MergeEngine, MergeOutcome, MergePlan, ResolverAuthor};
pub use resolver::{MergeSession, Resolution};
