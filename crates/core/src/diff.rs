//! Line-level diff and similarity between two text snapshots.
//!
//! Both functions here are deliberately coarse and cheap:
//!
//! - [`calculate_similarity`] is a set-overlap metric, not an edit distance.
//!   Reordering lines does not lower the score, and duplicated lines are
//!   counted once per occurrence in the larger document.
//! - [`generate_diff`] walks both documents with two pointers, comparing
//!   line `i` of the old text with line `i` of the new text. It is meant for
//!   display and is not a minimal edit script; an inserted line near the top
//!   shows every following line as changed.
//!
//! For a conventional minimal patch use [`unified_patch`], which delegates to
//! `diffy`.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Similarity
// ---------------------------------------------------------------------------

/// Similarity between two documents as a percentage in `0..=100`.
///
/// Returns 100 for byte-identical input. Otherwise returns the share of
/// lines in the document with more lines that also appear anywhere in the
/// other document, rounded to the nearest integer. When both have the same
/// number of lines the lower of the two directions is used, so the result
/// does not depend on argument order.
pub fn calculate_similarity(a: &str, b: &str) -> u8 {
    if a == b {
        return 100;
    }

    let a_lines: Vec<&str> = a.lines().collect();
    let b_lines: Vec<&str> = b.lines().collect();
    let share = match a_lines.len().cmp(&b_lines.len()) {
        Ordering::Greater => shared_share(&a_lines, &b_lines),
        Ordering::Less => shared_share(&b_lines, &a_lines),
        Ordering::Equal => {
            shared_share(&a_lines, &b_lines).min(shared_share(&b_lines, &a_lines))
        }
    };

    (share * 100.0).round() as u8
}

/// Fraction of `larger`'s lines that occur anywhere in `smaller`.
fn shared_share(larger: &[&str], smaller: &[&str]) -> f64 {
    if larger.is_empty() {
        return 0.0;
    }
    let lookup: HashSet<&str> = smaller.iter().copied().collect();
    let shared = larger.iter().filter(|line| lookup.contains(*line)).count();
    shared as f64 / larger.len() as f64
}

// ---------------------------------------------------------------------------
// Hunks
// ---------------------------------------------------------------------------

/// What a hunk represents relative to the old text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HunkKind {
    Context,
    Added,
    Removed,
}

impl std::fmt::Display for HunkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Context => write!(f, "context"),
            Self::Added => write!(f, "added"),
            Self::Removed => write!(f, "removed"),
        }
    }
}

/// A contiguous run of lines of one kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hunk {
    pub kind: HunkKind,
    /// 1-indexed line in the old text where the hunk starts (or would start).
    pub old_start: usize,
    /// 1-indexed line in the new text where the hunk starts (or would start).
    pub new_start: usize,
    pub lines: Vec<String>,
}

impl Hunk {
    fn prefix(&self) -> char {
        match self.kind {
            HunkKind::Context => ' ',
            HunkKind::Added => '+',
            HunkKind::Removed => '-',
        }
    }
}

impl std::fmt::Display for Hunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = self.prefix();
        for line in &self.lines {
            writeln!(f, "{prefix}{line}")?;
        }
        Ok(())
    }
}

/// Counts of lines per hunk kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
}

impl DiffStats {
    pub fn from_hunks(hunks: &[Hunk]) -> Self {
        let mut stats = Self::default();
        for hunk in hunks {
            let n = hunk.lines.len();
            match hunk.kind {
                HunkKind::Context => stats.unchanged += n,
                HunkKind::Added => stats.added += n,
                HunkKind::Removed => stats.removed += n,
            }
        }
        stats
    }
}

struct HunkBuilder {
    hunks: Vec<Hunk>,
}

impl HunkBuilder {
    fn push(&mut self, kind: HunkKind, old_start: usize, new_start: usize, line: &str) {
        if let Some(last) = self.hunks.last_mut() {
            if last.kind == kind {
                last.lines.push(line.to_string());
                return;
            }
        }
        self.hunks.push(Hunk {
            kind,
            old_start,
            new_start,
            lines: vec![line.to_string()],
        });
    }

    /// Emit pending removed lines, then pending added lines.
    fn flush_block(
        &mut self,
        removed: &mut Vec<(usize, &str)>,
        added: &mut Vec<(usize, &str)>,
        old_at: usize,
        new_at: usize,
    ) {
        let new_anchor = added.first().map(|(n, _)| *n).unwrap_or(new_at);
        for (old_no, line) in removed.drain(..) {
            self.push(HunkKind::Removed, old_no, new_anchor, line);
        }
        for (new_no, line) in added.drain(..) {
            self.push(HunkKind::Added, old_at, new_no, line);
        }
    }
}

/// Compute display hunks between `old` and `new` with a two-pointer walk.
///
/// Lines at the same index that are equal become context. A run of
/// differing lines becomes a removed hunk followed by an added hunk. When
/// one side runs out, the rest of the other side is removed or added.
pub fn generate_diff(old: &str, new: &str) -> Vec<Hunk> {
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();

    let mut builder = HunkBuilder { hunks: Vec::new() };
    let mut removed: Vec<(usize, &str)> = Vec::new();
    let mut added: Vec<(usize, &str)> = Vec::new();

    let shared = old_lines.len().min(new_lines.len());
    for i in 0..shared {
        let (o, n) = (old_lines[i], new_lines[i]);
        if o == n {
            builder.flush_block(&mut removed, &mut added, i + 1, i + 1);
            builder.push(HunkKind::Context, i + 1, i + 1, o);
        } else {
            removed.push((i + 1, o));
            added.push((i + 1, n));
        }
    }

    for (i, line) in old_lines.iter().enumerate().skip(shared) {
        removed.push((i + 1, *line));
    }
    for (i, line) in new_lines.iter().enumerate().skip(shared) {
        added.push((i + 1, *line));
    }
    builder.flush_block(&mut removed, &mut added, old_lines.len() + 1, new_lines.len() + 1);

    builder.hunks
}

/// Render a conventional unified diff between two snapshots.
pub fn unified_patch(old: &str, new: &str) -> String {
    diffy::create_patch(old, new).to_string()
}
