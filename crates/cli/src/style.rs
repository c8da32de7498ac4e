//! Shared styling utilities for the CLI.

use console::Style;

use docbranch_core::diff::{Hunk, HunkKind};

/// Create a success-styled string (green with checkmark).
pub fn success(msg: &str) -> String {
    let style = Style::new().green();
    format!("{} {}", style.apply_to("✓"), msg)
}

/// Create a warning-styled string (yellow).
pub fn warn(msg: &str) -> String {
    let style = Style::new().yellow();
    format!("{} {}", style.apply_to("⚠"), msg)
}

/// Create a header-styled string (bold, white).
pub fn header(msg: &str) -> String {
    let style = Style::new().bold();
    style.apply_to(msg).to_string()
}

/// Create a dim-styled string.
pub fn dim(msg: &str) -> String {
    let style = Style::new().dim();
    style.apply_to(msg).to_string()
}

/// Branch name label (cyan, bold).
pub fn branch(name: &str) -> String {
    let style = Style::new().cyan().bold();
    style.apply_to(name).to_string()
}

/// Marker for the active branch (green dot) or any other (dim dot).
pub fn active_marker(active: bool) -> String {
    if active {
        Style::new().green().apply_to("●").to_string()
    } else {
        Style::new().dim().apply_to("○").to_string()
    }
}

/// First 8 characters of a commit id.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Render a hunk with `+`/`-` lines coloured.
pub fn hunk(h: &Hunk) -> String {
    let text = h.to_string();
    let text = text.trim_end_matches('\n');
    match h.kind {
        HunkKind::Added => Style::new().green().apply_to(text).to_string(),
        HunkKind::Removed => Style::new().red().apply_to(text).to_string(),
        HunkKind::Context => Style::new().dim().apply_to(text).to_string(),
    }
}
