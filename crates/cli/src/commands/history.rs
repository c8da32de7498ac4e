//! Commit, history and diff commands.

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use docbranch_core::diff::{unified_patch, DiffStats};
use docbranch_core::models::Commit;

use crate::style;
use crate::workspace::Workspace;

/// Commit content from `file` or stdin on the active branch.
pub fn run_commit(
    ws: &mut Workspace,
    message: &str,
    author: Option<String>,
    file: Option<&Path>,
) -> Result<()> {
    let Some(author) = ws.author(author) else {
        bail!(
            "no author: pass --author or set {}",
            ws.config.commit.author_env
        );
    };

    let content = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read content from stdin")?;
            buf
        }
    };

    let id = ws
        .repo
        .commit(&content, message, &author)
        .context("commit failed")?;
    ws.save()?;

    println!(
        "{}",
        style::success(&format!(
            "[{} {}] {}",
            style::branch(ws.repo.current_branch()),
            style::short_id(&id),
            ws.repo.get_commit(&id).map(|c| c.message.as_str()).unwrap_or(message)
        ))
    );
    Ok(())
}

/// Show history for `branch` (default: active branch).
pub fn run_log(ws: &Workspace, branch: Option<&str>, lineage: bool, json: bool) -> Result<()> {
    let repo = &ws.repo;
    let branch = branch.unwrap_or(repo.current_branch());

    let commits: Vec<&Commit> = if lineage {
        repo.lineage(branch)
            .with_context(|| format!("failed to read lineage of '{}'", branch))?
    } else {
        if repo.branch(branch).is_none() {
            eprintln!(
                "{}",
                style::warn(&format!("branch '{}' does not exist", branch))
            );
        }
        repo.get_history(branch)
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&commits)?);
        return Ok(());
    }

    if commits.is_empty() {
        println!("No commits on {}.", style::branch(branch));
        return Ok(());
    }

    let title = if lineage { "Lineage" } else { "History" };
    println!();
    println!(
        "{} {} ({})",
        style::header(title),
        style::branch(branch),
        commits.len()
    );
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    let mut header = vec!["ID", "Message", "Author", "Created"];
    if lineage {
        header.insert(1, "Branch");
    }
    table.set_header(header);

    for c in &commits {
        let mut row = vec![
            Cell::new(style::short_id(&c.id)),
            Cell::new(&c.message),
            Cell::new(&c.author),
            Cell::new(c.created_at.format("%Y-%m-%d %H:%M:%S").to_string()),
        ];
        if lineage {
            row.insert(1, Cell::new(&c.branch));
        }
        table.add_row(row);
    }

    println!("{}", table);
    println!();
    Ok(())
}

pub fn run_show(ws: &Workspace, id: &str, json: bool) -> Result<()> {
    let id = ws.resolve_id(id)?;
    let Some(commit) = ws.repo.get_commit(&id) else {
        bail!("commit not found: {}", id);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(commit)?);
        return Ok(());
    }

    println!("{} {}", style::header("commit"), commit.id);
    println!("Branch:  {}", style::branch(&commit.branch));
    println!("Author:  {}", commit.author);
    println!("Date:    {}", commit.created_at.to_rfc3339());
    if let Some(parent) = &commit.parent_id {
        println!("Parent:  {}", parent);
    }
    println!();
    println!("    {}", commit.message);
    println!();
    print!("{}", commit.content);
    if !commit.content.is_empty() && !commit.content.ends_with('\n') {
        println!();
    }
    Ok(())
}

pub fn run_rollback(ws: &mut Workspace, id: &str) -> Result<()> {
    let id = ws.resolve_id(id)?;
    ws.repo.rollback(&id).context("rollback failed")?;
    ws.save()?;

    let branch = ws
        .repo
        .get_commit(&id)
        .map(|c| c.branch.clone())
        .unwrap_or_default();
    println!(
        "{}",
        style::success(&format!(
            "Restored {} on {}",
            style::short_id(&id),
            style::branch(&branch)
        ))
    );
    Ok(())
}

pub fn run_diff(ws: &Workspace, old: &str, new: &str, unified: bool) -> Result<()> {
    let old = ws.resolve_id(old)?;
    let new = ws.resolve_id(new)?;

    if unified {
        let (Some(a), Some(b)) = (ws.repo.get_commit(&old), ws.repo.get_commit(&new)) else {
            bail!("commit not found");
        };
        print!("{}", unified_patch(&a.content, &b.content));
        return Ok(());
    }

    let hunks = ws.repo.diff_commits(&old, &new).context("diff failed")?;
    for hunk in &hunks {
        println!("{}", style::hunk(hunk));
    }

    let stats = DiffStats::from_hunks(&hunks);
    println!();
    println!(
        "{}",
        style::dim(&format!(
            "{} added, {} removed, {} unchanged",
            stats.added, stats.removed, stats.unchanged
        ))
    );
    Ok(())
}

pub fn run_similarity(ws: &Workspace, old: &str, new: &str) -> Result<()> {
    let old = ws.resolve_id(old)?;
    let new = ws.resolve_id(new)?;
    let pct = ws.repo.similarity(&old, &new).context("similarity failed")?;
    println!("{}%", pct);
    Ok(())
}
