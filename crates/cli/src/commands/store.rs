//! Store-level commands: init, status, gc.

use std::path::Path;

use anyhow::{Context, Result};

use docbranch_core::config::AppConfig;
use docbranch_core::db::StateStore;
use docbranch_core::models::Checkout;

use crate::style;
use crate::workspace::{expand_tilde, Workspace};

const DEFAULT_CONFIG: &str = r#"# docbranch configuration

[store]
# data_dir = "~/.local/share/docbranch"
log_level = "warn"

[commit]
max_message_len = 200
author_env = "DOCBRANCH_AUTHOR"

[merge]
# "line_delta" tolerates up to line_delta_threshold lines of difference;
# "strict" reports any difference as a conflict.
policy = "line_delta"
line_delta_threshold = 5
resolver_author = "system"
"#;

/// Write a default config (if absent) and create the database.
pub fn run_init(config_path: Option<&Path>, config: AppConfig) -> Result<()> {
    if let Some(path) = config_path.map(expand_tilde) {
        if path.exists() {
            println!(
                "{}",
                style::dim(&format!("Config already exists at {}", path.display()))
            );
        } else {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(&path, DEFAULT_CONFIG).context("failed to write config file")?;
            println!(
                "{}",
                style::success(&format!("Wrote default config to {}", path.display()))
            );
        }
    }

    let ws = Workspace::open(config)?;
    let fresh = ws
        .db
        .load()
        .context("failed to read repository state")?
        .is_none();
    if fresh {
        ws.save()?;
        println!(
            "{}",
            style::success(&format!(
                "Initialized empty store at {}",
                ws.config.database_path().display()
            ))
        );
    } else {
        println!(
            "{}",
            style::dim(&format!(
                "Store already initialized at {}",
                ws.config.database_path().display()
            ))
        );
    }
    Ok(())
}

pub fn run_status(ws: &Workspace) -> Result<()> {
    let repo = &ws.repo;
    let current = repo.current_branch();

    println!();
    println!("{}", style::header("docbranch status"));
    println!();
    println!("  Branch     : {}", style::branch(current));
    match repo.head_content(current)? {
        Checkout::Content(content) => {
            let head = repo
                .branch(current)
                .and_then(|b| b.head_commit_id.as_deref())
                .unwrap_or("");
            println!(
                "  Head       : {} ({} line(s))",
                style::short_id(head),
                content.lines().count()
            );
        }
        Checkout::Empty => println!("  Head       : {}", style::dim("no commits yet")),
    }
    println!("  Branches   : {}", repo.list_branches().len());
    println!("  Commits    : {}", repo.commits().len());
    println!("  Policy     : {}", repo.settings().policy);
    println!("  Database   : {}", ws.config.database_path().display());
    println!(
        "  Author     : {}",
        ws.config
            .commit
            .author
            .as_deref()
            .unwrap_or("not set")
    );

    let garbage = repo.compact_dry_run();
    if garbage.did_remove() {
        println!();
        println!(
            "{}",
            style::warn(&format!(
                "{} commit(s) unreachable from any branch; run `docbranch gc` to remove",
                garbage.removed
            ))
        );
    }
    println!();
    Ok(())
}

pub fn run_gc(ws: &mut Workspace, dry_run: bool) -> Result<()> {
    if dry_run {
        let result = ws.repo.compact_dry_run();
        println!(
            "Would remove {} commit(s), keeping {}.",
            result.removed, result.retained
        );
        return Ok(());
    }

    let result = ws.repo.compact();
    if result.did_remove() {
        ws.save()?;
    }
    println!(
        "{}",
        style::success(&format!(
            "Removed {} commit(s), kept {}",
            result.removed, result.retained
        ))
    );
    Ok(())
}
