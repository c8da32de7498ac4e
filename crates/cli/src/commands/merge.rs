//! Merge command with conflict resolution.
//!
//! A merge that stops on conflicts is resolved in the same invocation:
//! either in bulk from `--accept` / `--manual-file`, or one conflict at a
//! time through an interactive prompt. Nothing is saved until the merge
//! commit exists.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use dialoguer::{Input, Select};

use docbranch_core::conflict::{MergeConflict, MergeOutcome, MergeSession, Resolution};
use docbranch_core::diff::generate_diff;
use docbranch_core::models::SYSTEM_AUTHOR;

use crate::style;
use crate::workspace::Workspace;

pub struct MergeArgs {
    pub source: String,
    pub into: Option<String>,
    pub accept: Option<String>,
    pub manual_file: Option<PathBuf>,
    pub author: Option<String>,
}

pub fn run(ws: &mut Workspace, args: MergeArgs) -> Result<()> {
    let bulk = bulk_resolution(&args)?;
    let target = args
        .into
        .clone()
        .unwrap_or_else(|| ws.repo.current_branch().to_string());

    let outcome = ws
        .repo
        .merge(&args.source, &target)
        .with_context(|| format!("failed to merge '{}' into '{}'", args.source, target))?;

    let mut session = match outcome {
        MergeOutcome::Merged { commit_id } => {
            ws.save()?;
            println!(
                "{}",
                style::success(&format!(
                    "Merged {} into {} ({})",
                    style::branch(&args.source),
                    style::branch(&target),
                    style::short_id(&commit_id)
                ))
            );
            return Ok(());
        }
        MergeOutcome::Conflicted(session) => session,
    };

    println!(
        "{}",
        style::warn(&format!(
            "{} conflict(s) merging {} into {}",
            session.conflicts().len(),
            style::branch(&session.source),
            style::branch(&session.target)
        ))
    );

    match bulk {
        Some(resolution) => session.resolve_remaining(&resolution),
        None => resolve_interactively(&mut session)?,
    }

    let resolved_by = ws
        .author(args.author)
        .unwrap_or_else(|| SYSTEM_AUTHOR.to_string());
    let id = ws
        .repo
        .finish_merge(&session, &resolved_by)
        .context("failed to complete merge")?;
    ws.save()?;

    println!(
        "{}",
        style::success(&format!(
            "Merged {} into {} after resolving conflicts ({})",
            style::branch(&session.source),
            style::branch(&session.target),
            style::short_id(&id)
        ))
    );
    Ok(())
}

/// Resolution applied to every conflict, if one was given on the command line.
fn bulk_resolution(args: &MergeArgs) -> Result<Option<Resolution>> {
    if let Some(path) = &args.manual_file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return Ok(Some(Resolution::Manual(content)));
    }
    match args.accept.as_deref() {
        None => Ok(None),
        Some(name) => match Resolution::from_name(name) {
            Some(resolution) => Ok(Some(resolution)),
            None => bail!(
                "invalid resolution '{}': use 'current', 'incoming' or 'both'",
                name
            ),
        },
    }
}

fn resolve_interactively(session: &mut MergeSession) -> Result<()> {
    if !console::user_attended() {
        bail!("conflicts need resolving: pass --accept or --manual-file when not on a terminal");
    }

    while let Some(conflict) = session.next_unresolved().cloned() {
        show_conflict(&conflict, &session.source, &session.target);
        let resolution = prompt_resolution()?;
        session.resolve(&conflict.id, resolution)?;
    }
    Ok(())
}

fn show_conflict(conflict: &MergeConflict, source: &str, target: &str) {
    println!();
    println!(
        "{}",
        style::header(&format!("Conflict in {} section", conflict.section))
    );
    println!(
        "  current  ({}): {} line(s)",
        style::branch(target),
        conflict.current.lines().count()
    );
    println!(
        "  incoming ({}): {} line(s)",
        style::branch(source),
        conflict.incoming.lines().count()
    );
    println!();
    for hunk in generate_diff(&conflict.current, &conflict.incoming) {
        println!("{}", style::hunk(&hunk));
    }
    println!();
}

fn prompt_resolution() -> Result<Resolution> {
    let options = &[
        "current   keep the target branch's text",
        "incoming  take the source branch's text",
        "both      current, a blank line, then incoming",
        "manual    read the resolved text from a file",
    ];
    let choice = Select::new()
        .with_prompt("Resolve with")
        .items(options)
        .default(0)
        .interact()
        .context("failed to read resolution selection")?;

    let resolution = match choice {
        0 => Resolution::AcceptCurrent,
        1 => Resolution::AcceptIncoming,
        2 => Resolution::AcceptBoth,
        _ => {
            let path: String = Input::new()
                .with_prompt("File with resolved text")
                .interact_text()
                .context("failed to read file path")?;
            let content = std::fs::read_to_string(path.trim())
                .with_context(|| format!("failed to read {}", path.trim()))?;
            Resolution::Manual(content)
        }
    };
    Ok(resolution)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(accept: Option<&str>, manual_file: Option<PathBuf>) -> MergeArgs {
        MergeArgs {
            source: "feature".into(),
            into: None,
            accept: accept.map(str::to_string),
            manual_file,
            author: None,
        }
    }

    #[test]
    fn test_bulk_resolution_from_accept() {
        assert_eq!(
            bulk_resolution(&args(Some("both"), None)).unwrap(),
            Some(Resolution::AcceptBoth)
        );
        assert_eq!(bulk_resolution(&args(None, None)).unwrap(), None);
        assert!(bulk_resolution(&args(Some("mine"), None)).is_err());
    }

    #[test]
    fn test_bulk_resolution_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resolved.txt");
        std::fs::write(&path, "merged text").unwrap();
        assert_eq!(
            bulk_resolution(&args(None, Some(path))).unwrap(),
            Some(Resolution::Manual("merged text".into()))
        );
    }
}
