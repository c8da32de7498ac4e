//! Branch management commands.

use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use docbranch_core::models::Checkout;

use crate::style;
use crate::workspace::Workspace;

#[derive(Subcommand, Debug)]
pub enum BranchAction {
    /// List all branches.
    List,
    /// Fork a new branch from the active branch or `--from`.
    Create {
        name: String,

        /// Branch to fork from.
        #[arg(long)]
        from: Option<String>,
    },
    /// Delete a branch. Its commits stay in the log until `gc`.
    Delete { name: String },
}

pub fn run(ws: &mut Workspace, action: BranchAction) -> Result<()> {
    match action {
        BranchAction::List => run_list(ws),
        BranchAction::Create { name, from } => run_create(ws, &name, from.as_deref()),
        BranchAction::Delete { name } => run_delete(ws, &name),
    }
}

fn run_list(ws: &Workspace) -> Result<()> {
    let repo = &ws.repo;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["", "Branch", "Head", "Commits", "Created"]);

    for b in repo.list_branches() {
        let head = b
            .head_commit_id
            .as_deref()
            .map(style::short_id)
            .unwrap_or("—");
        let name = if b.is_protected {
            format!("{} (protected)", b.name)
        } else {
            b.name.clone()
        };
        table.add_row(vec![
            Cell::new(style::active_marker(b.name == repo.current_branch())),
            Cell::new(name),
            Cell::new(head),
            Cell::new(repo.get_history(&b.name).len()),
            Cell::new(b.created_at.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }

    println!();
    println!(
        "{}",
        style::header(&format!("Branches ({})", repo.list_branches().len()))
    );
    println!();
    println!("{}", table);
    println!();
    Ok(())
}

fn run_create(ws: &mut Workspace, name: &str, from: Option<&str>) -> Result<()> {
    let head = ws
        .repo
        .create_branch(name, from)
        .with_context(|| format!("failed to create branch '{}'", name))?
        .head_commit_id
        .clone();
    ws.save()?;

    let source = from.unwrap_or(ws.repo.current_branch());
    let at = head
        .as_deref()
        .map(|id| format!(" at {}", style::short_id(id)))
        .unwrap_or_default();
    println!(
        "{}",
        style::success(&format!(
            "Created branch {} from {}{}",
            style::branch(name),
            style::branch(source),
            at
        ))
    );
    Ok(())
}

fn run_delete(ws: &mut Workspace, name: &str) -> Result<()> {
    ws.repo
        .delete_branch(name)
        .with_context(|| format!("failed to delete branch '{}'", name))?;
    ws.save()?;
    println!(
        "{}",
        style::success(&format!("Deleted branch {}", style::branch(name)))
    );
    Ok(())
}

/// Make `name` active and print its head content.
pub fn run_switch(ws: &mut Workspace, name: &str) -> Result<()> {
    let checkout = ws
        .repo
        .switch_branch(name)
        .with_context(|| format!("failed to switch to '{}'", name))?;
    ws.save()?;

    eprintln!(
        "{}",
        style::success(&format!("Switched to {}", style::branch(name)))
    );
    match checkout {
        Checkout::Content(content) => print!("{}", content),
        Checkout::Empty => eprintln!("{}", style::dim("(no commits yet)")),
    }
    Ok(())
}
