//! docbranch command-line tool.
//!
//! Provides subcommands for committing document snapshots, managing
//! branches, browsing history, rolling back, merging with interactive
//! conflict resolution, diffing, and compacting the commit log.

mod commands;
mod style;
mod workspace;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use docbranch_core::config::AppConfig;
use docbranch_core::errors::ConfigError;

use crate::commands::branch::BranchAction;
use crate::workspace::Workspace;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Branching version store for a single text document.
#[derive(Parser, Debug)]
#[command(name = "docbranch", version, about = "Branching version store for text documents")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default config file and create the database.
    Init,

    /// Show the active branch and store summary.
    Status,

    /// Manage branches.
    Branch {
        #[command(subcommand)]
        action: BranchAction,
    },

    /// Make a branch active and print its head content.
    Switch {
        name: String,
    },

    /// Commit a new snapshot on the active branch.
    Commit {
        /// Commit message.
        #[arg(short, long)]
        message: String,

        /// Author name (defaults to the configured author variable).
        #[arg(long)]
        author: Option<String>,

        /// Read content from this file instead of stdin.
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Show commit history.
    Log {
        /// Branch to show (defaults to the active branch).
        branch: Option<String>,

        /// Walk parent links, including commits inherited at fork time.
        #[arg(long)]
        lineage: bool,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show one commit and its content.
    Show {
        /// Commit id or unique prefix.
        id: String,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Restore an old snapshot as a new commit on its branch.
    Rollback {
        /// Commit id or unique prefix.
        id: String,
    },

    /// Merge another branch's head into a branch.
    Merge {
        /// Branch to merge from.
        source: String,

        /// Branch to merge into (defaults to the active branch).
        #[arg(long)]
        into: Option<String>,

        /// Resolve every conflict the same way: current, incoming, or both.
        #[arg(long, conflicts_with = "manual_file")]
        accept: Option<String>,

        /// Resolve every conflict with the contents of this file.
        #[arg(long)]
        manual_file: Option<PathBuf>,

        /// Name recorded as resolver.
        #[arg(long)]
        author: Option<String>,
    },

    /// Line diff between two commits.
    Diff {
        old: String,
        new: String,

        /// Print a unified patch instead of hunks.
        #[arg(long)]
        unified: bool,
    },

    /// Line-set similarity percentage between two commits.
    Similarity {
        old: String,
        new: String,
    },

    /// Drop commits unreachable from every branch head.
    Gc {
        /// Report what would be removed without removing it.
        #[arg(long)]
        dry_run: bool,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config_path = cli.config.clone().or_else(AppConfig::default_path);
    let config = load_config(config_path.as_ref());

    let level = match &config {
        Ok(c) => c.store.log_level.clone(),
        Err(_) => "warn".to_string(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .without_time()
        .init();

    let result = config.and_then(|config| run(cli, config_path, config));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, config_path: Option<PathBuf>, config: AppConfig) -> Result<()> {
    if let Commands::Init = cli.command {
        return commands::store::run_init(config_path.as_deref(), config);
    }

    let mut ws = Workspace::open(config)?;
    match cli.command {
        Commands::Init => unreachable!(),
        Commands::Status => commands::store::run_status(&ws),
        Commands::Branch { action } => commands::branch::run(&mut ws, action),
        Commands::Switch { name } => commands::branch::run_switch(&mut ws, &name),
        Commands::Commit {
            message,
            author,
            file,
        } => commands::history::run_commit(&mut ws, &message, author, file.as_deref()),
        Commands::Log {
            branch,
            lineage,
            json,
        } => commands::history::run_log(&ws, branch.as_deref(), lineage, json),
        Commands::Show { id, json } => commands::history::run_show(&ws, &id, json),
        Commands::Rollback { id } => commands::history::run_rollback(&mut ws, &id),
        Commands::Merge {
            source,
            into,
            accept,
            manual_file,
            author,
        } => commands::merge::run(
            &mut ws,
            commands::merge::MergeArgs {
                source,
                into,
                accept,
                manual_file,
                author,
            },
        ),
        Commands::Diff { old, new, unified } => {
            commands::history::run_diff(&ws, &old, &new, unified)
        }
        Commands::Similarity { old, new } => commands::history::run_similarity(&ws, &old, &new),
        Commands::Gc { dry_run } => commands::store::run_gc(&mut ws, dry_run),
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

/// Load, resolve and validate the config. A missing file means defaults.
fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    let mut config = match path.map(|p| workspace::expand_tilde(p)) {
        Some(p) => match AppConfig::load_from_file(&p) {
            Ok(config) => config,
            Err(ConfigError::FileNotFound(_)) => AppConfig::default(),
            Err(e) => return Err(e).context("failed to load configuration file"),
        },
        None => AppConfig::default(),
    };
    config
        .resolve_env_vars()
        .context("failed to resolve environment variables")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}
