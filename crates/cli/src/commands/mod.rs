//! Subcommand implementations.
//!
//! Every mutating command saves the repository through
//! [`Workspace::save`](crate::workspace::Workspace::save) before it returns.

pub mod branch;
pub mod history;
pub mod merge;
pub mod store;
