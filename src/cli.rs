//! Command-line interface definitions for dirsafe.
//!
//! This module contains all CLI argument parsing structures using clap's
//! derive macros.
//!
//! Note: Field-level documentation is provided via clap attributes, so we
//! allow missing_docs for this module to avoid redundant documentation.

#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Main CLI structure for dirsafe.
#[derive(Parser)]
#[command(
    name = "dirsafe",
    version = crate::VERSION,
    about = "Incremental directory mirroring with grouped sources",
    long_about = "Mirrors grouped source folders into one destination tree, \
copying only what changed and applying per-group deletion policies"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the configuration file
    #[arg(short, long, global = true, env = "DIRSAFE_CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// Show per-file output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// All available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Mirror all configured groups into the destination
    Run,

    /// Show what a run would do without touching the destination
    Preview,

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}
