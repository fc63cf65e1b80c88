//! Command-line interface definitions for asexport.
//!
//! The CLI definitions are shared between the main binary and build tools
//! (like xtask) for man page generation.
//!
//! Note: Field-level documentation is provided via clap attributes, so we
//! allow missing_docs for this module to avoid redundant documentation.

#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Main CLI structure for asexport.
#[derive(Parser)]
#[command(
    name = "asexport",
    version = crate::VERSION,
    about = "Incremental exporter for Aseprite project trees",
    long_about = "Mirrors a tree of .aseprite projects into PNG sequences, \
                  re-exporting only projects modified since the last run"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (defaults to ~/.config/asexport/config.toml)
    #[arg(long, global = true, env = "ASEXPORT_CONFIG_PATH")]
    pub config: Option<PathBuf>,
}

/// All available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Export every project modified since the last run
    Export {
        /// Path to the Aseprite executable
        #[arg(long = "execpath", value_name = "EXECUTABLE_PATH", env = "ASEXPORT_EXECPATH")]
        execpath: Option<String>,

        /// Directory containing the project tree
        #[arg(long, value_name = "SOURCE_DIR")]
        source: PathBuf,

        /// Directory the project tree is exported into
        #[arg(long, value_name = "TARGET_DIR")]
        target: PathBuf,

        /// Manifest file keeping each project's last modified time
        #[arg(long, value_name = "MODIFIED_TIME_DB")]
        db: PathBuf,

        /// Clear the target on a first run without asking
        #[arg(short, long)]
        yes: bool,

        /// Only show what would be exported
        #[arg(long)]
        dry_run: bool,
    },

    /// Show which projects the next export would render
    Status {
        /// Directory containing the project tree
        #[arg(long, value_name = "SOURCE_DIR")]
        source: PathBuf,

        /// Directory the project tree is exported into
        #[arg(long, value_name = "TARGET_DIR")]
        target: PathBuf,

        /// Manifest file keeping each project's last modified time
        #[arg(long, value_name = "MODIFIED_TIME_DB")]
        db: PathBuf,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
