#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
#![allow(clippy::arithmetic_side_effects)] // Simple counters cannot overflow
#![allow(clippy::indexing_slicing)] // Bounds checked by logic

//! # asexport - Incremental Aseprite Exporter
//!
//! asexport mirrors a tree of Aseprite project files into a tree of rendered
//! PNG sequences, re-exporting only the projects whose modification time
//! changed since the previous run.
//!
//! ## Architecture
//!
//! - [`tracking`]: manifest persistence, change classification and the tree walk
//! - [`naming`]: export directory and file name conventions
//! - [`exporter`]: the external rendering tool behind the [`exporter::Exporter`] trait
//! - [`commands`]: the `export` and `status` entry points
//! - [`config`]: optional TOML configuration
//! - [`output`]: progress lines, verbosity and confirmation prompts
//!
//! ## Example Usage
//!
//! ```no_run
//! use asexport::ExportContext;
//! use asexport::commands::export::{self, RunParams};
//!
//! # fn main() -> anyhow::Result<()> {
//! let ctx = ExportContext::new()?;
//! let params = RunParams {
//!     executable: "aseprite".into(),
//!     source_dir: "art".into(),
//!     target_dir: "export".into(),
//!     manifest_path: ".asexport.db".into(),
//!     mute_prompt: true,
//! };
//! export::execute(&ctx, &params)?;
//! # Ok(())
//! # }
//! ```

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Command implementations (`export`, `status`).
pub mod commands;

/// Configuration parsing and validation.
pub mod config;

/// Error taxonomy shared by all stages of a run.
pub mod errors;

/// External export tool invocation.
pub mod exporter;

/// Run locking to prevent concurrent runs on one manifest.
pub mod lock;

/// Export destination naming conventions.
pub mod naming;

/// Output formatting and confirmation prompts.
pub mod output;

/// Manifest, change classification and tree walking.
pub mod tracking;

use anyhow::Result;
use std::path::PathBuf;

/// Current version of the asexport binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file path relative to home directory.
pub const DEFAULT_CONFIG_PATH: &str = ".config/asexport/config.toml";

/// Environment variable overriding the configuration file path.
pub const CONFIG_PATH_ENV: &str = "ASEXPORT_CONFIG_PATH";

/// Environment variable holding the log filter (`tracing_subscriber::EnvFilter` syntax).
pub const LOG_ENV: &str = "ASEXPORT_LOG";

/// Central context for all asexport operations.
///
/// Holds the loaded configuration; commands read their defaults from it.
///
/// # Examples
///
/// ```no_run
/// use asexport::ExportContext;
/// use asexport::config::Config;
///
/// # fn main() -> anyhow::Result<()> {
/// // Load configuration from the default location
/// let ctx = ExportContext::new()?;
///
/// // Use an in-memory configuration (for testing)
/// let ctx = ExportContext::with_config(Config::default());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ExportContext {
    /// Path the configuration was loaded from (empty for in-memory configs).
    pub config_path: PathBuf,

    /// Loaded configuration settings.
    pub config: config::Config,
}

impl ExportContext {
    /// Creates a new `ExportContext` by loading the configuration from the default path.
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined or if the configuration
    /// file exists but cannot be read or validated.
    pub fn new() -> Result<Self> {
        let config_path = config::Config::default_path()?;
        Self::new_with_config_path(config_path)
    }

    /// Creates a new `ExportContext` from an explicit configuration file.
    ///
    /// # Errors
    /// Returns an error if the configuration file exists but is invalid.
    pub fn new_with_config_path(config_path: PathBuf) -> Result<Self> {
        let config = config::Config::load(&config_path)?;
        Ok(Self {
            config_path,
            config,
        })
    }

    /// Creates a context around an already-built configuration.
    #[must_use]
    pub fn with_config(config: config::Config) -> Self {
        Self {
            config_path: PathBuf::new(),
            config,
        }
    }
}
