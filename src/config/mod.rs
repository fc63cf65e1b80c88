//! Optional TOML configuration.
//!
//! ```toml
//! [export]
//! executable = "/Applications/Aseprite.app/Contents/MacOS/aseprite"
//! scale = 1
//! filename_format = "[t={tag}][f={frame}].png"
//! extra_args = "--ignore-empty"
//!
//! [walk]
//! extensions = ["aseprite", "ase"]
//! ignore_patterns = [".git", "*_wip"]
//! follow_symlinks = false
//! ```

pub mod parser;

use crate::naming::{DEFAULT_FILENAME_FORMAT, NamingResolver};
use crate::tracking::walker::WalkOptions;
use anyhow::{Context, Result};
use glob::Pattern;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Complete configuration file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// How project files are rendered
    #[serde(default)]
    pub export: ExportConfig,

    /// Which files the tree walk visits
    #[serde(default)]
    pub walk: WalkConfig,
}

/// `[export]` section
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Default executable when `--execpath` is not given
    #[serde(default)]
    pub executable: Option<String>,
    /// Integer scale passed as `--scale`
    #[serde(default = "default_scale")]
    pub scale: u32,
    /// Frame/tag part of every output file name
    #[serde(default = "default_filename_format")]
    pub filename_format: String,
    /// Extra exporter arguments, split like a shell would
    #[serde(default)]
    pub extra_args: String,
}

/// `[walk]` section
#[derive(Debug, Clone, Deserialize)]
pub struct WalkConfig {
    /// Project file extensions, without the dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Glob patterns pruned from the walk
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
    /// Descend into symlinked directories
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            executable: None,
            scale: default_scale(),
            filename_format: default_filename_format(),
            extra_args: String::new(),
        }
    }
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            ignore_patterns: default_ignore_patterns(),
            follow_symlinks: false,
        }
    }
}

impl Config {
    /// Load configuration from a file
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file contains invalid TOML
    /// - A value fails validation
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        parser::parse_config_file(path)
    }

    /// Default config location: `$ASEXPORT_CONFIG_PATH` or `~/.config/asexport/config.toml`
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(crate::CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(crate::DEFAULT_CONFIG_PATH))
    }

    /// Walk options derived from the `[walk]` and `[export]` sections
    ///
    /// # Errors
    ///
    /// Returns an error if an ignore pattern is not a valid glob.
    pub fn walk_options(&self) -> Result<WalkOptions> {
        let ignore_patterns = self
            .walk
            .ignore_patterns
            .iter()
            .map(|p| Pattern::new(p).with_context(|| format!("Invalid ignore pattern: {p}")))
            .collect::<Result<Vec<_>>>()?;

        Ok(WalkOptions {
            extensions: self.walk.extensions.clone(),
            ignore_patterns,
            follow_symlinks: self.walk.follow_symlinks,
            scale: self.export.scale,
        })
    }

    /// Naming rules using the configured file name format
    #[must_use]
    pub fn naming(&self) -> NamingResolver {
        NamingResolver::new(self.export.filename_format.clone())
    }

    /// Extra exporter arguments, split into words
    ///
    /// # Errors
    ///
    /// Returns an error if `extra_args` has unbalanced quotes.
    pub fn extra_args(&self) -> Result<Vec<String>> {
        shell_words::split(&self.export.extra_args)
            .with_context(|| format!("Invalid extra_args: {}", self.export.extra_args))
    }
}

/// Render at native size
const fn default_scale() -> u32 {
    1
}

/// Tag and frame number in every file name
fn default_filename_format() -> String {
    DEFAULT_FILENAME_FORMAT.to_string()
}

/// Aseprite's own extension
fn default_extensions() -> Vec<String> {
    vec!["aseprite".to_string()]
}

/// Skip git metadata
fn default_ignore_patterns() -> Vec<String> {
    vec![".git".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() -> Result<()> {
        let temp = TempDir::new()?;
        let config = Config::load(&temp.path().join("config.toml"))?;
        assert_eq!(config.export.scale, 1);
        assert_eq!(config.export.filename_format, DEFAULT_FILENAME_FORMAT);
        assert_eq!(config.walk.extensions, ["aseprite"]);
        assert!(!temp.path().join("config.toml").exists());
        Ok(())
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[export]
executable = "/opt/aseprite"
scale = 2

[walk]
ignore_patterns = ["*_wip"]
"#,
        )?;

        let loaded = Config::load(&path)?;
        assert_eq!(loaded.export.executable.as_deref(), Some("/opt/aseprite"));
        assert_eq!(loaded.export.scale, 2);
        assert_eq!(loaded.export.filename_format, DEFAULT_FILENAME_FORMAT);
        assert_eq!(loaded.walk.ignore_patterns, ["*_wip"]);
        assert_eq!(loaded.walk.extensions, ["aseprite"]);
        Ok(())
    }

    #[test]
    fn test_walk_options() -> Result<()> {
        let mut config = Config::default();
        config.export.scale = 3;
        config.walk.follow_symlinks = true;
        let options = config.walk_options()?;
        assert_eq!(options.scale, 3);
        assert!(options.follow_symlinks);
        assert_eq!(options.ignore_patterns.len(), 1);
        Ok(())
    }

    #[test]
    fn test_extra_args_split() -> Result<()> {
        let mut config = Config::default();
        config.export.extra_args = r#"--ignore-layer "Ref Layer" --ignore-empty"#.into();
        assert_eq!(
            config.extra_args()?,
            ["--ignore-layer", "Ref Layer", "--ignore-empty"]
        );
        Ok(())
    }

    #[test]
    fn test_extra_args_unbalanced_quote() {
        let mut config = Config::default();
        config.export.extra_args = "\"oops".into();
        assert!(config.extra_args().is_err());
    }
}
