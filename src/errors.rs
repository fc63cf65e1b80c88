//! Error taxonomy for export runs.
//!
//! Every variant is fatal for the current run. Library functions return
//! `anyhow::Result` and wrap these values, so callers (and tests) can
//! `downcast_ref::<ExportError>()` to find out which stage failed.

use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;

/// Categorized failures of an export run
#[derive(Debug)]
pub enum ExportError {
    /// Missing or invalid parameters, directories, config or executable
    Validation(String),
    /// A manifest line that does not hold exactly one `|` delimiter, or a
    /// path recorded twice
    CorruptManifest {
        /// Manifest file being loaded
        path: PathBuf,
        /// 1-based line number of the offending record
        line: usize,
        /// What was wrong with the record
        reason: String,
    },
    /// Filesystem failure (directory creation, manifest read/write, walk)
    Io {
        /// Operation that failed, e.g. "create export directory"
        operation: &'static str,
        /// Path the operation was applied to
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// The external export tool could not be spawned or exited non-zero
    Export {
        /// Project file being exported
        path: PathBuf,
        /// Exit status, `None` if the process never ran
        status: Option<ExitStatus>,
        /// Trimmed stderr of the tool, or the spawn error
        stderr: String,
    },
}

impl ExportError {
    /// Shorthand for an [`ExportError::Io`]
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Get user-friendly suggestion for resolving the error
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Validation(_) => Some("Check the paths passed on the command line"),
            Self::CorruptManifest { .. } => {
                Some("Delete the manifest file to force a full re-export")
            }
            Self::Io { .. } => Some("Check file permissions and free disk space"),
            Self::Export { .. } => Some("Run the export tool by hand on this file to see why"),
        }
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "{msg}"),
            Self::CorruptManifest { path, line, reason } => write!(
                f,
                "Corrupt manifest {} at line {line}: {reason}",
                path.display()
            ),
            Self::Io {
                operation,
                path,
                source,
            } => write!(f, "Failed to {operation} {}: {source}", path.display()),
            Self::Export {
                path,
                status,
                stderr,
            } => {
                write!(f, "Export failed for {}", path.display())?;
                if let Some(status) = status {
                    write!(f, " ({status})")?;
                }
                if !stderr.is_empty() {
                    write!(f, ": {stderr}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_manifest_display() {
        let err = ExportError::CorruptManifest {
            path: PathBuf::from("/tmp/db"),
            line: 3,
            reason: "expected 2 fields, found 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Corrupt manifest /tmp/db at line 3: expected 2 fields, found 1"
        );
    }

    #[test]
    fn test_export_display_without_status() {
        let err = ExportError::Export {
            path: PathBuf::from("hero.aseprite"),
            status: None,
            stderr: "No such file or directory".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Export failed for hero.aseprite: No such file or directory"
        );
    }

    #[test]
    fn test_io_has_source() {
        use std::error::Error;
        let err = ExportError::io(
            "create export directory",
            "/out/hero",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("Failed to create export directory /out/hero"));
    }

    #[test]
    fn test_every_variant_has_suggestion() {
        let err = ExportError::Validation("x".into());
        assert!(err.suggestion().is_some());
    }
}
