//! Invocation of the external rendering tool.
//!
//! The walker only depends on the [`Exporter`] trait. [`ProcessExporter`]
//! runs the real tool in batch mode; tests pass closures instead.

use crate::errors::ExportError;
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{Level, debug, span};

/// Arguments of one export call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRequest<'a> {
    /// Project file to render
    pub source: &'a Path,
    /// Integer scale factor
    pub scale: u32,
    /// Crop transparent margins
    pub trim: bool,
    /// Output pattern, placeholders left for the tool to substitute
    pub save_as: &'a Path,
}

/// Something able to render a project file into images
pub trait Exporter {
    /// Render `request.source`, returning whatever the tool printed
    ///
    /// # Errors
    ///
    /// Any error is fatal for the run.
    fn export(&self, request: &ExportRequest<'_>) -> Result<Vec<u8>>;
}

impl<F> Exporter for F
where
    F: Fn(&ExportRequest<'_>) -> Result<Vec<u8>>,
{
    fn export(&self, request: &ExportRequest<'_>) -> Result<Vec<u8>> {
        self(request)
    }
}

/// Runs the rendering executable as a child process
#[derive(Debug, Clone)]
pub struct ProcessExporter {
    /// Resolved path of the executable
    executable: PathBuf,
    /// Extra arguments inserted before `--save-as`
    extra_args: Vec<String>,
}

impl ProcessExporter {
    /// Create an exporter bound to `executable`
    #[must_use]
    pub const fn new(executable: PathBuf) -> Self {
        Self {
            executable,
            extra_args: Vec::new(),
        }
    }

    /// Append extra command-line arguments to every invocation
    #[must_use]
    pub fn with_extra_args(mut self, extra_args: Vec<String>) -> Self {
        self.extra_args = extra_args;
        self
    }

    /// Locate `executable`, searching `PATH` when given a bare command name
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Validation`] if the executable cannot be found.
    pub fn locate(executable: &str) -> Result<PathBuf> {
        if executable.trim().is_empty() {
            return Err(ExportError::Validation("Executable path cannot be empty".into()).into());
        }

        let candidate = Path::new(executable);
        if candidate.components().count() > 1 {
            if candidate.is_file() {
                return Ok(candidate.to_path_buf());
            }
            return Err(ExportError::Validation(format!(
                "Export executable not found: {}",
                candidate.display()
            ))
            .into());
        }

        which::which(executable).map_err(|e| {
            ExportError::Validation(format!(
                "Export executable '{executable}' not found in PATH: {e}"
            ))
            .into()
        })
    }

    /// Path of the executable this exporter runs
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Build the argument list for `request`
    ///
    /// Paths are passed through as OS strings, byte for byte.
    #[must_use]
    pub fn args(&self, request: &ExportRequest<'_>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-b".into(),
            request.source.into(),
            "--scale".into(),
            request.scale.to_string().into(),
        ];
        if request.trim {
            args.push("--trim".into());
        }
        args.extend(self.extra_args.iter().map(OsString::from));
        args.push("--save-as".into());
        args.push(request.save_as.into());
        args
    }
}

impl Exporter for ProcessExporter {
    fn export(&self, request: &ExportRequest<'_>) -> Result<Vec<u8>> {
        let span = span!(Level::DEBUG, "export_process", source = %request.source.display());
        let _guard = span.enter();

        let args = self.args(request);
        debug!(executable = %self.executable.display(), ?args, "Running exporter");

        let output = Command::new(&self.executable)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ExportError::Export {
                path: request.source.to_path_buf(),
                status: None,
                stderr: e.to_string(),
            })
            .with_context(|| format!("Failed to run {}", self.executable.display()))?;

        if !output.status.success() {
            return Err(ExportError::Export {
                path: request.source.to_path_buf(),
                status: Some(output.status),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        debug!(bytes = output.stdout.len(), "Exporter finished");
        Ok(output.stdout)
    }
}
