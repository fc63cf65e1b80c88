/// The incremental export run.
pub mod export;
/// Dry-run classification of the source tree.
pub mod status;

use crate::errors::ExportError;
use anyhow::Result;
use std::path::Path;

/// Ensure `path` is a non-empty path to an existing directory
///
/// # Errors
///
/// Returns [`ExportError::Validation`] naming the offending path.
pub fn require_directory(role: &str, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(ExportError::Validation(format!("{role} directory cannot be empty")).into());
    }
    if !path.exists() {
        return Err(ExportError::Validation(format!(
            "{role} directory does not exist: {}",
            path.display()
        ))
        .into());
    }
    if !path.is_dir() {
        return Err(ExportError::Validation(format!(
            "{role} path is not a directory: {}",
            path.display()
        ))
        .into());
    }
    Ok(())
}

/// Ensure the manifest path is non-empty and not a directory
///
/// # Errors
///
/// Returns [`ExportError::Validation`] naming the offending path.
pub fn require_manifest_path(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(ExportError::Validation("Manifest path cannot be empty".into()).into());
    }
    if path.is_dir() {
        return Err(ExportError::Validation(format!(
            "Manifest path is a directory: {}",
            path.display()
        ))
        .into());
    }
    Ok(())
}
