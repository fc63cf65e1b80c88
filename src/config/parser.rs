use super::Config;
use crate::errors::ExportError;
use anyhow::{Context, Result};
use glob::Pattern;
use std::path::Path;

/// Read and validate the config file at `path`
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid TOML, or fails
/// validation.
pub fn parse_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config_str(&content)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}

/// Parse and validate config text
///
/// # Errors
///
/// Returns an error if `content` is not valid TOML or fails validation.
pub fn parse_config_str(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse TOML config")?;

    validate_config(&config)?;
    Ok(config)
}

/// Reject values no run could work with
fn validate_config(config: &Config) -> Result<()> {
    let invalid = |msg: String| -> anyhow::Error { ExportError::Validation(msg).into() };

    if config.export.scale == 0 {
        return Err(invalid("export.scale must be at least 1".into()));
    }

    if config.export.filename_format.trim().is_empty() {
        return Err(invalid("export.filename_format cannot be empty".into()));
    }

    if config
        .export
        .executable
        .as_deref()
        .is_some_and(|e| e.trim().is_empty())
    {
        return Err(invalid("export.executable cannot be empty when set".into()));
    }

    if config.walk.extensions.is_empty() {
        return Err(invalid("walk.extensions needs at least one extension".into()));
    }

    for ext in &config.walk.extensions {
        if ext.is_empty() || ext.starts_with('.') {
            return Err(invalid(format!(
                "walk.extensions entries must be non-empty and without a leading dot: '{ext}'"
            )));
        }
    }

    for pattern in &config.walk.ignore_patterns {
        if let Err(e) = Pattern::new(pattern) {
            return Err(invalid(format!("walk.ignore_patterns: '{pattern}': {e}")));
        }
    }

    if let Err(e) = shell_words::split(&config.export.extra_args) {
        return Err(invalid(format!("export.extra_args: {e}")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation_message(content: &str) -> Option<String> {
        let err = parse_config_str(content).err()?;
        match err.downcast_ref::<ExportError>() {
            Some(ExportError::Validation(msg)) => Some(msg.clone()),
            _ => None,
        }
    }

    #[test]
    fn test_empty_document_uses_defaults() -> Result<()> {
        let config = parse_config_str("")?;
        assert_eq!(config.export.scale, 1);
        Ok(())
    }

    #[test]
    fn test_partial_sections() -> Result<()> {
        let config = parse_config_str("[walk]\nfollow_symlinks = true\n")?;
        assert!(config.walk.follow_symlinks);
        assert_eq!(config.walk.extensions, ["aseprite"]);
        Ok(())
    }

    #[test]
    fn test_rejects_zero_scale() {
        let msg = validation_message("[export]\nscale = 0\n");
        assert!(msg.is_some_and(|m| m.contains("scale")));
    }

    #[test]
    fn test_rejects_dotted_extension() {
        let msg = validation_message("[walk]\nextensions = [\".aseprite\"]\n");
        assert!(msg.is_some_and(|m| m.contains("leading dot")));
    }

    #[test]
    fn test_rejects_bad_glob() {
        let msg = validation_message("[walk]\nignore_patterns = [\"[\"]\n");
        assert!(msg.is_some());
    }

    #[test]
    fn test_rejects_invalid_toml() {
        assert!(parse_config_str("[export\n").is_err());
    }
}
