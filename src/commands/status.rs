use crate::ExportContext;
use crate::commands::{require_directory, require_manifest_path};
use crate::output;
use crate::tracking::classify::Classification;
use crate::tracking::{Manifest, TreeWalker, WalkReport};
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

/// Classify every project file without exporting anything
///
/// Nothing is written: no directories, no exports, no manifest.
///
/// # Errors
///
/// Returns an error if the directories are invalid, the manifest is corrupt
/// or the source tree cannot be read.
pub fn plan(
    ctx: &ExportContext,
    source_dir: &Path,
    target_dir: &Path,
    manifest_path: &Path,
) -> Result<WalkReport> {
    require_directory("Source", source_dir)?;
    require_manifest_path(manifest_path)?;
    // The target may not exist before the first export
    if target_dir.as_os_str().is_empty() {
        require_directory("Target", target_dir)?;
    }

    let previous = Manifest::load(manifest_path)?;
    TreeWalker::new(source_dir.to_path_buf(), target_dir.to_path_buf())
        .with_naming(ctx.config.naming())
        .with_options(ctx.config.walk_options()?)
        .plan(&previous)
}

/// Print which project files the next export would render
///
/// # Errors
///
/// See [`plan`].
pub fn execute(
    ctx: &ExportContext,
    source_dir: &Path,
    target_dir: &Path,
    manifest_path: &Path,
) -> Result<()> {
    let report = plan(ctx, source_dir, target_dir, manifest_path)?;

    if report.outcomes.is_empty() {
        output::info("No project files found");
        return Ok(());
    }

    for outcome in &report.outcomes {
        let label = format!("{:>9}", outcome.classification.as_str());
        let label = match outcome.classification {
            Classification::NotModified => label.dimmed(),
            Classification::Modified => label.yellow(),
            Classification::NotFound | Classification::Empty => label.green(),
        };

        match &outcome.directive {
            Some(directive) => println!(
                "{label}  {} -> {}{}",
                outcome.path.display(),
                directive.output_path().display(),
                if directive.trim { " (trim)" } else { "" }
            ),
            None => println!("{label}  {}", outcome.path.display()),
        }
    }

    output::info(&format!(
        "{} to export, {} unchanged",
        report.changed_count(),
        report.unchanged_count()
    ));
    Ok(())
}
