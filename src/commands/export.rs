use crate::ExportContext;
use crate::commands::{require_directory, require_manifest_path};
use crate::errors::ExportError;
use crate::exporter::{Exporter, ProcessExporter};
use crate::lock::RunLock;
use crate::output::{self, Confirm, StdinConfirm};
use crate::tracking::{Manifest, TreeWalker, WalkReport};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{Level, info, span};

/// Parameters of one export run
#[derive(Debug, Clone)]
pub struct RunParams {
    /// Rendering executable (path or command name)
    pub executable: String,
    /// Root of the project tree
    pub source_dir: PathBuf,
    /// Root of the export tree
    pub target_dir: PathBuf,
    /// Manifest file
    pub manifest_path: PathBuf,
    /// Skip the confirmation before clearing the target on a first run
    pub mute_prompt: bool,
}

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// The walk finished and the manifest was replaced
    Completed(RunSummary),
    /// The user declined clearing the target; nothing was touched
    Declined,
}

/// Statistics of a completed run
#[derive(Debug)]
pub struct RunSummary {
    /// Walk results, including the manifest that was written
    pub report: WalkReport,
    /// Whether the target directory was cleared first
    pub cleared_target: bool,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

/// Run an export with the process-backed exporter and a stdin prompt
///
/// # Errors
///
/// Returns an error if validation, the walk, an export, or the manifest
/// write fails.
pub fn execute(ctx: &ExportContext, params: &RunParams) -> Result<()> {
    let executable = ProcessExporter::locate(&params.executable)?;
    let exporter =
        ProcessExporter::new(executable).with_extra_args(ctx.config.extra_args()?);

    let mut confirm = StdinConfirm;
    match run(ctx, params, &exporter, &mut confirm)? {
        RunOutcome::Declined => output::info("Export cancelled"),
        RunOutcome::Completed(summary) => print_summary(&summary, &params.manifest_path),
    }
    Ok(())
}

/// Full run with injected collaborators
///
/// 1. Validates the directories and manifest path
/// 2. Loads the previous manifest
/// 3. On a first run (empty manifest) clears the target, after confirmation
///    unless `mute_prompt` is set; declining leaves the disk as it was
/// 4. Walks the source tree, exporting changed files
/// 5. Replaces the manifest; a failed walk leaves the old one untouched
///
/// # Errors
///
/// Returns the first failure of any stage.
pub fn run(
    ctx: &ExportContext,
    params: &RunParams,
    exporter: &dyn Exporter,
    confirm: &mut dyn Confirm,
) -> Result<RunOutcome> {
    let span = span!(Level::DEBUG, "export_run", source = %params.source_dir.display());
    let _guard = span.enter();
    let start = Instant::now();

    validate(params)?;
    let lock = RunLock::acquire(&params.manifest_path)?;

    let previous = Manifest::load(&params.manifest_path)?;

    let mut cleared_target = false;
    if previous.is_empty() {
        if !params.mute_prompt {
            let question = format!(
                "No previous export recorded. Delete everything in {}?",
                params.target_dir.display()
            );
            if !confirm.confirm(&question)? {
                lock.discard()?;
                return Ok(RunOutcome::Declined);
            }
        }
        clear_directory(&params.target_dir, lock.path())?;
        cleared_target = true;
    }

    let walker = TreeWalker::new(params.source_dir.clone(), params.target_dir.clone())
        .with_naming(ctx.config.naming())
        .with_options(ctx.config.walk_options()?);
    let report = walker
        .walk(&previous, exporter)
        .with_context(|| format!("Export of {} aborted", params.source_dir.display()))?;

    report.manifest.save(&params.manifest_path)?;
    drop(lock);

    info!(
        exported = report.exported_count(),
        unchanged = report.unchanged_count(),
        "Export run complete"
    );

    Ok(RunOutcome::Completed(RunSummary {
        report,
        cleared_target,
        elapsed: start.elapsed(),
    }))
}

/// Check every path parameter before any work starts
fn validate(params: &RunParams) -> Result<()> {
    if params.executable.trim().is_empty() {
        return Err(ExportError::Validation("Executable path cannot be empty".into()).into());
    }
    require_directory("Source", &params.source_dir)?;
    require_directory("Target", &params.target_dir)?;
    require_manifest_path(&params.manifest_path)?;

    // Clearing the target on a first run must never reach the sources
    let source = params
        .source_dir
        .canonicalize()
        .map_err(|e| ExportError::io("resolve", &params.source_dir, e))?;
    let target = params
        .target_dir
        .canonicalize()
        .map_err(|e| ExportError::io("resolve", &params.target_dir, e))?;
    if source.starts_with(&target) {
        return Err(ExportError::Validation(format!(
            "Target directory {} contains the source directory {}",
            params.target_dir.display(),
            params.source_dir.display()
        ))
        .into());
    }

    Ok(())
}

/// Remove everything inside `dir`, keeping `dir` itself
///
/// Top-level entries on the way to `keep` (the run lock) are left in place.
fn clear_directory(dir: &Path, keep: &Path) -> Result<()> {
    let keep = keep.canonicalize().unwrap_or_else(|_| keep.to_path_buf());
    let entries =
        fs::read_dir(dir).map_err(|e| ExportError::io("read target directory", dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| ExportError::io("read target directory", dir, e))?;
        let path = entry.path();
        let resolved = path.canonicalize().unwrap_or_else(|_| path.clone());
        if keep.starts_with(&resolved) {
            continue;
        }

        let file_type = entry
            .file_type()
            .map_err(|e| ExportError::io("inspect", &path, e))?;
        let removed = if file_type.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|e| ExportError::io("clear", &path, e))?;
    }

    output::info(&format!("Cleared {}", dir.display()));
    Ok(())
}

/// Report counts and duration of a completed run
fn print_summary(summary: &RunSummary, manifest_path: &Path) {
    let report = &summary.report;
    let elapsed = Duration::from_millis(
        u64::try_from(summary.elapsed.as_millis()).unwrap_or(u64::MAX),
    );
    output::success(&format!(
        "Exported {} of {} project file{} ({} unchanged) in {}",
        report.exported_count(),
        report.outcomes.len(),
        if report.outcomes.len() == 1 { "" } else { "s" },
        report.unchanged_count(),
        humantime::format_duration(elapsed)
    ));
    output::verbose(&format!("Manifest written to {}", manifest_path.display()));
}
