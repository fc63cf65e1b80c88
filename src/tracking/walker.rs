//! Source tree walk: change detection and export orchestration.
//!
//! The walker visits every project file below the source root in file-name
//! order, records its live modification time in a fresh manifest, and
//! exports the files whose classification against the previous manifest
//! says they changed. The previous manifest is only read; the new one is
//! built from scratch and handed back to the caller, who decides whether to
//! persist it.

use crate::errors::ExportError;
use crate::exporter::{ExportRequest, Exporter};
use crate::naming::{ExportDirective, NamingResolver};
use crate::output;
use crate::tracking::classify::{Classification, classify};
use crate::tracking::manifest::{Manifest, ManifestEntry};
use anyhow::{Context, Result};
use glob::Pattern;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, info, span};
use walkdir::{DirEntry, WalkDir};

/// Knobs controlling which files are visited and how they are exported
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Extensions (without dot) identifying project files
    pub extensions: Vec<String>,
    /// Glob patterns pruned from the walk
    pub ignore_patterns: Vec<Pattern>,
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Scale factor passed to the exporter
    pub scale: u32,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["aseprite".to_string()],
            ignore_patterns: Vec::new(),
            follow_symlinks: false,
            scale: 1,
        }
    }
}

/// What happened to one project file during a walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    /// Project file path
    pub path: PathBuf,
    /// Classification against the previous manifest
    pub classification: Classification,
    /// Export destination, `None` for unchanged files
    pub directive: Option<ExportDirective>,
    /// Whether the exporter actually ran for this file
    pub exported: bool,
}

/// Result of a complete walk
#[derive(Debug, Clone, Default)]
pub struct WalkReport {
    /// Snapshot of every visited project file
    pub manifest: Manifest,
    /// Per-file outcomes in visit order
    pub outcomes: Vec<FileOutcome>,
}

impl WalkReport {
    /// Number of files handed to the exporter
    #[must_use]
    pub fn exported_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.exported).count()
    }

    /// Number of files skipped because they were unchanged
    #[must_use]
    pub fn unchanged_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.classification == Classification::NotModified)
            .count()
    }

    /// Number of files that would be (or were) exported
    #[must_use]
    pub fn changed_count(&self) -> usize {
        self.outcomes.len() - self.unchanged_count()
    }
}

/// Walks a source tree and mirrors it into an export tree
pub struct TreeWalker {
    /// Root of the project tree
    source_root: PathBuf,
    /// Root of the export tree
    export_root: PathBuf,
    /// Output naming rules
    naming: NamingResolver,
    /// Walk configuration
    options: WalkOptions,
}

impl TreeWalker {
    /// Create a walker from `source_root` into `export_root`
    #[must_use]
    pub fn new(source_root: PathBuf, export_root: PathBuf) -> Self {
        Self {
            source_root,
            export_root,
            naming: NamingResolver::default(),
            options: WalkOptions::default(),
        }
    }

    /// Use custom naming rules
    #[must_use]
    pub fn with_naming(mut self, naming: NamingResolver) -> Self {
        self.naming = naming;
        self
    }

    /// Use custom walk options
    #[must_use]
    pub fn with_options(mut self, options: WalkOptions) -> Self {
        self.options = options;
        self
    }

    /// Walk the tree, exporting every file that changed since `previous`
    ///
    /// # Errors
    ///
    /// Stops at the first failure and returns it:
    /// - A directory entry cannot be read
    /// - A project file's modification time cannot be read
    /// - An export directory cannot be created
    /// - The exporter fails
    pub fn walk(&self, previous: &Manifest, exporter: &dyn Exporter) -> Result<WalkReport> {
        self.visit(previous, Some(exporter))
    }

    /// Classify every project file without creating directories or exporting
    ///
    /// # Errors
    ///
    /// Returns an error if the tree or a file's metadata cannot be read.
    pub fn plan(&self, previous: &Manifest) -> Result<WalkReport> {
        self.visit(previous, None)
    }

    /// Shared walk loop; `exporter` is `None` for planning
    fn visit(&self, previous: &Manifest, exporter: Option<&dyn Exporter>) -> Result<WalkReport> {
        let span = span!(Level::DEBUG, "tree_walk", source = %self.source_root.display());
        let _guard = span.enter();

        let mut report = WalkReport::default();

        for entry in WalkDir::new(&self.source_root)
            .follow_links(self.options.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.should_skip_entry(e))
        {
            let entry = entry.map_err(|e| self.walk_error(e))?;
            if !is_regular_file(&entry) || !self.is_project_file(entry.path()) {
                continue;
            }

            let path = entry.path();
            let record = ManifestEntry::from_file(path)?;
            let classification = classify(&record, previous);
            debug!(path = %path.display(), %classification, "Classified project file");
            if !report.manifest.push(record) {
                return Err(ExportError::Validation(format!(
                    "Project file recorded twice in one walk: {}",
                    path.display()
                ))
                .into());
            }

            if !classification.needs_export() {
                output::info(&format!("was not modified: {}", path.display()));
                report.outcomes.push(FileOutcome {
                    path: path.to_path_buf(),
                    classification,
                    directive: None,
                    exported: false,
                });
                continue;
            }

            let directive = self
                .naming
                .resolve(&self.source_root, path, &self.export_root);

            let exported = match exporter {
                Some(exporter) => {
                    self.export_file(path, &directive, exporter)?;
                    true
                }
                None => false,
            };

            report.outcomes.push(FileOutcome {
                path: path.to_path_buf(),
                classification,
                directive: Some(directive),
                exported,
            });
        }

        info!(
            files = report.outcomes.len(),
            exported = report.exported_count(),
            "Walk complete"
        );
        Ok(report)
    }

    /// Create the destination directory and run the exporter for one file
    fn export_file(
        &self,
        path: &Path,
        directive: &ExportDirective,
        exporter: &dyn Exporter,
    ) -> Result<()> {
        output::action("export:", &directive.export_dir.display().to_string());

        fs::create_dir_all(&directive.export_dir)
            .map_err(|e| ExportError::io("create export directory", &directive.export_dir, e))?;

        let save_as = directive.output_path();
        let request = ExportRequest {
            source: path,
            scale: self.options.scale,
            trim: directive.trim,
            save_as: &save_as,
        };

        let out = exporter
            .export(&request)
            .with_context(|| format!("Failed to export {}", path.display()))?;
        output::raw(&out);
        Ok(())
    }

    /// Whether `path` carries one of the project extensions
    fn is_project_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.options.extensions.iter().any(|e| e == ext))
    }

    /// Check if a directory entry matches an ignore pattern
    fn should_skip_entry(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || self.options.ignore_patterns.is_empty() {
            return false;
        }

        let relative = entry
            .path()
            .strip_prefix(&self.source_root)
            .unwrap_or(entry.path());
        let name = entry.file_name().to_string_lossy();

        self.options
            .ignore_patterns
            .iter()
            .any(|p| p.matches(&name) || p.matches_path(relative))
    }

    /// Convert a walkdir failure into the I/O category of the taxonomy
    fn walk_error(&self, err: walkdir::Error) -> anyhow::Error {
        let path = err
            .path()
            .map_or_else(|| self.source_root.clone(), Path::to_path_buf);
        let message = err.to_string();
        let source = err
            .into_io_error()
            .unwrap_or_else(|| io::Error::other(message));
        ExportError::io("walk", path, source).into()
    }
}

/// Regular files, and symlinks resolving to one, count as project candidates
fn is_regular_file(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())
}
