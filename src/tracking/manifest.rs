//! Modification-time manifest persisted between runs.
//!
//! The manifest records, for every project file seen by the last successful
//! run, the textual modification time observed at that moment. The on-disk
//! format is one `<path>|<modtime>` record per line, `\n` terminated:
//!
//! ```text
//! /art/sprites/hero.aseprite|Mon Mar  4 10:21:07.000000000 UTC 2024
//! /art/sprites/ui/button_t.aseprite|Tue Mar  5 08:00:00.120000000 UTC 2024
//! ```
//!
//! Timestamps are only ever compared as strings, so they round-trip through
//! this file exactly as written.

use crate::errors::ExportError;
use crate::output;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;
use std::time::SystemTime;
use tempfile::NamedTempFile;
use tracing::{Level, debug, span};

/// Field separator used by the manifest file format
pub const DELIMITER: char = '|';

/// Layout of serialized modification times (Unix `date` style, nanoseconds, UTC)
pub const MOD_TIME_FORMAT: &str = "%a %b %e %H:%M:%S%.9f UTC %Y";

/// One manifest record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Project file path as it was discovered during the walk
    pub path: String,
    /// Serialized modification time, compared by string equality only
    pub mod_time: String,
}

impl ManifestEntry {
    /// Create an entry from already-serialized fields
    #[must_use]
    pub fn new(path: impl Into<String>, mod_time: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mod_time: mod_time.into(),
        }
    }

    /// Build an entry from the live modification time of `path`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file metadata cannot be read
    /// - The path cannot be stored in the manifest (not UTF-8, or contains
    ///   `|` or a newline)
    pub fn from_file(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path)
            .map_err(|e| ExportError::io("read metadata of", path, e))?;
        let modified = metadata
            .modified()
            .map_err(|e| ExportError::io("read modification time of", path, e))?;

        let path_str = path.to_str().ok_or_else(|| {
            ExportError::Validation(format!(
                "Project path cannot be recorded in the manifest (not valid UTF-8): {}",
                path.display()
            ))
        })?;
        if path_str.contains(DELIMITER) || path_str.contains('\n') {
            return Err(ExportError::Validation(format!(
                "Project path cannot be recorded in the manifest (contains '{DELIMITER}' or a newline): {}",
                path.display()
            ))
            .into());
        }

        Ok(Self::new(path_str, format_mod_time(modified)))
    }
}

/// Serialize a modification time in the manifest's fixed textual layout
#[must_use]
pub fn format_mod_time(time: SystemTime) -> String {
    let time: DateTime<Utc> = time.into();
    time.format(MOD_TIME_FORMAT).to_string()
}

/// Ordered path -> modification time table
///
/// Insertion order is discovery order; lookups go through a path index so
/// classification stays linear in the number of walked files.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    /// Records in insertion order
    entries: Vec<ManifestEntry>,
    /// Path -> position in `entries`
    index: HashMap<String, usize>,
}

impl Manifest {
    /// Create an empty manifest
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the manifest holds no records (first run)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records in insertion order
    #[must_use]
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Look up the record for `path`
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&ManifestEntry> {
        self.index.get(path).map(|&i| &self.entries[i])
    }

    /// Append a record
    ///
    /// Returns `false` (and leaves the manifest untouched) if `path` is
    /// already present.
    pub fn push(&mut self, entry: ManifestEntry) -> bool {
        if self.index.contains_key(&entry.path) {
            return false;
        }
        self.index.insert(entry.path.clone(), self.entries.len());
        self.entries.push(entry);
        true
    }

    /// Parse manifest text. `origin` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::CorruptManifest`] if a line does not split into
    /// exactly two fields or a path appears twice.
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        let mut lines: Vec<&str> = content.split('\n').collect();
        if lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        let mut manifest = Self::new();
        for (i, line) in lines.into_iter().enumerate() {
            let fields: Vec<&str> = line.split(DELIMITER).collect();
            if fields.len() != 2 {
                return Err(ExportError::CorruptManifest {
                    path: origin.to_path_buf(),
                    line: i + 1,
                    reason: format!("expected 2 fields, found {}", fields.len()),
                }
                .into());
            }

            if !manifest.push(ManifestEntry::new(fields[0], fields[1])) {
                return Err(ExportError::CorruptManifest {
                    path: origin.to_path_buf(),
                    line: i + 1,
                    reason: format!("duplicate path {}", fields[0]),
                }
                .into());
            }
        }

        Ok(manifest)
    }

    /// Serialize to the on-disk text format
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.path);
            out.push(DELIMITER);
            out.push_str(&entry.mod_time);
            out.push('\n');
        }
        out
    }

    /// Load the manifest from disk
    ///
    /// Returns an empty manifest if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file exists but cannot be read
    /// - A record is malformed (see [`Manifest::parse`])
    pub fn load(path: &Path) -> Result<Self> {
        let span = span!(Level::DEBUG, "manifest_load", path = %path.display());
        let _guard = span.enter();

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                output::info(&format!("No manifest found at {}", path.display()));
                return Ok(Self::new());
            }
            Err(e) => return Err(ExportError::io("read manifest", path, e).into()),
        };

        let manifest = Self::parse(&content, path)?;
        debug!(entries = manifest.len(), "Manifest loaded");
        Ok(manifest)
    }

    /// Save the manifest, atomically replacing any previous file
    ///
    /// The records are written to a temporary file next to `path`, flushed,
    /// and then renamed over the destination, so an interrupted save never
    /// leaves a half-written manifest behind.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be created, written,
    /// flushed or renamed into place.
    pub fn save(&self, path: &Path) -> Result<()> {
        let span = span!(Level::DEBUG, "manifest_save", path = %path.display());
        let _guard = span.enter();

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)
            .map_err(|e| ExportError::io("create manifest directory", parent, e))?;

        let temp = NamedTempFile::new_in(parent)
            .map_err(|e| ExportError::io("create temporary manifest in", parent, e))?;

        {
            let mut writer = BufWriter::new(temp.as_file());
            writer
                .write_all(self.to_text().as_bytes())
                .map_err(|e| ExportError::io("write manifest", path, e))?;
            writer
                .flush()
                .map_err(|e| ExportError::io("flush manifest", path, e))?;
        }
        temp.as_file()
            .sync_all()
            .map_err(|e| ExportError::io("sync manifest", path, e))?;

        temp.persist(path)
            .map_err(|e| ExportError::io("replace manifest", path, e.error))
            .with_context(|| format!("Manifest left untouched at {}", path.display()))?;

        debug!(entries = self.len(), "Manifest saved");
        Ok(())
    }
}
