#![allow(dead_code)]

use anyhow::Result;
use asexport::exporter::{ExportRequest, Exporter};
use filetime::FileTime;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// One recorded exporter invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportCall {
    pub source: PathBuf,
    pub scale: u32,
    pub trim: bool,
    pub save_as: PathBuf,
}

/// Exporter double recording every call, optionally failing on one file
#[derive(Default)]
pub struct RecordingExporter {
    pub calls: RefCell<Vec<ExportCall>>,
    pub fail_on: Option<String>,
}

impl RecordingExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail when exporting a file whose name ends with `suffix`
    pub fn failing_on(suffix: &str) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            fail_on: Some(suffix.to_string()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn exported_sources(&self) -> Vec<PathBuf> {
        self.calls.borrow().iter().map(|c| c.source.clone()).collect()
    }
}

impl Exporter for RecordingExporter {
    fn export(&self, request: &ExportRequest<'_>) -> Result<Vec<u8>> {
        self.calls.borrow_mut().push(ExportCall {
            source: request.source.to_path_buf(),
            scale: request.scale,
            trim: request.trim,
            save_as: request.save_as.to_path_buf(),
        });

        if let Some(suffix) = &self.fail_on
            && request.source.to_string_lossy().ends_with(suffix.as_str())
        {
            anyhow::bail!("renderer crashed on {}", request.source.display());
        }
        Ok(Vec::new())
    }
}

/// Source/target/manifest layout inside a temporary directory
pub struct TestTree {
    pub temp_dir: TempDir,
    pub source: PathBuf,
    pub target: PathBuf,
    pub manifest: PathBuf,
}

impl TestTree {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let source = temp_dir.path().join("art");
        let target = temp_dir.path().join("export");
        let manifest = temp_dir.path().join("state/modtimes.db");

        fs::create_dir_all(&source)?;
        fs::create_dir_all(&target)?;

        Ok(Self {
            temp_dir,
            source,
            target,
            manifest,
        })
    }

    /// Create a project file under the source root with a fixed mtime
    pub fn create_project(&self, rel: &str) -> Result<PathBuf> {
        let path = self.source.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, b"ASEPRITE")?;
        set_mtime(&path, 1_700_000_000)?;
        Ok(path)
    }

    /// Create a non-project file under the source root
    pub fn create_other(&self, rel: &str) -> Result<PathBuf> {
        let path = self.source.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, b"notes")?;
        Ok(path)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }
}

/// Set the modification time of `path` to `secs` after the epoch
pub fn set_mtime(path: &Path, secs: i64) -> Result<()> {
    filetime::set_file_mtime(path, FileTime::from_unix_time(secs, 0))?;
    Ok(())
}
