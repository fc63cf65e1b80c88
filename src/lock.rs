//! Run locking to prevent two exports from sharing one manifest
//!
//! An export run holds an exclusive advisory lock on `<manifest>.lock` for
//! its whole duration. Dropping the guard releases the lock and leaves the
//! lock file in place, so every run locks the same inode.

use crate::errors::ExportError;
use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

/// Holds the exclusive run lock for a manifest
///
/// The lock is automatically released when this struct is dropped.
#[derive(Debug)]
pub struct RunLock {
    /// Lock file handle
    lock_file: File,
    /// Path to the lock file (for error messages)
    lock_path: PathBuf,
    /// Topmost directory created to hold the lock file, if any
    created_dir: Option<PathBuf>,
}

impl RunLock {
    /// Lock file guarding `manifest_path`
    ///
    /// # Errors
    ///
    /// Returns an error if `manifest_path` has no file name.
    pub fn lock_path_for(manifest_path: &Path) -> Result<PathBuf> {
        let name = manifest_path.file_name().ok_or_else(|| {
            ExportError::Validation(format!(
                "Manifest path has no file name: {}",
                manifest_path.display()
            ))
        })?;
        let mut lock_name = OsString::from(name);
        lock_name.push(".lock");
        Ok(manifest_path.with_file_name(lock_name))
    }

    /// Acquire the run lock for `manifest_path`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The lock file cannot be created
    /// - Another run holds the lock past the timeout
    pub fn acquire(manifest_path: &Path) -> Result<Self> {
        let lock_path = Self::lock_path_for(manifest_path)?;
        let mut created_dir = None;
        if let Some(parent) = lock_path.parent()
            && !parent.as_os_str().is_empty()
        {
            created_dir = first_missing_ancestor(parent);
            fs::create_dir_all(parent)
                .map_err(|e| ExportError::io("create manifest directory", parent, e))?;
        }

        let lock_file = Self::try_acquire_lock(&lock_path)?;

        Ok(Self {
            lock_file,
            lock_path,
            created_dir,
        })
    }

    /// Release the lock and undo its footprint on disk
    ///
    /// Removes the lock file and every directory [`RunLock::acquire`] created
    /// for it, for runs that end without touching anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file or a created directory cannot be
    /// removed.
    pub fn discard(mut self) -> Result<()> {
        let created_dir = self.created_dir.take();
        let lock_path = self.lock_path.clone();

        fs::remove_file(&lock_path).map_err(|e| ExportError::io("remove", &lock_path, e))?;
        drop(self);

        let (Some(top), Some(parent)) = (created_dir, lock_path.parent()) else {
            return Ok(());
        };
        for dir in parent.ancestors() {
            fs::remove_dir(dir).map_err(|e| ExportError::io("remove", dir, e))?;
            if dir == top.as_path() {
                break;
            }
        }
        Ok(())
    }

    /// Path of the held lock file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.lock_path
    }

    /// Try to acquire the lock file
    fn try_acquire_lock(lock_path: &Path) -> Result<File> {
        // Use shorter timeouts in test mode for faster test execution
        let lock_timeout = if cfg!(test) {
            Duration::from_millis(100)
        } else {
            Duration::from_secs(2)
        };
        let retry_interval = Duration::from_millis(10);

        let start = Instant::now();

        loop {
            let file = fs::OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(lock_path)
                .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;

            match file.try_lock_exclusive() {
                Ok(true) => {
                    // Record the holder for anyone inspecting a lingering lock
                    use std::io::Write;
                    let mut file_ref = &file;
                    let _ = file.set_len(0);
                    let _ = writeln!(
                        file_ref,
                        "pid={}\ntime={}",
                        std::process::id(),
                        humantime::format_rfc3339(SystemTime::now())
                    );
                    return Ok(file);
                }
                Ok(false) | Err(_) if start.elapsed() < lock_timeout => {
                    std::thread::sleep(retry_interval);
                }
                Ok(false) | Err(_) => {
                    return Err(ExportError::Validation(format!(
                        "Another export is already running against this manifest. \
                         Wait for it to finish or remove the stale lock at: {}",
                        lock_path.display()
                    ))
                    .into());
                }
            }
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.lock_file) {
            tracing::warn!(
                path = %self.lock_path.display(),
                error = %e,
                "Failed to release lock"
            );
        }
    }
}

/// Outermost ancestor of `dir` (possibly `dir` itself) that does not exist yet
fn first_missing_ancestor(dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .take_while(|d| !d.as_os_str().is_empty() && !d.exists())
        .last()
        .map(Path::to_path_buf)
}
