//! Incremental change tracking for project trees.
//!
//! # Architecture
//!
//! - [`crate::tracking::Manifest`] - Persisted path -> modification time table
//! - [`crate::tracking::classify`] - Decides whether a file changed since the last run
//! - [`crate::tracking::TreeWalker`] - Walks the source tree, exports changed files
//!   and builds the next manifest
//!
//! # Usage
//!
//! ```no_run
//! use asexport::exporter::ProcessExporter;
//! use asexport::tracking::{Manifest, TreeWalker};
//! use std::path::{Path, PathBuf};
//!
//! # fn main() -> anyhow::Result<()> {
//! let previous = Manifest::load(Path::new("/home/me/.asexport.db"))?;
//! let exporter = ProcessExporter::new(PathBuf::from("/usr/bin/aseprite"));
//!
//! let walker = TreeWalker::new(PathBuf::from("/home/me/art"), PathBuf::from("/home/me/export"));
//! let report = walker.walk(&previous, &exporter)?;
//! report.manifest.save(Path::new("/home/me/.asexport.db"))?;
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod manifest;
pub mod walker;

pub use classify::{Classification, classify};
pub use manifest::{Manifest, ManifestEntry};
pub use walker::{TreeWalker, WalkOptions, WalkReport};
