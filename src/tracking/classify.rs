//! Change classification of project files against the previous manifest.

use crate::tracking::manifest::{Manifest, ManifestEntry};
use std::fmt;

/// Outcome of comparing a freshly observed file against the old manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Recorded before, with a different modification time
    Modified,
    /// Recorded before with the same modification time; export is skipped
    NotModified,
    /// Not recorded in a non-empty manifest (a new file)
    NotFound,
    /// The previous manifest is empty (first run)
    Empty,
}

impl Classification {
    /// Whether a file with this classification has to be exported
    #[must_use]
    pub const fn needs_export(self) -> bool {
        !matches!(self, Self::NotModified)
    }

    /// Short label used in status output
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Modified => "modified",
            Self::NotModified => "unchanged",
            Self::NotFound | Self::Empty => "new",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify `current` against `previous`
///
/// Paths are unique within a manifest (enforced on load), so a single
/// lookup decides the outcome.
#[must_use]
pub fn classify(current: &ManifestEntry, previous: &Manifest) -> Classification {
    if previous.is_empty() {
        return Classification::Empty;
    }

    match previous.get(&current.path) {
        Some(old) if old.mod_time == current.mod_time => Classification::NotModified,
        Some(_) => Classification::Modified,
        None => Classification::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn previous() -> Manifest {
        let mut manifest = Manifest::new();
        manifest.push(ManifestEntry::new("/art/hero.aseprite", "T1"));
        manifest.push(ManifestEntry::new("/art/tiles.aseprite", "T9"));
        manifest
    }

    #[test]
    fn test_empty_manifest() {
        let entry = ManifestEntry::new("/art/hero.aseprite", "T1");
        let result = classify(&entry, &Manifest::new());
        assert_eq!(result, Classification::Empty);
        assert!(result.needs_export());
    }

    #[test]
    fn test_same_mod_time_is_not_modified() {
        let entry = ManifestEntry::new("/art/hero.aseprite", "T1");
        let result = classify(&entry, &previous());
        assert_eq!(result, Classification::NotModified);
        assert!(!result.needs_export());
    }

    #[test]
    fn test_different_mod_time_is_modified() {
        let entry = ManifestEntry::new("/art/hero.aseprite", "T2");
        let result = classify(&entry, &previous());
        assert_eq!(result, Classification::Modified);
        assert!(result.needs_export());
    }

    #[test]
    fn test_unknown_path_is_not_found() {
        let entry = ManifestEntry::new("/art/villain.aseprite", "T1");
        let result = classify(&entry, &previous());
        assert_eq!(result, Classification::NotFound);
        assert!(result.needs_export());
    }

    #[test]
    fn test_comparison_is_textual() {
        // Same instant, different rendering: still counts as a change
        let entry = ManifestEntry::new("/art/hero.aseprite", "T1 ");
        assert_eq!(classify(&entry, &previous()), Classification::Modified);
    }
}
