//! Export destination naming from project file paths.
//!
//! A project file `<source>/<sub>/<name>.aseprite` is exported into its own
//! directory `<target>/<source-name>/<sub>/<name>`. The file name suffix picks
//! the output pattern handed to the export tool:
//!
//! | suffix | pattern                             | trim |
//! |--------|-------------------------------------|------|
//! | `_t_s` | `{layer}-[t={tag}][f={frame}].png`  | yes  |
//! | `_s`   | `{layer}-[t={tag}][f={frame}].png`  | no   |
//! | `_t`   | `<name minus _t>-[t={tag}][f={frame}].png` | yes |
//! | none   | `<name>-[t={tag}][f={frame}].png`   | no   |

use std::path::{Path, PathBuf};

/// Default frame/tag part of exported file names
pub const DEFAULT_FILENAME_FORMAT: &str = "[t={tag}][f={frame}].png";

/// Placeholder the export tool replaces with the layer name
pub const LAYER_PLACEHOLDER: &str = "{layer}";

/// Suffix enabling both trimming and per-layer output
const TRIM_SPLIT_SUFFIX: &str = "_t_s";
/// Suffix enabling per-layer output
const SPLIT_SUFFIX: &str = "_s";
/// Suffix enabling trimming
const TRIM_SUFFIX: &str = "_t";

/// Where and how a single project file is exported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDirective {
    /// Directory receiving this file's rendered images
    pub export_dir: PathBuf,
    /// File name pattern inside `export_dir`, still holding tool placeholders
    pub file_pattern: String,
    /// Whether transparent margins are trimmed
    pub trim: bool,
}

impl ExportDirective {
    /// Full `--save-as` pattern (`export_dir/file_pattern`)
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.export_dir.join(&self.file_pattern)
    }
}

/// Derives export directives using a configurable frame/tag format
#[derive(Debug, Clone)]
pub struct NamingResolver {
    /// Trailing part of every output file name
    filename_format: String,
}

impl Default for NamingResolver {
    fn default() -> Self {
        Self::new(DEFAULT_FILENAME_FORMAT)
    }
}

impl NamingResolver {
    /// Create a resolver appending `filename_format` to every output name
    #[must_use]
    pub fn new(filename_format: impl Into<String>) -> Self {
        Self {
            filename_format: filename_format.into(),
        }
    }

    /// Resolve the export directive of `file` found under `source_root`
    ///
    /// The path relative to the *parent* of `source_root` is mirrored under
    /// `export_root`, so the source root's own name becomes the first
    /// directory of the exported tree.
    #[must_use]
    pub fn resolve(&self, source_root: &Path, file: &Path, export_root: &Path) -> ExportDirective {
        let relative = tree_relative(source_root, file);
        let export_dir = export_root.join(relative.with_extension(""));

        let base_name = export_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let format = &self.filename_format;
        let (file_pattern, trim) = if base_name.ends_with(TRIM_SPLIT_SUFFIX) {
            (format!("{LAYER_PLACEHOLDER}-{format}"), true)
        } else if base_name.ends_with(SPLIT_SUFFIX) {
            (format!("{LAYER_PLACEHOLDER}-{format}"), false)
        } else if let Some(stripped) = base_name.strip_suffix(TRIM_SUFFIX) {
            (format!("{stripped}-{format}"), true)
        } else {
            (format!("{base_name}-{format}"), false)
        };

        ExportDirective {
            export_dir,
            file_pattern,
            trim,
        }
    }
}

/// Resolve with the default file name format
#[must_use]
pub fn resolve(source_root: &Path, file: &Path, export_root: &Path) -> ExportDirective {
    NamingResolver::default().resolve(source_root, file, export_root)
}

/// Strip the parent of `source_root` from `file`
fn tree_relative(source_root: &Path, file: &Path) -> PathBuf {
    let base = source_root.parent().unwrap_or(source_root);
    file.strip_prefix(base).unwrap_or(file).to_path_buf()
}
