//! Utility functions and helpers.
//!
//! - Path manipulation (tilde expansion, relative paths, display form)

use std::path::{Path, PathBuf};

/// Expands a leading `~` to the user's home directory.
///
/// Paths without a tilde, and all paths when no home directory is known, are
/// returned unchanged.
#[must_use]
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Some(path_str) = path.to_str() else {
        return path.to_path_buf();
    };
    let Some(home) = dirs::home_dir() else {
        return path.to_path_buf();
    };

    if path_str == "~" {
        home
    } else if let Some(rest) = path_str.strip_prefix("~/") {
        home.join(rest)
    } else {
        path.to_path_buf()
    }
}

/// Make `path` relative to `base` if possible, otherwise return `path` as is.
#[must_use]
pub fn make_relative(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base)
        .map_or_else(|_| path.to_path_buf(), Path::to_path_buf)
}

/// Relative path with `/` separators, as used for glob matching and display.
#[must_use]
pub fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
