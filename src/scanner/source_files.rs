use anyhow::{Result, bail};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Directory suffix of project bundles, never descended into.
const PROJECT_BUNDLE_SUFFIX: &str = ".xcodeproj";

/// Find source files below `source_dir`
///
/// Performs a single-pass traversal that prunes, before descending:
/// - directories whose name is listed in `skip_dirs`
/// - project bundles (names ending in `.xcodeproj`)
///
/// Entries that cannot be read are skipped. A file is collected when its
/// extension is one of `extensions` (compared without the dot).
///
/// # Returns
/// Paths relative to `source_dir`, sorted lexicographically
///
/// # Errors
///
/// Returns an error if `source_dir` is not a directory
pub fn scan(source_dir: &Path, skip_dirs: &[String], extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !source_dir.is_dir() {
        bail!("Source directory not found: {}", source_dir.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(source_dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_type().is_dir() || !is_pruned(e, skip_dirs))
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                debug!(error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| is_source_file(e, extensions))
        .filter_map(|e| e.path().strip_prefix(source_dir).ok().map(Path::to_path_buf))
        .collect();

    files.sort();
    debug!(dir = %source_dir.display(), found = files.len(), "scan complete");
    Ok(files)
}

fn is_pruned(entry: &DirEntry, skip_dirs: &[String]) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.ends_with(PROJECT_BUNDLE_SUFFIX) || skip_dirs.iter().any(|d| *d == name)
}

fn is_source_file(entry: &DirEntry, extensions: &[String]) -> bool {
    let is_file = entry.file_type().is_file()
        || (entry.path_is_symlink() && entry.path().is_file());
    is_file
        && entry
            .path()
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| extensions.iter().any(|e| e == ext))
}
