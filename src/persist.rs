//! Committing an edited manifest to disk.
//!
//! The sequence is: lock, confirm the file still holds the text that was
//! edited, write and verify a byte-identical backup, then replace the manifest
//! through a temp file in the same directory. A failure at any step leaves the
//! original manifest untouched.

use crate::config::ProjectConfig;
use crate::error::SyncError;
use crate::lock::ManifestLock;
use crate::manifest::Document;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

/// `<manifest>.backup`
#[must_use]
pub fn backup_path(manifest: &Path) -> PathBuf {
    let mut name = manifest.as_os_str().to_os_string();
    name.push(".backup");
    PathBuf::from(name)
}

/// Writes `updated` over the project's manifest, keeping `original` as backup.
///
/// Returns the backup path.
///
/// # Errors
///
/// Returns [`SyncError::Io`] when the lock cannot be taken, the manifest
/// changed since `original` was read, the backup cannot be written or does
/// not read back identically, or the replacement cannot be written.
pub fn commit(
    project: &ProjectConfig,
    original: &Document,
    updated: &Document,
) -> Result<PathBuf, SyncError> {
    commit_with(project, original, updated, replace)
}

/// [`commit`] with the final write step supplied by the caller.
#[instrument(skip_all, fields(project = %project.name))]
fn commit_with<W>(
    project: &ProjectConfig,
    original: &Document,
    updated: &Document,
    write: W,
) -> Result<PathBuf, SyncError>
where
    W: FnOnce(&Path, &str) -> io::Result<()>,
{
    let manifest = &project.manifest;
    let io_err = |path: &Path, e: io::Error| SyncError::io(&project.name, path, e);

    let lock = ManifestLock::acquire(manifest)
        .map_err(|e| io_err(manifest, io::Error::new(io::ErrorKind::WouldBlock, e.to_string())))?;

    let on_disk = fs::read(manifest).map_err(|e| io_err(manifest, e))?;
    if on_disk != original.as_str().as_bytes() {
        return Err(io_err(
            manifest,
            io::Error::other("manifest changed on disk since it was read"),
        ));
    }

    let backup = backup_path(manifest);
    write_backup(&backup, original.as_str()).map_err(|e| io_err(&backup, e))?;
    debug!(backup = %backup.display(), "backup verified");

    write(manifest, updated.as_str()).map_err(|e| io_err(manifest, e))?;
    drop(lock);

    info!(manifest = %manifest.display(), "manifest written");
    Ok(backup)
}

fn write_backup(backup: &Path, text: &str) -> io::Result<()> {
    fs::write(backup, text)?;
    if fs::read(backup)? != text.as_bytes() {
        return Err(io::Error::other("backup does not match the original manifest"));
    }
    Ok(())
}

fn replace(manifest: &Path, text: &str) -> io::Result<()> {
    let dir = manifest.parent().unwrap_or_else(|| Path::new("."));
    let permissions = fs::metadata(manifest)?.permissions();

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(text.as_bytes())?;
    tmp.as_file().sync_all()?;
    fs::set_permissions(tmp.path(), permissions)?;
    tmp.persist(manifest).map_err(|e| e.error)?;
    Ok(())
}
