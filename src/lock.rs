//! Manifest locking to prevent concurrent runs from interleaving writes
//!
//! A sibling `<manifest>.lock` file is locked exclusively for the duration of
//! backup and write. Locks are automatically released when dropped.

use anyhow::{Context, Result, bail};
use fs4::fs_std::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Holds an exclusive lock on one manifest
///
/// The lock is automatically released when this struct is dropped.
#[derive(Debug)]
pub struct ManifestLock {
    /// Lock file handle
    lock_file: File,
    /// Path to the lock file (for error messages)
    lock_path: PathBuf,
}

impl ManifestLock {
    /// Acquire the exclusive lock for `manifest`
    ///
    /// Retries for a short while when another process holds the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create the lock file
    /// - Another run still holds the lock when the timeout expires
    pub fn acquire(manifest: &Path) -> Result<Self> {
        let lock_path = lock_path(manifest);
        let lock_file = Self::try_acquire_lock(&lock_path)?;
        debug!(lock = %lock_path.display(), "acquired manifest lock");
        Ok(Self {
            lock_file,
            lock_path,
        })
    }

    fn try_acquire_lock(lock_path: &Path) -> Result<File> {
        // Use shorter timeouts in test mode for faster test execution
        let lock_timeout = if cfg!(test) {
            Duration::from_millis(100)
        } else {
            Duration::from_secs(10)
        };
        let retry_interval = if cfg!(test) {
            Duration::from_millis(10)
        } else {
            Duration::from_millis(100)
        };

        let start = Instant::now();

        loop {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(lock_path)
                .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;

            match file.try_lock_exclusive() {
                Ok(true) => {
                    let mut file_ref = &file;
                    let _ = writeln!(file_ref, "pid={}", std::process::id());
                    return Ok(file);
                }
                Ok(false) | Err(_) if start.elapsed() < lock_timeout => {
                    std::thread::sleep(retry_interval);
                }
                Ok(false) | Err(_) => {
                    bail!(
                        "Another pbxsync run is writing this manifest. \
                         Wait for it to finish or remove the stale lock at: {}",
                        lock_path.display()
                    );
                }
            }
        }
    }

    /// Path of the lock file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for ManifestLock {
    fn drop(&mut self) {
        let _ = self.lock_file.unlock();

        if let Err(e) = fs::remove_file(&self.lock_path) {
            warn!(lock = %self.lock_path.display(), error = %e, "failed to remove lock file");
        }
    }
}

/// `<manifest>.lock`
#[must_use]
pub fn lock_path(manifest: &Path) -> PathBuf {
    let mut name = manifest.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}
