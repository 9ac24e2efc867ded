use std::fmt;
use std::path::{Path, PathBuf};

/// Categorized failures of a sync run.
///
/// Every variant aborts the run for the affected project. None of them leave a
/// partially written manifest behind: structural and configuration errors are
/// raised before anything touches disk, and I/O errors during apply happen
/// before the original manifest is replaced.
#[derive(Debug)]
pub enum SyncError {
    /// Unknown project, missing source directory or manifest, unreadable config
    Config {
        /// Project the error belongs to (empty when not project specific)
        project: String,
        /// What went wrong
        message: String,
    },
    /// A required manifest section or object could not be located
    Structural {
        /// Project the error belongs to
        project: String,
        /// Manifest that was being edited
        manifest: PathBuf,
        /// The marker, section or object that is missing
        missing: String,
    },
    /// Backup or write failure while committing the new manifest
    Io {
        /// Project the error belongs to
        project: String,
        /// File that could not be read or written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl SyncError {
    /// Builds a configuration error.
    pub fn config(project: &str, message: impl Into<String>) -> Self {
        Self::Config {
            project: project.to_string(),
            message: message.into(),
        }
    }

    /// Builds a structural error for a marker that is absent from `manifest`.
    pub fn structural(project: &str, manifest: &Path, missing: impl Into<String>) -> Self {
        Self::Structural {
            project: project.to_string(),
            manifest: manifest.to_path_buf(),
            missing: missing.into(),
        }
    }

    /// Builds an I/O error for `path`.
    pub fn io(project: &str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            project: project.to_string(),
            path: path.to_path_buf(),
            source,
        }
    }

    /// Process exit code for this error category.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::Structural { .. } => 3,
            Self::Io { .. } => 4,
        }
    }

    /// Short category name used in log fields.
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Structural { .. } => "structural",
            Self::Io { .. } => "io",
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { project, message } if project.is_empty() => {
                write!(f, "configuration error: {message}")
            }
            Self::Config { project, message } => {
                write!(f, "configuration error in project '{project}': {message}")
            }
            Self::Structural {
                project,
                manifest,
                missing,
            } => write!(
                f,
                "malformed manifest for project '{project}': {missing} not found in {}",
                manifest.display()
            ),
            Self::Io {
                project,
                path,
                source,
            } => write!(
                f,
                "I/O error in project '{project}' on {}: {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Picks the exit code for an error chain, falling back to 1.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<SyncError>())
        .map_or(1, SyncError::exit_code)
}
