#![warn(missing_docs)]
// Allow pedantic strict lints that create false positives in this codebase
#![allow(clippy::arithmetic_side_effects)] // Counters and offsets stay within the manifest text
#![allow(clippy::indexing_slicing)] // Offsets come from the locator and are in bounds

//! # pbxsync - Xcode Project Manifest Sync
//!
//! pbxsync keeps a `project.pbxproj` in step with the source directory it
//! describes. Every source file on disk that the manifest does not reference
//! gets a file reference, a place in the group tree (creating groups as
//! needed), a build file and a slot in a Sources build phase.
//!
//! ## Features
//!
//! - **Text-preserving edits**: new entries are spliced into the original text;
//!   nothing else in the manifest changes
//! - **Group creation**: nested folders become nested groups on demand
//! - **Safe writes**: verified backup, locked and atomic replacement
//! - **Preview modes**: check, dry run and unified diff
//! - **Multiple projects**: named projects in one TOML configuration
//!
//! ## Architecture
//!
//! - [`manifest`]: Manifest locator, id generator, group tree and edits
//! - [`scanner`]: Source file discovery and the missing-file set
//! - [`commands`]: Sync and list commands, with their reports
//! - [`persist`]: Backup and atomic manifest replacement
//! - [`config`]: Configuration parsing and validation
//! - [`diff`]: Unified diff previews
//! - [`output`]: Console status output
//!
//! ## Example Usage
//!
//! ```no_run
//! use pbxsync::SyncContext;
//! use pbxsync::commands::sync::{self, Mode, SyncOptions};
//!
//! # fn main() -> anyhow::Result<()> {
//! let ctx = SyncContext::load(None)?;
//! let options = SyncOptions { mode: Mode::Check, ..SyncOptions::default() };
//! for project in ctx.config.select(&[], false)? {
//!     sync::execute(project, &options, &mut std::io::stdout())?;
//! }
//! # Ok(())
//! # }
//! ```

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Command implementations (sync, list).
pub mod commands;

/// Configuration parsing, validation, and management.
pub mod config;

/// Unified diff previews of manifest edits.
pub mod diff;

/// Error categories and exit codes.
pub mod error;

/// Manifest locking to prevent concurrent writes.
pub mod lock;

/// Manifest document, locator and edits.
pub mod manifest;

/// Console status output.
pub mod output;

/// Backup and replacement of manifests on disk.
pub mod persist;

/// Source file discovery and missing-file detection.
pub mod scanner;

/// Utility functions and helpers.
pub mod utils;

/// Test fixtures shared by unit tests.
pub mod test_utils;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Current version of the pbxsync binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "pbxsync.toml";

/// Configuration file path relative to the user's config directory.
pub const USER_CONFIG_PATH: &str = "pbxsync/config.toml";

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "PBXSYNC_CONFIG";

/// Loaded configuration and where it came from.
#[derive(Debug, Clone)]
pub struct SyncContext {
    /// Configuration file in use; `None` for an ad-hoc project.
    pub config_path: Option<PathBuf>,

    /// Loaded configuration settings.
    pub config: config::Config,
}

impl SyncContext {
    /// Loads configuration from `explicit`, or the first file found among
    /// `$PBXSYNC_CONFIG`, `./pbxsync.toml` and `~/.config/pbxsync/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no file is found or the file is
    /// invalid.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config_path = match explicit {
            Some(path) => path.to_path_buf(),
            None => Self::discover().ok_or_else(|| {
                error::SyncError::config(
                    "",
                    format!(
                        "no configuration found: pass --config, set {CONFIG_ENV}, create \
                         ./{LOCAL_CONFIG_FILE}, or use --source-dir with --manifest"
                    ),
                )
            })?,
        };

        let config = config::Config::load(&config_path)?;

        // Validate configuration and warn about issues
        let validator = config::validator::ConfigValidator::new();
        if let Err(e) = validator.validate_config_file(&config_path) {
            output::warning(&format!("Configuration validation failed: {e}"));
        }

        Ok(Self {
            config_path: Some(config_path),
            config,
        })
    }

    /// Context holding one project given directly by its paths.
    #[must_use]
    pub fn ad_hoc(source_dir: PathBuf, manifest: PathBuf) -> Self {
        let project = config::ProjectConfig::ad_hoc(source_dir, manifest);
        Self {
            config_path: None,
            config: config::Config::single(project),
        }
    }

    fn discover() -> Option<PathBuf> {
        let env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let local = Some(PathBuf::from(LOCAL_CONFIG_FILE));
        let user = dirs::config_dir().map(|dir| dir.join(USER_CONFIG_PATH));

        if env.is_some() {
            return env;
        }
        [local, user].into_iter().flatten().find(|p| p.is_file())
    }
}
