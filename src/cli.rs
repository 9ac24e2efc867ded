//! Command-line interface definitions for pbxsync.
//!
//! This module contains the CLI argument structure using clap's derive macros.
//! The definition is shared between the main binary and build tools (like xtask)
//! for man page generation.
//!
//! Note: Field-level documentation is provided via clap attributes (#[arg(help = "...")]),
//! so we allow missing_docs for this module to avoid redundant documentation.

#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use crate::commands::sync::Mode;
use clap::{ArgGroup, Parser};
use clap_complete::Shell;
use std::path::PathBuf;

/// Main CLI structure for pbxsync.
#[derive(Parser, Debug)]
#[command(
    name = "pbxsync",
    version = crate::VERSION,
    about = "Add source files missing from Xcode project manifests",
    long_about = "Scans source directories and adds every file the project.pbxproj does not \
                  reference yet: file reference, group membership, build file and Sources \
                  build phase entry. Missing groups are created along the way."
)]
#[command(group(ArgGroup::new("mode").args(["check", "dry_run", "diff"])))]
pub struct Cli {
    /// Projects to sync (default: core.default_project)
    #[arg(value_name = "PROJECT", conflicts_with = "all")]
    pub projects: Vec<String>,

    /// Sync every configured project
    #[arg(long)]
    pub all: bool,

    /// List missing files without changing anything
    #[arg(long)]
    pub check: bool,

    /// Plan the changes and report how many files would be added
    #[arg(long)]
    pub dry_run: bool,

    /// Print a unified diff of the planned changes without writing
    #[arg(long)]
    pub diff: bool,

    /// Only add missing files whose relative path matches this glob
    #[arg(long, value_name = "GLOB")]
    pub only: Option<String>,

    /// Configuration file to use
    #[arg(short, long, value_name = "PATH", env = "PBXSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Source directory of an ad-hoc project (requires --manifest)
    #[arg(long, value_name = "DIR", requires = "manifest")]
    pub source_dir: Option<PathBuf>,

    /// Manifest of an ad-hoc project (requires --source-dir)
    #[arg(long, value_name = "FILE", requires = "source_dir")]
    pub manifest: Option<PathBuf>,

    /// List configured projects and exit
    #[arg(long)]
    pub list: bool,

    /// Show verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

impl Cli {
    /// Run mode selected by the mode flags.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        if self.check {
            Mode::Check
        } else if self.diff {
            Mode::Diff
        } else if self.dry_run {
            Mode::DryRun
        } else {
            Mode::Apply
        }
    }
}
