use crate::config::ProjectConfig;
use crate::diff::{UnifiedDiffConfig, generate_unified_diff, write_colored};
use crate::error::SyncError;
use crate::manifest::{Document, Editor, ManifestError};
use crate::{output, persist, scanner};
use anyhow::{Context, Result};
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, instrument};

/// What a run does once the missing files are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// List missing files only
    Check,
    /// Plan the edit in memory and report how many files it adds
    DryRun,
    /// Plan the edit and print a unified diff
    Diff,
    /// Plan the edit, back up the manifest and write it
    #[default]
    Apply,
}

/// How one project run behaves.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// What to do with the missing files
    pub mode: Mode,
    /// Restricts missing files to relative paths matching this glob
    pub only: Option<glob::Pattern>,
    /// Maximum characters of diff output
    pub diff_limit: Option<usize>,
    /// Color diff output
    pub colorize: bool,
}

/// Result of one project run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Xcode synchronizes the folder itself; nothing was examined
    HostManaged,
    /// Every source file is already referenced
    InSync,
    /// Check mode found these missing files
    Reported {
        /// Relative paths, in scan order
        missing: Vec<PathBuf>,
    },
    /// Dry run planned this many additions
    Planned {
        /// Files that would be added
        added: usize,
    },
    /// Diff mode planned this many additions
    Diffed {
        /// Files shown in the diff
        added: usize,
    },
    /// The manifest was rewritten
    Applied {
        /// Files added
        added: usize,
        /// Copy of the manifest as it was before
        backup: PathBuf,
    },
}

/// Brings one project's manifest in line with its source directory.
///
/// Reports go to `out`.
///
/// # Errors
///
/// Returns a [`SyncError`] for missing paths (configuration), unlocatable
/// manifest structure (structural) or backup and write failures (I/O); other
/// failures such as an unreadable manifest are plain errors.
#[instrument(skip_all, fields(project = %project.name, mode = ?options.mode))]
pub fn execute(
    project: &ProjectConfig,
    options: &SyncOptions,
    out: &mut dyn Write,
) -> Result<Outcome> {
    project.check_paths()?;

    let original = Document::load(&project.manifest)?;
    if original.is_host_synchronized(project.synchronized_group.as_deref()) {
        super::print_success(
            out,
            "Project uses synchronized folders, Xcode picks up new files itself",
        )?;
        return Ok(Outcome::HostManaged);
    }

    output::info(&format!("Scanning {}...", project.source_dir.display()));
    let candidates = scanner::scan(&project.source_dir, &project.skip_dirs, &project.extensions)
        .with_context(|| format!("Failed to scan project '{}'", project.name))?;

    let mut missing = scanner::missing_files(&original, &candidates, project)
        .map_err(|e| structural(project, e))?;
    if let Some(pattern) = &options.only {
        missing = scanner::filter_only(missing, pattern);
    }

    if missing.is_empty() {
        super::print_success(out, "All files in sync")?;
        info!(scanned = candidates.len(), "in sync");
        return Ok(Outcome::InSync);
    }

    report_missing(out, &missing)?;

    let added = missing.len();
    let plan = || {
        Editor::new(project)
            .add_missing(original.clone(), &missing)
            .map_err(|e| structural(project, e))
    };

    match options.mode {
        Mode::Check => {
            writeln!(out, "Run without --check to add them")?;
            Ok(Outcome::Reported { missing })
        }
        Mode::Diff => {
            write_diff(project, &original, &plan()?, options, out)?;
            Ok(Outcome::Diffed { added })
        }
        Mode::DryRun => {
            plan()?;
            writeln!(out, "Dry run - no changes made")?;
            writeln!(out, "Would add {added} file(s) to project")?;
            Ok(Outcome::Planned { added })
        }
        Mode::Apply => {
            let backup = persist::commit(project, &original, &plan()?)?;
            super::print_success(out, &format!("Added {added} file(s)"))?;
            writeln!(out, "  Backup: {}", backup.display())?;
            info!(added, backup = %backup.display(), "applied");
            Ok(Outcome::Applied { added, backup })
        }
    }
}

fn report_missing(out: &mut dyn Write, missing: &[PathBuf]) -> Result<()> {
    writeln!(
        out,
        "{}",
        format!("Missing from project ({}):", missing.len()).yellow()
    )?;
    writeln!(out)?;
    for path in missing {
        writeln!(out, "  {}", crate::utils::slash_path(path))?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_diff(
    project: &ProjectConfig,
    original: &Document,
    updated: &Document,
    options: &SyncOptions,
    out: &mut dyn Write,
) -> Result<()> {
    let label = project
        .manifest
        .file_name()
        .map_or_else(|| "project.pbxproj".into(), |n| n.to_string_lossy());
    let config = UnifiedDiffConfig {
        limit: options.diff_limit,
        ..UnifiedDiffConfig::default()
    };
    let diff = generate_unified_diff(
        original.as_str(),
        updated.as_str(),
        &format!("{label} (before)"),
        &format!("{label} (after)"),
        &config,
    );

    if !diff.is_empty() {
        writeln!(out, "Changes:")?;
        write_colored(&diff, options.colorize, out)?;
    }
    Ok(())
}

fn structural(project: &ProjectConfig, err: ManifestError) -> SyncError {
    let missing = match err {
        ManifestError::Missing(what) => what,
        other @ ManifestError::InvalidPath(_) => other.to_string(),
    };
    SyncError::structural(&project.name, &project.manifest, missing)
}
