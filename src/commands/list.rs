use crate::config::Config;
use anyhow::Result;
use colored::Colorize;
use std::io::Write;

/// Prints every configured project, marking the default one.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn execute(config: &Config, out: &mut dyn Write) -> Result<()> {
    if config.projects.is_empty() {
        super::print_info(out, "No projects configured")?;
        return Ok(());
    }

    let default = config.core.default_project.as_deref();
    for (name, project) in &config.projects {
        let marker = if Some(name.as_str()) == default { "*" } else { " " };
        writeln!(out, "{} {}", marker.green().bold(), name.bold())?;
        writeln!(out, "    source:   {}", project.source_dir.display())?;
        writeln!(out, "    manifest: {}", project.manifest.display())?;
        if let Some(target) = &project.target {
            writeln!(out, "    target:   {target}")?;
        }
        if !(project.source_dir.is_dir() && project.manifest.is_file()) {
            super::print_warning(out, "paths not found on disk")?;
        }
    }
    Ok(())
}
