use anyhow::Result;
use colored::Colorize;
use similar::{Algorithm, TextDiff};
use std::io::Write;
use tracing::{Level, debug, span};

/// Configuration for unified diff generation
pub struct UnifiedDiffConfig {
    /// Number of context lines around changes (typically 3)
    pub context_lines: usize,
    /// Diff algorithm to use (Myers, Patience)
    pub algorithm: Algorithm,
    /// Maximum characters to keep; unlimited when `None`
    pub limit: Option<usize>,
}

impl Default for UnifiedDiffConfig {
    fn default() -> Self {
        Self {
            context_lines: 3,
            algorithm: Algorithm::Myers,
            limit: None,
        }
    }
}

/// Generate a unified diff between two manifest texts.
///
/// Produces plain unified diff text with:
/// - Headers (`--- <old_label>` and `+++ <new_label>`)
/// - Hunk headers (`@@ -10,7 +10,9 @@`)
/// - Context, deletion and addition lines
///
/// Identical inputs produce an empty string. Output longer than
/// `config.limit` characters is cut by [`truncate`].
#[must_use]
pub fn generate_unified_diff(
    old_content: &str,
    new_content: &str,
    old_label: &str,
    new_label: &str,
    config: &UnifiedDiffConfig,
) -> String {
    let span = span!(
        Level::DEBUG,
        "diff_generation",
        algorithm = ?config.algorithm,
        context = config.context_lines
    );
    let _guard = span.enter();

    let diff = TextDiff::configure()
        .algorithm(config.algorithm)
        .diff_lines(old_content, new_content);

    let text = diff
        .unified_diff()
        .context_radius(config.context_lines)
        .header(old_label, new_label)
        .to_string();

    debug!(chars = text.chars().count(), "Diff generation complete");

    match config.limit {
        Some(limit) => truncate(&text, limit),
        None => text,
    }
}

/// Cuts `text` to `limit` characters, noting how many were dropped.
///
/// The note goes on its own line: `... (N more characters)`.
#[must_use]
pub fn truncate(text: &str, limit: usize) -> String {
    let total = text.chars().count();
    if total <= limit {
        return text.to_string();
    }

    let cut = text.char_indices().nth(limit).map_or(text.len(), |(i, _)| i);
    let mut out = text[..cut].to_string();
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&format!("... ({} more characters)\n", total - limit));
    out
}

/// Writes diff text, coloring lines by their prefix when `colorize` is set.
///
/// # Errors
///
/// Returns an error if writing to the output writer fails.
pub fn write_colored(diff: &str, colorize: bool, writer: &mut dyn Write) -> Result<()> {
    if !colorize {
        writer.write_all(diff.as_bytes())?;
        return Ok(());
    }

    for line in diff.lines() {
        if line.starts_with("---") || line.starts_with("+++") {
            writeln!(writer, "{}", line.bold())?;
        } else if line.starts_with("@@") {
            writeln!(writer, "{}", line.cyan())?;
        } else if line.starts_with('+') {
            writeln!(writer, "{}", line.green())?;
        } else if line.starts_with('-') {
            writeln!(writer, "{}", line.red())?;
        } else if line.starts_with("...") {
            writeln!(writer, "{}", line.dimmed())?;
        } else {
            writeln!(writer, "{line}")?;
        }
    }
    Ok(())
}
