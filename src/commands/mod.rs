pub mod list;
pub mod sync;

use colored::Colorize;
use std::io::{self, Write};

pub fn print_success(out: &mut dyn Write, message: &str) -> io::Result<()> {
    writeln!(out, "{} {}", "✓".green().bold(), message)
}

pub fn print_info(out: &mut dyn Write, message: &str) -> io::Result<()> {
    writeln!(out, "{} {}", "ℹ".blue().bold(), message)
}

pub fn print_warning(out: &mut dyn Write, message: &str) -> io::Result<()> {
    writeln!(out, "{} {}", "⚠".yellow().bold(), message)
}
