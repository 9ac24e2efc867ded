//! Diff generation for manifest previews.
//!
//! This module provides unified diff generation with support for:
//! - Line-by-line diffs with context
//! - Truncation of long output
//! - Colorized output

/// Unified diff generation for manifest text
pub mod unified;

pub use unified::{UnifiedDiffConfig, generate_unified_diff, truncate, write_colored};
