/// Set difference between files on disk and files the manifest references.
pub mod differ;

/// Source file discovery with directory pruning.
pub mod source_files;

pub use differ::{filter_only, missing_files};
pub use source_files::scan;
