//! In-memory manifest document and the primitives used to edit it.
//!
//! A [`Document`] is the full text of a `project.pbxproj` file. Reads go
//! through [`locator`], writes splice text at offsets computed against the
//! current text. Nothing is cached between edits.

/// Text-level edit planning and application.
pub mod edit;
/// Group hierarchy reconstruction and path resolution.
pub mod groups;
/// Object identifier generation.
pub mod ids;
/// Section, object and field location.
pub mod locator;

use anyhow::{Context, Result};
use memmap2::MmapOptions;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

pub use edit::{Editor, add_missing};
pub use groups::{GroupForest, GroupNode, resolve_or_create_path};
pub use ids::IdGenerator;

/// Section holding `PBXBuildFile` objects.
pub const BUILD_FILE_SECTION: &str = "PBXBuildFile";
/// Section holding `PBXFileReference` objects.
pub const FILE_REFERENCE_SECTION: &str = "PBXFileReference";
/// Section holding `PBXGroup` objects.
pub const GROUP_SECTION: &str = "PBXGroup";
/// Section holding `PBXNativeTarget` objects.
pub const NATIVE_TARGET_SECTION: &str = "PBXNativeTarget";
/// Section holding the `PBXProject` object.
pub const PROJECT_SECTION: &str = "PBXProject";
/// Section holding `PBXSourcesBuildPhase` objects.
pub const SOURCES_PHASE_SECTION: &str = "PBXSourcesBuildPhase";
/// Section present when Xcode manages folder contents itself.
pub const SYNCHRONIZED_GROUP_SECTION: &str = "PBXFileSystemSynchronizedRootGroup";

/// Source tree value for paths relative to the enclosing group.
pub const GROUP_SOURCE_TREE: &str = "<group>";

/// Files above this size are memory-mapped instead of read.
const MMAP_THRESHOLD: u64 = 1_048_576;

/// A required marker, section or object could not be found.
///
/// The document is assumed malformed; callers abort the project run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    /// Named marker, section or object is absent
    Missing(String),
    /// A file path has no usable file name
    InvalidPath(PathBuf),
}

impl ManifestError {
    pub(crate) fn missing(what: impl Into<String>) -> Self {
        Self::Missing(what.into())
    }
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(what) => write!(f, "{what} not found"),
            Self::InvalidPath(path) => write!(f, "invalid source file path: {}", path.display()),
        }
    }
}

impl std::error::Error for ManifestError {}

/// Result type for manifest edits.
pub type EditResult<T> = std::result::Result<T, ManifestError>;

/// Full text of a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    text: String,
}

impl Document {
    /// Wraps manifest text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Reads a manifest from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid UTF-8.
    pub fn load(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Failed to stat manifest: {}", path.display()))?;

        if metadata.len() < MMAP_THRESHOLD {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
            return Ok(Self::new(text));
        }

        let file = File::open(path)
            .with_context(|| format!("Failed to open manifest: {}", path.display()))?;
        // SAFETY: the map is only read for the duration of this call and copied out.
        let mmap = unsafe { MmapOptions::new().map(&file)? };
        let text = simdutf8::basic::from_utf8(&mmap)
            .map_err(|e| anyhow::anyhow!("Invalid UTF-8 in manifest {}: {e}", path.display()))?;
        Ok(Self::new(text))
    }

    /// Manifest text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consumes the document, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }

    /// Whether `id` occurs anywhere in the text.
    #[must_use]
    pub fn contains_id(&self, id: &str) -> bool {
        self.text.contains(id)
    }

    /// Objects of `section`, or an empty list when the section is absent.
    #[must_use]
    pub fn objects(&self, section: &str) -> Vec<locator::ObjectSpan> {
        locator::section_objects(&self.text, section)
    }

    /// Object `id` of `section`.
    #[must_use]
    pub fn find_object(&self, section: &str, id: &str) -> Option<locator::ObjectSpan> {
        locator::find_object(&self.text, section, id)
    }

    /// Identifier of the project's top-level group (`mainGroup`).
    ///
    /// # Errors
    ///
    /// Fails when the project object or its `mainGroup` reference is absent.
    pub fn main_group_id(&self) -> EditResult<String> {
        self.objects(PROJECT_SECTION)
            .iter()
            .find_map(|o| o.fields(&self.text).scalar("mainGroup").map(str::to_string))
            .ok_or_else(|| ManifestError::missing("mainGroup reference"))
    }

    /// Whether Xcode synchronizes folder contents itself.
    ///
    /// With a `group` name, only a synchronized root group with that name or
    /// path counts; without one, any synchronized root group does.
    #[must_use]
    pub fn is_host_synchronized(&self, group: Option<&str>) -> bool {
        let synced = self.objects(SYNCHRONIZED_GROUP_SECTION);
        match group {
            None => !synced.is_empty(),
            Some(name) => synced.iter().any(|o| {
                let fields = o.fields(&self.text);
                o.comment.as_deref() == Some(name)
                    || fields.scalar("path") == Some(name)
                    || fields.scalar("name") == Some(name)
            }),
        }
    }

    /// Inserts a pre-formatted object entry at the top of `section`.
    ///
    /// # Errors
    ///
    /// Fails when the section's Begin marker is absent.
    pub fn insert_object(&mut self, section: &str, entry: &str) -> EditResult<()> {
        let offset = locator::find_section(&self.text, section)
            .ok_or_else(|| ManifestError::missing(locator::section_begin_marker(section)))?;
        self.text.insert_str(offset, entry);
        Ok(())
    }

    /// Appends `item /* comment */,` to the list `key` of object `id`.
    ///
    /// A closing parenthesis on its own line gets a new line above it, indented
    /// one level deeper; an inline list gets the item before the parenthesis.
    ///
    /// # Errors
    ///
    /// Fails when the object or its list is absent.
    pub fn append_to_list(
        &mut self,
        section: &str,
        id: &str,
        key: &str,
        item: &str,
        comment: &str,
    ) -> EditResult<()> {
        let object = self
            .find_object(section, id)
            .ok_or_else(|| ManifestError::missing(format!("{section} object {id}")))?;
        let list = object
            .fields(&self.text)
            .list(key)
            .cloned()
            .ok_or_else(|| ManifestError::missing(format!("'{key}' list of {section} {id}")))?;

        let entry = format!("{item} /* {} */,", locator::comment_safe(comment));
        let line_start = self.text[..list.close].rfind('\n').map_or(0, |i| i + 1);
        let indent = &self.text[line_start..list.close];

        if line_start > list.open && indent.trim().is_empty() {
            let line = format!("{indent}\t{entry}\n");
            self.text.insert_str(line_start, &line);
        } else {
            self.text.insert_str(list.close, &format!("{entry} "));
        }
        Ok(())
    }

    /// All `PBXFileReference` objects.
    #[must_use]
    pub fn file_references(&self) -> Vec<FileReference> {
        self.objects(FILE_REFERENCE_SECTION)
            .into_iter()
            .filter_map(|o| {
                let fields = o.fields(&self.text);
                (fields.scalar("isa") == Some("PBXFileReference")).then(|| FileReference {
                    name: fields.scalar("name").map(str::to_string),
                    path: fields.scalar("path").map(str::to_string),
                    source_tree: fields.scalar("sourceTree").map(str::to_string),
                    comment: o.comment.clone(),
                    id: o.id,
                })
            })
            .collect()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A `PBXFileReference` object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    /// Object identifier
    pub id: String,
    /// Display name, when it differs from the path
    pub name: Option<String>,
    /// Path relative to `source_tree`
    pub path: Option<String>,
    /// `sourceTree` value
    pub source_tree: Option<String>,
    /// Comment after the identifier
    pub comment: Option<String>,
}

impl FileReference {
    /// Leaf file name: last component of the path, else the name or comment.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path
            .as_deref()
            .and_then(|p| p.rsplit('/').next())
            .or(self.name.as_deref())
            .or(self.comment.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// Whether the path is relative to the enclosing group.
    #[must_use]
    pub fn is_group_relative(&self) -> bool {
        self.source_tree.as_deref().is_none_or(|t| t == GROUP_SOURCE_TREE)
    }
}
