//! Adding source files to a manifest.
//!
//! Each file becomes four linked edits: a file reference, a child entry in its
//! parent group, a build file pointing at the reference, and a membership slot
//! in the Sources build phase. Every edit recomputes its offsets against the
//! text produced by the previous one.

use super::groups::{GroupForest, resolve_or_create_path};
use super::locator::{comment_safe, quote_if_needed};
use super::{
    BUILD_FILE_SECTION, Document, EditResult, FILE_REFERENCE_SECTION, GROUP_SECTION, IdGenerator,
    ManifestError, NATIVE_TARGET_SECTION, SOURCES_PHASE_SECTION,
};
use crate::config::ProjectConfig;
use crate::utils::make_relative;
use rand::Rng;
use rand::rngs::ThreadRng;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, instrument};

/// Applies file additions for one project.
pub struct Editor<'a, R: Rng = ThreadRng> {
    project: &'a ProjectConfig,
    ids: IdGenerator<R>,
}

impl<'a> Editor<'a> {
    /// Editor with a thread-local id generator.
    #[must_use]
    pub fn new(project: &'a ProjectConfig) -> Self {
        Self::with_ids(project, IdGenerator::new())
    }
}

impl<'a, R: Rng> Editor<'a, R> {
    /// Editor with a caller-supplied id generator.
    pub fn with_ids(project: &'a ProjectConfig, ids: IdGenerator<R>) -> Self {
        Self { project, ids }
    }

    /// Adds one source file to `doc`.
    ///
    /// `path` is relative to the project's source directory (absolute paths
    /// under it are accepted too). Missing parent groups are created.
    ///
    /// # Errors
    ///
    /// Fails when a required section, the root group or the Sources build
    /// phase cannot be located, or when `path` has no file name.
    #[instrument(skip(self, doc), fields(project = %self.project.name))]
    pub fn add_file(&mut self, doc: Document, path: &Path) -> EditResult<Document> {
        let rel = make_relative(path, &self.project.source_dir);
        let filename = rel
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ManifestError::InvalidPath(path.to_path_buf()))?;
        let segments = dir_segments(&rel);

        let root = resolution_root(&doc, self.project)?;
        let (mut doc, parent) = resolve_or_create_path(doc, &root, &segments, &mut self.ids)?;

        let phase = sources_phase_id(&doc, self.project.target.as_deref())?;
        let file_ref_id = self.ids.new_id(&doc);
        let build_file_id = self.ids.new_id(&doc);
        let comment = comment_safe(&filename);

        let file_ref = format!(
            "\t\t{file_ref_id} /* {comment} */ = {{isa = PBXFileReference; lastKnownFileType = {kind}; path = {path}; sourceTree = \"<group>\"; }};\n",
            kind = quote_if_needed(&self.project.file_type),
            path = quote_if_needed(&filename),
        );
        doc.insert_object(FILE_REFERENCE_SECTION, &file_ref)?;
        doc.append_to_list(GROUP_SECTION, &parent, "children", &file_ref_id, &filename)?;

        let build_file = format!(
            "\t\t{build_file_id} /* {comment} in Sources */ = {{isa = PBXBuildFile; fileRef = {file_ref_id} /* {comment} */; }};\n"
        );
        doc.insert_object(BUILD_FILE_SECTION, &build_file)?;
        doc.append_to_list(
            SOURCES_PHASE_SECTION,
            &phase,
            "files",
            &build_file_id,
            &format!("{filename} in Sources"),
        )?;

        debug!(
            file = %rel.display(),
            file_ref = %file_ref_id,
            build_file = %build_file_id,
            group = %parent,
            "added file"
        );
        Ok(doc)
    }

    /// Adds every file of `files`, sorted by file name then path.
    ///
    /// # Errors
    ///
    /// Stops at the first file that cannot be added; see [`Self::add_file`].
    pub fn add_missing(&mut self, doc: Document, files: &[PathBuf]) -> EditResult<Document> {
        let mut ordered: Vec<&PathBuf> = files.iter().collect();
        ordered.sort_by(|a, b| a.file_name().cmp(&b.file_name()).then_with(|| a.cmp(b)));

        let doc = ordered
            .into_iter()
            .try_fold(doc, |doc, path| self.add_file(doc, path))?;
        info!(project = %self.project.name, added = files.len(), "planned additions");
        Ok(doc)
    }
}

/// Adds all `files` using a thread-local id generator.
///
/// # Errors
///
/// See [`Editor::add_missing`].
pub fn add_missing(
    doc: Document,
    files: &[PathBuf],
    project: &ProjectConfig,
) -> EditResult<Document> {
    Editor::new(project).add_missing(doc, files)
}

/// Directory components of a relative path, without the file name.
#[must_use]
pub fn dir_segments(rel: &Path) -> Vec<String> {
    rel.parent()
        .map(|dir| {
            dir.components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Group that stands for the project's source directory.
///
/// This is the configured source group when there is one, otherwise the
/// project's `mainGroup`.
///
/// # Errors
///
/// Fails when `mainGroup` is absent or the configured source group does not
/// exist.
pub fn resolution_root(doc: &Document, project: &ProjectConfig) -> EditResult<String> {
    let main = doc.main_group_id()?;
    let Some(name) = project.source_group.as_deref() else {
        return Ok(main);
    };

    GroupForest::parse(doc)
        .find_named(name, &main)
        .map(|g| g.id.clone())
        .ok_or_else(|| ManifestError::missing(format!("source group '{name}'")))
}

/// The Sources build phase new files join.
///
/// With a target name, the phase listed in that target's `buildPhases`;
/// otherwise the first `PBXSourcesBuildPhase` of the document.
///
/// # Errors
///
/// Fails when no matching Sources build phase exists.
pub fn sources_phase_id(doc: &Document, target: Option<&str>) -> EditResult<String> {
    let text = doc.as_str();
    let phases = doc.objects(SOURCES_PHASE_SECTION);

    let Some(target) = target else {
        return phases
            .iter()
            .find(|o| o.fields(text).scalar("isa") == Some("PBXSourcesBuildPhase"))
            .map(|o| o.id.clone())
            .ok_or_else(|| ManifestError::missing("PBXSourcesBuildPhase"));
    };

    doc.objects(NATIVE_TARGET_SECTION)
        .iter()
        .map(|o| (o, o.fields(text)))
        .find(|(o, fields)| {
            fields.scalar("name") == Some(target) || o.comment.as_deref() == Some(target)
        })
        .and_then(|(_, fields)| {
            fields.list("buildPhases").and_then(|list| {
                list.items
                    .iter()
                    .find(|id| phases.iter().any(|p| &p.id == *id))
                    .cloned()
            })
        })
        .ok_or_else(|| ManifestError::missing(format!("Sources build phase of target '{target}'")))
}
