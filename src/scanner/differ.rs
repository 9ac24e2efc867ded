use crate::config::{MatchMode, ProjectConfig};
use crate::manifest::edit::resolution_root;
use crate::manifest::{Document, EditResult, FileReference, GroupForest};
use crate::utils::slash_path;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Files of `candidates` the manifest does not reference yet.
///
/// In [`MatchMode::Filename`] a file counts as present when any file
/// reference has the same leaf name, wherever it lives. In
/// [`MatchMode::Path`] it counts as present only when a group-relative file
/// reference reachable from the resolution root maps to the same relative
/// path. Candidate order is preserved.
///
/// # Errors
///
/// In path mode, fails when the resolution root cannot be located.
pub fn missing_files(
    doc: &Document,
    candidates: &[PathBuf],
    project: &ProjectConfig,
) -> EditResult<Vec<PathBuf>> {
    let missing = match project.match_mode {
        MatchMode::Filename => {
            let known = referenced_names(doc);
            candidates
                .iter()
                .filter(|p| {
                    !p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| known.contains(n))
                })
                .cloned()
                .collect()
        }
        MatchMode::Path => {
            let root = resolution_root(doc, project)?;
            let known = referenced_paths(doc, &root);
            candidates
                .iter()
                .filter(|p| !known.contains(p.as_path()))
                .cloned()
                .collect()
        }
    };
    Ok(missing)
}

/// Keeps the files whose `/`-separated relative path matches `pattern`.
///
/// `*` and `?` stop at `/`, so `Bridge/*` selects the files directly in
/// `Bridge`; `Bridge/**/*` reaches nested directories too.
#[must_use]
pub fn filter_only(files: Vec<PathBuf>, pattern: &glob::Pattern) -> Vec<PathBuf> {
    let options = glob::MatchOptions {
        require_literal_separator: true,
        ..glob::MatchOptions::new()
    };
    files
        .into_iter()
        .filter(|p| pattern.matches_with(&slash_path(p), options))
        .collect()
}

fn referenced_names(doc: &Document) -> HashSet<String> {
    doc.file_references()
        .iter()
        .filter_map(FileReference::file_name)
        .map(str::to_string)
        .collect()
}

/// Relative paths of group-relative file references below `root`.
fn referenced_paths(doc: &Document, root: &str) -> HashSet<PathBuf> {
    let refs: HashMap<String, FileReference> = doc
        .file_references()
        .into_iter()
        .map(|r| (r.id.clone(), r))
        .collect();
    let forest = GroupForest::parse(doc);

    let mut paths = HashSet::new();
    for group in forest.iter() {
        let Some(dir) = forest.relative_dir(root, &group.id) else {
            continue;
        };
        for child in &group.children {
            let Some(file) = refs.get(child).filter(|r| r.is_group_relative()) else {
                continue;
            };
            if let Some(path) = &file.path {
                paths.insert(dir.join(Path::new(path)));
            }
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Editor;
    use crate::test_utils::fixtures::{sample_document, sample_project, seeded_ids};

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_filename_mode_ignores_location() {
        let project = sample_project("/src");
        let candidates = paths(&["App.swift", "Elsewhere/ContentView.swift", "New.swift"]);
        let missing = missing_files(&sample_document(), &candidates, &project).unwrap();
        assert_eq!(missing, paths(&["New.swift"]));
    }

    #[test]
    fn test_path_mode_compares_relative_paths() {
        let mut project = sample_project("/src");
        project.match_mode = MatchMode::Path;
        let candidates = paths(&[
            "App.swift",
            "Views/ContentView.swift",
            "Elsewhere/ContentView.swift",
            "AppTests/AppTests.swift",
        ]);
        let missing = missing_files(&sample_document(), &candidates, &project).unwrap();
        assert_eq!(missing, paths(&["Elsewhere/ContentView.swift"]));
    }

    #[test]
    fn test_path_mode_settles_under_name_only_group() {
        let mut project = sample_project("/src");
        project.match_mode = MatchMode::Path;
        let candidates = paths(&["Products/Helper.swift"]);

        let first = missing_files(&sample_document(), &candidates, &project).unwrap();
        assert_eq!(first, candidates);
        let doc = Editor::with_ids(&project, seeded_ids())
            .add_missing(sample_document(), &first)
            .unwrap();

        assert!(missing_files(&doc, &candidates, &project).unwrap().is_empty());
        let helpers = doc
            .file_references()
            .iter()
            .filter(|r| r.file_name() == Some("Helper.swift"))
            .count();
        assert_eq!(helpers, 1);
    }

    #[test]
    fn test_path_mode_requires_root() {
        let mut project = sample_project("/src");
        project.match_mode = MatchMode::Path;
        let doc = Document::new(sample_document().into_string().replace("mainGroup", "x"));
        assert!(missing_files(&doc, &paths(&["A.swift"]), &project).is_err());
    }

    #[test]
    fn test_filter_only_bridge_scenario() {
        let pattern = glob::Pattern::new("Bridge/*").unwrap();
        let files = paths(&["Bridge/A.swift", "Other/B.swift"]);
        assert_eq!(filter_only(files, &pattern), paths(&["Bridge/A.swift"]));
    }

    #[test]
    fn test_filter_only_star_stops_at_separator() {
        let files = paths(&["Bridge/A.swift", "Bridge/Sub/C.swift"]);

        let direct = glob::Pattern::new("Bridge/*").unwrap();
        assert_eq!(filter_only(files.clone(), &direct), paths(&["Bridge/A.swift"]));

        let nested = glob::Pattern::new("Bridge/**/*").unwrap();
        assert_eq!(filter_only(files.clone(), &nested), files);
    }
}
