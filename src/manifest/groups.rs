//! Group hierarchy reconstruction.
//!
//! Groups reference their children by id from a flat list of objects. The
//! forest is rebuilt from text on every query: any edit may add groups or
//! shift children, so a forest parsed before an edit must not be reused.

use super::locator::{self, quote_if_needed};
use super::{Document, EditResult, GROUP_SECTION, IdGenerator, ManifestError};
use rand::Rng;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use tracing::debug;

/// A `PBXGroup` object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupNode {
    /// Object identifier
    pub id: String,
    /// Display name (`name` field, else the identifier comment)
    pub name: Option<String>,
    /// On-disk path segment (`path` field)
    pub path: Option<String>,
    /// `sourceTree` value
    pub source_tree: Option<String>,
    /// Ordered child identifiers
    pub children: Vec<String>,
}

impl GroupNode {
    /// Segment used to match directory names: the path, else the display name.
    #[must_use]
    pub fn segment(&self) -> Option<&str> {
        self.path.as_deref().or(self.name.as_deref())
    }

    /// Name shown to users.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.path.as_deref())
            .unwrap_or(&self.id)
    }
}

/// All groups of a document, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct GroupForest {
    nodes: BTreeMap<String, GroupNode>,
}

impl GroupForest {
    /// Parses every `PBXGroup` object of `doc`.
    #[must_use]
    pub fn parse(doc: &Document) -> Self {
        let text = doc.as_str();
        let nodes = doc
            .objects(GROUP_SECTION)
            .into_iter()
            .filter_map(|o| {
                let fields = o.fields(text);
                if fields.scalar("isa") != Some("PBXGroup") {
                    return None;
                }
                let node = GroupNode {
                    name: fields
                        .scalar("name")
                        .map(str::to_string)
                        .or_else(|| o.comment.clone()),
                    path: fields.scalar("path").map(str::to_string),
                    source_tree: fields.scalar("sourceTree").map(str::to_string),
                    children: fields
                        .list("children")
                        .map(|l| l.items.clone())
                        .unwrap_or_default(),
                    id: o.id,
                };
                Some((node.id.clone(), node))
            })
            .collect();
        Self { nodes }
    }

    /// Group `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&GroupNode> {
        self.nodes.get(id)
    }

    /// Groups in id order.
    pub fn iter(&self) -> impl Iterator<Item = &GroupNode> {
        self.nodes.values()
    }

    /// Child group of `parent` whose segment equals `segment`.
    #[must_use]
    pub fn child_with_segment(&self, parent: &str, segment: &str) -> Option<&GroupNode> {
        self.get(parent)?
            .children
            .iter()
            .filter_map(|id| self.get(id))
            .find(|g| g.segment() == Some(segment))
    }

    /// Groups listing `id` among their children.
    #[must_use]
    pub fn parents_of(&self, id: &str) -> Vec<&GroupNode> {
        self.iter()
            .filter(|g| g.children.iter().any(|c| c == id))
            .collect()
    }

    /// Finds a group by name or path, preferring direct children of `near`.
    #[must_use]
    pub fn find_named(&self, name: &str, near: &str) -> Option<&GroupNode> {
        let matches = |g: &&GroupNode| g.name.as_deref() == Some(name) || g.path.as_deref() == Some(name);
        self.get(near)
            .into_iter()
            .flat_map(|root| root.children.iter().filter_map(|id| self.get(id)))
            .find(matches)
            .or_else(|| self.iter().find(matches))
    }

    /// Directory a group stands for, relative to `root`.
    ///
    /// Concatenates the segment of every ancestor below `root`, the same
    /// segment [`resolve_or_create_path`] matches against, so a name-only
    /// group contributes its name. Returns `None` when `id` is not reachable
    /// from `root`.
    #[must_use]
    pub fn relative_dir(&self, root: &str, id: &str) -> Option<PathBuf> {
        let mut chain = Vec::new();
        let mut current = id;
        let mut seen = HashSet::new();
        while current != root {
            if !seen.insert(current) {
                return None;
            }
            let node = self.get(current)?;
            chain.push(node);
            let parent = self.parents_of(current).first().copied()?;
            current = parent.id.as_str();
        }

        let mut dir = PathBuf::new();
        for node in chain.iter().rev() {
            if let Some(segment) = node.segment() {
                dir.push(segment);
            }
        }
        Some(dir)
    }
}

/// Walks `segments` down from `root_id`, creating missing groups.
///
/// The forest is re-parsed for every segment because creating a group in an
/// earlier step changes the text the next lookup runs against. An empty
/// `segments` slice resolves to the root itself.
///
/// # Errors
///
/// Fails when `root_id` (or a group on the way) is not a `PBXGroup`, or when
/// the group section is absent.
pub fn resolve_or_create_path<R: Rng>(
    doc: Document,
    root_id: &str,
    segments: &[String],
    ids: &mut IdGenerator<R>,
) -> EditResult<(Document, String)> {
    let mut doc = doc;
    let mut current = root_id.to_string();

    for segment in segments {
        let forest = GroupForest::parse(&doc);
        let Some(parent) = forest.get(&current) else {
            return Err(ManifestError::missing(format!("group {current}")));
        };

        if let Some(child) = forest.child_with_segment(&current, segment) {
            current = child.id.clone();
            continue;
        }

        let id = ids.new_id(&doc);
        debug!(group = %id, parent = parent.display_name(), path = %segment, "creating group");
        create_group(&mut doc, &current, &id, segment)?;
        current = id;
    }

    Ok((doc, current))
}

/// Inserts an empty group `id` with path `segment` and links it under `parent`.
fn create_group(doc: &mut Document, parent: &str, id: &str, segment: &str) -> EditResult<()> {
    let comment = locator::comment_safe(segment);
    let entry = format!(
        "\t\t{id} /* {comment} */ = {{\n\
         \t\t\tisa = PBXGroup;\n\
         \t\t\tchildren = (\n\
         \t\t\t);\n\
         \t\t\tpath = {path};\n\
         \t\t\tsourceTree = \"<group>\";\n\
         \t\t}};\n",
        path = quote_if_needed(segment),
    );
    doc.insert_object(GROUP_SECTION, &entry)?;
    doc.append_to_list(GROUP_SECTION, parent, "children", id, segment)
}
