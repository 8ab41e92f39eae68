//! Catalog loading: the full command tree plus the selection manifest.
//!
//! Parsing is purely syntactic. Whether the names requested by the manifest
//! exist in the tree is decided later by the extractor.

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

const NAME_KEY: &str = "name";
const CHILDREN_KEY: &str = "children";

/// One node of the command tree.
///
/// `name` and `children` are the only fields the extractor reads; everything
/// else (descriptions, options, the internal `handler`) rides along untouched.
/// Serializing a node reproduces its source object: same keys, same order,
/// and `children` back in the slot it came from, even when it was `null`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct TreeNode {
    name: String,
    /// Every key except `children`, in document order.
    fields: Map<String, Value>,
    children: Vec<TreeNode>,
    children_slot: Option<ChildrenSlot>,
}

/// Where `children` sat among the other keys, and whether it was `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChildrenSlot {
    index: usize,
    null: bool,
}

impl TreeNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    /// First child named `name`, in document order.
    pub fn child(&self, name: &str) -> Option<&TreeNode> {
        find_by_name(self.children(), name)
    }

    fn children_at(&self, index: usize) -> bool {
        self.children_slot.is_some_and(|slot| slot.index == index)
    }

    fn serialize_children<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        match self.children_slot {
            Some(ChildrenSlot { null: true, .. }) => {
                map.serialize_entry(CHILDREN_KEY, &Value::Null)
            }
            _ => map.serialize_entry(CHILDREN_KEY, &self.children),
        }
    }
}

impl TryFrom<Map<String, Value>> for TreeNode {
    type Error = String;

    fn try_from(object: Map<String, Value>) -> Result<Self, Self::Error> {
        let name = match object.get(NAME_KEY) {
            Some(Value::String(name)) => name.clone(),
            Some(other) => return Err(format!("node name must be a string, got {other}")),
            None => return Err("node is missing a name".to_string()),
        };

        let mut fields = Map::new();
        let mut children = Vec::new();
        let mut children_slot = None;
        for (key, value) in object {
            if key != CHILDREN_KEY {
                fields.insert(key, value);
                continue;
            }
            children_slot = Some(ChildrenSlot {
                index: fields.len(),
                null: value.is_null(),
            });
            match value {
                Value::Null => {}
                Value::Array(items) => {
                    for item in items {
                        let Value::Object(child) = item else {
                            return Err(format!("child of node '{name}' is not an object"));
                        };
                        children.push(TreeNode::try_from(child)?);
                    }
                }
                _ => return Err(format!("children of node '{name}' must be an array or null")),
            }
        }

        Ok(Self {
            name,
            fields,
            children,
            children_slot,
        })
    }
}

impl Serialize for TreeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.fields.len() + usize::from(self.children_slot.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (index, (key, value)) in self.fields.iter().enumerate() {
            if self.children_at(index) {
                self.serialize_children(&mut map)?;
            }
            map.serialize_entry(key, value)?;
        }
        if self.children_at(self.fields.len()) {
            self.serialize_children(&mut map)?;
        }
        map.end()
    }
}

/// First-match-wins scan over a sibling list.
pub fn find_by_name<'a>(nodes: &'a [TreeNode], name: &str) -> Option<&'a TreeNode> {
    nodes.iter().find(|node| node.name == name)
}

#[derive(Debug, Deserialize)]
struct TreeDocument {
    data: TreeNode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionManifest {
    pub command_groups: Vec<String>,
    pub profiles: Vec<String>,
}

/// The fixed children of the `profiles` group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionCategory {
    Create,
    Delete,
    List,
    SetDefault,
    Update,
}

impl ActionCategory {
    pub const ALL: [ActionCategory; 5] = [
        Self::Create,
        Self::Delete,
        Self::List,
        Self::SetDefault,
        Self::Update,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Delete => "delete",
            Self::List => "list",
            Self::SetDefault => "set-default",
            Self::Update => "update",
        }
    }

    /// Name of the node holding `profile` under this action.
    ///
    /// `list` files its profile types under the plural name, built by appending
    /// a literal "s". No other pluralization rule applies.
    pub fn node_name(self, profile: &str) -> String {
        match self {
            Self::List => format!("{profile}s"),
            _ => profile.to_string(),
        }
    }
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Tree,
    Manifest,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tree => f.write_str("tree"),
            Self::Manifest => f.write_str("manifest"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse {kind} document {origin}")]
    Parse {
        kind: DocumentKind,
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("manifest {origin} requests '{name}', which cannot be used as an artifact file name")]
    UnsafeName { origin: String, name: String },
}

#[derive(Debug, Clone)]
pub struct Catalog {
    pub tree: TreeNode,
    pub manifest: SelectionManifest,
}

/// Parse a tree document; the node graph lives under its `data` field.
pub fn parse_tree(text: &str, origin: &str) -> Result<TreeNode, CatalogError> {
    serde_json::from_str::<TreeDocument>(text)
        .map(|document| document.data)
        .map_err(|source| CatalogError::Parse {
            kind: DocumentKind::Tree,
            origin: origin.to_string(),
            source,
        })
}

/// Parse a manifest. Every requested name becomes a file name inside the
/// output layout, so names that could escape their directory are rejected.
pub fn parse_manifest(text: &str, origin: &str) -> Result<SelectionManifest, CatalogError> {
    let manifest: SelectionManifest =
        serde_json::from_str(text).map_err(|source| CatalogError::Parse {
            kind: DocumentKind::Manifest,
            origin: origin.to_string(),
            source,
        })?;

    let mut requested = manifest.command_groups.iter().chain(&manifest.profiles);
    if let Some(name) = requested.find(|name| !is_safe_artifact_name(name)) {
        return Err(CatalogError::UnsafeName {
            origin: origin.to_string(),
            name: name.clone(),
        });
    }
    Ok(manifest)
}

/// A single plain path component: not empty, no separators, not `.` or `..`.
pub fn is_safe_artifact_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

pub fn load_manifest(path: &Path) -> Result<SelectionManifest> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(parse_manifest(&text, &path.display().to_string())?)
}

pub fn load_catalog(tree_path: &Path, manifest_path: &Path) -> Result<Catalog> {
    let manifest = load_manifest(manifest_path)?;
    let tree_text = fs::read_to_string(tree_path)
        .with_context(|| format!("failed to read {}", tree_path.display()))?;
    let tree = parse_tree(&tree_text, &tree_path.display().to_string())?;
    log::debug!(
        "loaded catalog: {} top-level groups, {} command groups and {} profiles requested",
        tree.children().len(),
        manifest.command_groups.len(),
        manifest.profiles.len()
    );

    Ok(Catalog { tree, manifest })
}
