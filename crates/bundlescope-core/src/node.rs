//! Bundle content nodes.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

use crate::hash::ContentHash;

/// Semantic category of a node.
///
/// A closed taxonomy: directories are always [`NodeKind::Directory`] and
/// files whose extension is not recognized fall back to [`NodeKind::Binary`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeKind {
    /// Directory (aggregate of its children).
    Directory,
    /// Font file.
    Font,
    /// Localized strings.
    Localization,
    /// Compiled or source asset catalog.
    AssetCatalog,
    /// Video file.
    Video,
    /// CoreML model.
    CoremlModel,
    /// Anything else.
    Binary,
}

impl NodeKind {
    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, NodeKind::Directory)
    }

    /// Stable snake_case label, as used in serialized output.
    pub fn label(&self) -> &'static str {
        self.into()
    }
}

/// Per-rendition metadata carried by synthetic asset-catalog nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionInfo {
    /// Device idiom (e.g. `phone`, `pad`, `universal`).
    pub idiom: CompactString,
    /// Display scale factor.
    pub scale: u32,
    /// Compression scheme reported by the catalog inspector.
    pub compression: CompactString,
}

/// One entry of the bundle, relative to the bundle root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    /// Slash-separated path from the bundle root. Empty for the root.
    pub relative_path: CompactString,

    /// Size in bytes: byte length for files, sum of children for directories.
    pub size: u64,

    /// Content digest: bytes for files, combined child digests for directories.
    pub content_hash: ContentHash,

    /// Semantic category.
    pub kind: NodeKind,

    /// Children sorted by name ascending (directories only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileNode>,

    /// Rendition metadata for synthetic asset-catalog nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendition: Option<RenditionInfo>,
}

impl FileNode {
    /// Create a new file node.
    pub fn new_file(
        relative_path: impl Into<CompactString>,
        kind: NodeKind,
        size: u64,
        content_hash: ContentHash,
    ) -> Self {
        Self {
            relative_path: relative_path.into(),
            size,
            content_hash,
            kind,
            children: Vec::new(),
            rendition: None,
        }
    }

    /// Create a directory node from children that are already in name order.
    ///
    /// Size and hash are derived from the children.
    pub fn new_directory(relative_path: impl Into<CompactString>, children: Vec<FileNode>) -> Self {
        let size = children.iter().map(|c| c.size).sum();
        let content_hash = ContentHash::combine(children.iter().map(|c| &c.content_hash));
        Self {
            relative_path: relative_path.into(),
            size,
            content_hash,
            kind: NodeKind::Directory,
            children,
            rendition: None,
        }
    }

    /// Check if this node is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Check if this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Check if this node is the bundle root.
    pub fn is_root(&self) -> bool {
        self.relative_path.is_empty()
    }

    /// Final path component (empty for the root).
    pub fn name(&self) -> &str {
        self.relative_path
            .rsplit_once('/')
            .map_or(self.relative_path.as_str(), |(_, name)| name)
    }

    /// Get the number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Number of non-directory nodes in this subtree (1 for a file).
    ///
    /// Does not descend into non-directory nodes.
    pub fn file_count(&self) -> u64 {
        if self.is_dir() {
            self.children.iter().map(FileNode::file_count).sum()
        } else {
            1
        }
    }

    /// Depth-first pre-order iterator over this node and its descendants.
    pub fn iter(&self) -> impl Iterator<Item = &FileNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Find a node by exact relative path.
    pub fn find(&self, relative_path: &str) -> Option<&FileNode> {
        self.iter().find(|n| n.relative_path == relative_path)
    }

    /// Find a node by exact relative path, mutably.
    pub fn find_mut(&mut self, relative_path: &str) -> Option<&mut FileNode> {
        if self.relative_path == relative_path {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(relative_path))
    }
}
