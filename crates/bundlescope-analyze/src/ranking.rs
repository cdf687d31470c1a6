//! Largest-file and largest-module rankings.

use std::cmp::Ordering;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use bundlescope_core::{ContentHash, FileNode, NodeKind};

use crate::{directories, files};

/// One ranked node, detached from the tree it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// Relative path of the node.
    pub relative_path: CompactString,
    /// Size in bytes (aggregate for modules).
    pub size: u64,
    /// Kind of the node.
    pub kind: NodeKind,
    /// Content hash of the node.
    pub content_hash: ContentHash,
    /// Number of files in the subtree (1 for a file).
    pub file_count: u64,
}

impl RankedEntry {
    /// Snapshot a node.
    pub fn from_node(node: &FileNode) -> Self {
        Self {
            relative_path: node.relative_path.clone(),
            size: node.size,
            kind: node.kind,
            content_hash: node.content_hash,
            file_count: node.file_count(),
        }
    }
}

/// Every file with a non-zero size, largest first.
///
/// Ties are broken by relative path so the order is reproducible. The
/// full sequence is returned; truncation is up to the caller.
pub fn largest_files(root: &FileNode) -> Vec<RankedEntry> {
    let mut ranked: Vec<RankedEntry> = files(root)
        .filter(|node| node.size > 0)
        .map(RankedEntry::from_node)
        .collect();
    ranked.sort_by(by_size_then_path);
    ranked
}

/// Every non-empty directory below the root, largest aggregate first.
pub fn largest_modules(root: &FileNode) -> Vec<RankedEntry> {
    let mut ranked: Vec<RankedEntry> = directories(root)
        .filter(|node| !std::ptr::eq(*node, root) && node.size > 0)
        .map(RankedEntry::from_node)
        .collect();
    ranked.sort_by(by_size_then_path);
    ranked
}

fn by_size_then_path(a: &RankedEntry, b: &RankedEntry) -> Ordering {
    b.size
        .cmp(&a.size)
        .then_with(|| a.relative_path.cmp(&b.relative_path))
}
