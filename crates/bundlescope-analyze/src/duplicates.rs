//! Duplicate file detection over a built tree.
//!
//! Every file already carries its content hash, so grouping needs no I/O:
//! files are bucketed by `(size, content_hash)` and any bucket with two or
//! more members is a duplicate group. One copy per group is counted as
//! legitimate; the rest is wasted space.

use std::collections::HashMap;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use bundlescope_core::{ContentHash, FileNode, NodeKind};

use crate::{files, percent_of};

/// A group of files sharing the same content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Content hash shared by all files in this group.
    pub content_hash: ContentHash,

    /// Size of each file in bytes.
    pub size: u64,

    /// Kind of the first file in the group.
    pub kind: NodeKind,

    /// Relative paths of all copies, sorted ascending.
    pub paths: Vec<CompactString>,

    /// Wasted space: size * (count - 1).
    pub wasted_space: u64,

    /// Wasted space as a percentage of the root size.
    pub wasted_percent: f64,
}

impl DuplicateGroup {
    /// Get the number of copies.
    pub fn count(&self) -> usize {
        self.paths.len()
    }

    /// Number of copies beyond the first.
    pub fn redundant_count(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }
}

/// Results from duplicate analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Groups sorted by wasted space descending.
    pub groups: Vec<DuplicateGroup>,

    /// Sum of every group's wasted space.
    pub total_wasted_space: u64,

    /// Total wasted space as a percentage of the root size.
    pub total_wasted_percent: f64,

    /// Number of files considered.
    pub files_analyzed: u64,

    /// Number of files that belong to some group.
    pub files_with_duplicates: u64,
}

impl DuplicateReport {
    /// Check if any duplicates were found.
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Get the number of groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Find the group containing a given path.
    pub fn group_for(&self, relative_path: &str) -> Option<&DuplicateGroup> {
        self.groups
            .iter()
            .find(|g| g.paths.iter().any(|p| p == relative_path))
    }
}

/// Group all files of the tree by `(size, content_hash)`.
pub fn find_duplicates(root: &FileNode) -> DuplicateReport {
    let mut buckets: HashMap<(u64, ContentHash), Vec<&FileNode>> = HashMap::new();
    let mut files_analyzed: u64 = 0;

    for node in files(root) {
        files_analyzed += 1;
        buckets
            .entry((node.size, node.content_hash))
            .or_default()
            .push(node);
    }

    let mut groups: Vec<DuplicateGroup> = buckets
        .into_iter()
        .filter(|(_, nodes)| nodes.len() >= 2)
        .map(|((size, content_hash), nodes)| {
            let mut paths: Vec<CompactString> =
                nodes.iter().map(|n| n.relative_path.clone()).collect();
            paths.sort();

            let wasted_space = size * (paths.len() as u64 - 1);
            DuplicateGroup {
                content_hash,
                size,
                kind: nodes[0].kind,
                paths,
                wasted_space,
                wasted_percent: percent_of(wasted_space, root.size),
            }
        })
        .collect();

    groups.sort_by(|a, b| {
        b.wasted_space
            .cmp(&a.wasted_space)
            .then_with(|| b.size.cmp(&a.size))
            .then_with(|| a.paths.first().cmp(&b.paths.first()))
    });

    let total_wasted_space: u64 = groups.iter().map(|g| g.wasted_space).sum();
    let files_with_duplicates: u64 = groups.iter().map(|g| g.paths.len() as u64).sum();

    DuplicateReport {
        total_wasted_percent: percent_of(total_wasted_space, root.size),
        groups,
        total_wasted_space,
        files_analyzed,
        files_with_duplicates,
    }
}
