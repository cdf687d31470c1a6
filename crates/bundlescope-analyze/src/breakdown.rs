//! Size breakdown by node kind.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use bundlescope_core::{FileNode, NodeKind};

use crate::{files, percent_of};

/// Size and count totals for one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeShare {
    /// Kind these totals belong to.
    pub kind: NodeKind,
    /// Total size of files of this kind.
    pub total_size: u64,
    /// Number of files of this kind.
    pub file_count: u64,
    /// Share of the root size, in percent (0 when the root is empty).
    pub percentage: f64,
}

/// Per-kind totals, largest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeBreakdown {
    /// Entries sorted by total size descending, then by kind label.
    pub entries: Vec<TypeShare>,
    /// Root size used as the percentage denominator.
    pub root_size: u64,
}

impl TypeBreakdown {
    /// Look up the totals for one kind.
    pub fn get(&self, kind: NodeKind) -> Option<&TypeShare> {
        self.entries.iter().find(|e| e.kind == kind)
    }

    /// Sum of all entry sizes.
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.total_size).sum()
    }

    /// Iterate over the entries in order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeShare> {
        self.entries.iter()
    }
}

/// Accumulate file sizes per kind.
///
/// Directories are never counted, only files. Percentages use the root's
/// size as denominator rather than the sum of the entries.
pub fn type_breakdown(root: &FileNode) -> TypeBreakdown {
    let mut totals: BTreeMap<NodeKind, (u64, u64)> = BTreeMap::new();
    for node in files(root) {
        let (size, count) = totals.entry(node.kind).or_default();
        *size += node.size;
        *count += 1;
    }

    let mut entries: Vec<TypeShare> = totals
        .into_iter()
        .map(|(kind, (total_size, file_count))| TypeShare {
            kind,
            total_size,
            file_count,
            percentage: percent_of(total_size, root.size),
        })
        .collect();
    entries.sort_by(|a, b| {
        b.total_size
            .cmp(&a.total_size)
            .then_with(|| a.kind.label().cmp(b.kind.label()))
    });

    TypeBreakdown {
        entries,
        root_size: root.size,
    }
}
