//! Analytics over built bundle trees.
//!
//! This crate derives read-only views from a [`FileNode`] tree:
//!
//! - **Largest files** - every non-empty file, largest first
//! - **Largest modules** - every non-empty directory below the root
//! - **Type breakdown** - total size and count per [`NodeKind`]
//! - **Duplicates** - files grouped by size and content hash
//!
//! It also splices asset-catalog rendition listings into a tree for
//! display, see [`enrich_asset_catalogs`].
//!
//! ```rust,ignore
//! use bundlescope_analyze::Analyzer;
//!
//! let root = bundlescope_scan::build("/path/to/App.app")?;
//! let report = Analyzer::new().analyze(&root);
//!
//! for entry in report.top_files(10) {
//!     println!("{} {}", entry.relative_path, entry.size);
//! }
//! println!("Wasted space: {} bytes", report.duplicates.total_wasted_space);
//! ```

mod breakdown;
mod duplicates;
mod enrich;
mod ranking;

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use breakdown::{TypeBreakdown, TypeShare, type_breakdown};
pub use duplicates::{DuplicateGroup, DuplicateReport, find_duplicates};
pub use enrich::{
    AssetDuplicate, AssetRendition, PACKED_ASSET_PREFIX, enrich_asset_catalogs,
    find_asset_duplicates, merge, rendition_nodes,
};
pub use ranking::{RankedEntry, largest_files, largest_modules};

// Re-export core types
pub use bundlescope_core::{ContentHash, FileNode, NodeKind};

/// All four analytics views for one tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub largest_files: Vec<RankedEntry>,
    pub largest_modules: Vec<RankedEntry>,
    pub type_breakdown: TypeBreakdown,
    pub duplicates: DuplicateReport,
    /// Size of the analyzed root.
    pub root_size: u64,
}

impl AnalyticsReport {
    /// The `n` largest files.
    pub fn top_files(&self, n: usize) -> impl Iterator<Item = &RankedEntry> {
        self.largest_files.iter().take(n)
    }

    /// The `n` largest modules.
    pub fn top_modules(&self, n: usize) -> impl Iterator<Item = &RankedEntry> {
        self.largest_modules.iter().take(n)
    }
}

/// Computes an [`AnalyticsReport`] for a tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct Analyzer;

impl Analyzer {
    /// Create a new analyzer.
    pub fn new() -> Self {
        Self
    }

    /// Compute every view. The views are independent and run in parallel.
    pub fn analyze(&self, root: &FileNode) -> AnalyticsReport {
        let start = Instant::now();

        let ((largest_files, largest_modules), (type_breakdown, duplicates)) = rayon::join(
            || rayon::join(|| largest_files(root), || largest_modules(root)),
            || rayon::join(|| type_breakdown(root), || find_duplicates(root)),
        );

        debug!(
            files = largest_files.len(),
            modules = largest_modules.len(),
            duplicate_groups = duplicates.group_count(),
            elapsed = ?start.elapsed(),
            "Analytics complete"
        );

        AnalyticsReport {
            largest_files,
            largest_modules,
            type_breakdown,
            duplicates,
            root_size: root.size,
        }
    }
}

/// Non-directory nodes reachable from `root` through directories only.
///
/// A non-directory root yields itself.
pub(crate) fn files(root: &FileNode) -> impl Iterator<Item = &FileNode> {
    walk(root).filter(|node| !node.is_dir())
}

/// Directory nodes of the tree, root included.
pub(crate) fn directories(root: &FileNode) -> impl Iterator<Item = &FileNode> {
    walk(root).filter(|node| node.is_dir())
}

/// Pre-order walk that never enters a non-directory node's children.
fn walk(root: &FileNode) -> impl Iterator<Item = &FileNode> {
    let mut stack = vec![root];
    std::iter::from_fn(move || {
        let node = stack.pop()?;
        if node.is_dir() {
            stack.extend(node.children.iter().rev());
        }
        Some(node)
    })
}

/// `part` as a percentage of `whole`, or 0 when `whole` is 0.
pub(crate) fn percent_of(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
