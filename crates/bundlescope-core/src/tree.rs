//! Bundle tree container and statistics.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::config::ScanConfig;
use crate::error::ScanWarning;
use crate::node::FileNode;

/// Summary statistics for a built tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    /// Total size in bytes.
    pub total_size: u64,
    /// Total number of files.
    pub total_files: u64,
    /// Total number of directories, not counting the root.
    pub total_dirs: u64,
    /// Maximum depth reached (root children are depth 1).
    pub max_depth: u32,
    /// Largest file (relative path, size).
    pub largest_file: Option<(CompactString, u64)>,
}

impl TreeStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive stats by walking a finished tree.
    pub fn from_root(root: &FileNode) -> Self {
        let mut stats = Self::new();
        stats.total_size = root.size;
        stats.visit(root, 0);
        stats
    }

    fn visit(&mut self, node: &FileNode, depth: u32) {
        if node.is_dir() {
            if depth > 0 {
                self.record_dir(depth);
            }
            for child in &node.children {
                self.visit(child, depth + 1);
            }
        } else {
            self.record_file(&node.relative_path, node.size, depth);
        }
    }

    /// Update stats with a file entry.
    pub fn record_file(&mut self, path: &str, size: u64, depth: u32) {
        self.total_files += 1;
        self.max_depth = self.max_depth.max(depth);

        if self.largest_file.as_ref().is_none_or(|(_, s)| size > *s) {
            self.largest_file = Some((path.into(), size));
        }
    }

    /// Record a directory.
    pub fn record_dir(&mut self, depth: u32) {
        self.total_dirs += 1;
        self.max_depth = self.max_depth.max(depth);
    }
}

/// A built bundle tree with scan metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleTree {
    /// Root node of the tree.
    pub root: FileNode,

    /// Absolute path that was scanned.
    pub root_path: PathBuf,

    /// When this scan was performed.
    pub scanned_at: SystemTime,

    /// Duration of the scan.
    pub scan_duration: Duration,

    /// Scan configuration used.
    pub config: ScanConfig,

    /// Summary statistics.
    pub stats: TreeStats,

    /// Entries skipped under [`crate::EntryPolicy::Skip`].
    #[serde(default)]
    pub warnings: Vec<ScanWarning>,
}

impl BundleTree {
    /// Create a new bundle tree, deriving its stats from the root.
    pub fn new(
        root: FileNode,
        root_path: PathBuf,
        config: ScanConfig,
        scan_duration: Duration,
        warnings: Vec<ScanWarning>,
    ) -> Self {
        let stats = TreeStats::from_root(&root);
        Self {
            root,
            root_path,
            scanned_at: SystemTime::now(),
            scan_duration,
            config,
            stats,
            warnings,
        }
    }

    /// Get the total size of the tree.
    pub fn total_size(&self) -> u64 {
        self.root.size
    }

    /// Get the total number of files.
    pub fn total_files(&self) -> u64 {
        self.stats.total_files
    }

    /// Get the total number of directories.
    pub fn total_dirs(&self) -> u64 {
        self.stats.total_dirs
    }

    /// Check if there were any warnings during scanning.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
