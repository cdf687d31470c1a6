//! Bundle tree builder for bundlescope.
//!
//! This crate walks an already-extracted bundle directory and builds the
//! content model: every entry gets a size, a SHA-256 content hash and a
//! [`NodeKind`].
//!
//! # Overview
//!
//! - **Parallel listing** via jwalk
//! - **Parallel hashing** of leaf files on a bounded rayon pool
//! - **Deterministic output**: children sorted by name, directory hashes
//!   combined over that order
//! - **Fail fast**: the first unreadable entry aborts the build
//!
//! # Example
//!
//! ```rust,no_run
//! use bundlescope_scan::{BundleScanner, ScanConfig};
//!
//! let config = ScanConfig::new("/path/to/App.app");
//! let tree = BundleScanner::new().scan(&config).unwrap();
//!
//! println!("Total size: {} bytes", tree.total_size());
//! println!("Root hash: {}", tree.root.content_hash);
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use bundlescope_scan::{BundleScanner, ScanConfig};
//!
//! let scanner = BundleScanner::new();
//! let mut progress_rx = scanner.subscribe();
//!
//! std::thread::spawn(move || {
//!     while let Ok(progress) = progress_rx.blocking_recv() {
//!         println!("Hashed {}/{} files", progress.files_hashed, progress.total_files);
//!     }
//! });
//!
//! let tree = scanner.scan(&ScanConfig::new("/path/to/App.app")).unwrap();
//! ```

mod hasher;
mod progress;
mod scanner;

use std::path::Path;

pub use hasher::{HashedFile, hash_file, hash_reader};
pub use progress::ScanProgress;
pub use scanner::BundleScanner;

// Re-export core types for convenience
pub use bundlescope_core::{
    BundleTree, ContentHash, EntryPolicy, FileNode, NodeKind, ScanConfig, ScanError, ScanWarning,
    TreeStats, WarningKind,
};

/// Build the content tree for `path` with default settings.
pub fn build(path: impl AsRef<Path>) -> Result<FileNode, ScanError> {
    let config = ScanConfig::new(path.as_ref());
    BundleScanner::new().scan(&config).map(|tree| tree.root)
}
