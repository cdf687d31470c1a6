//! Core types for bundlescope.
//!
//! This crate provides the fundamental data structures used throughout
//! the bundlescope ecosystem: the bundle content model, content digests,
//! the type classifier, and scan configuration.

mod classify;
mod config;
mod error;
mod hash;
mod node;
mod tree;

pub use classify::{classify, classify_name};
pub use config::{EntryPolicy, ScanConfig, ScanConfigBuilder};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use hash::{ContentHash, HASH_SIZE, HashParseError};
pub use node::{FileNode, NodeKind, RenditionInfo};
pub use tree::{BundleTree, TreeStats};
