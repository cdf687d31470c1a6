//! Scan configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// What to do with entries that are neither regular files nor directories,
/// or whose names are not valid UTF-8.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPolicy {
    /// Abort the build with [`crate::ScanError::UnsupportedEntry`] or
    /// [`crate::ScanError::InvalidName`].
    #[default]
    Fail,
    /// Leave the entry out of the tree and record a warning.
    ///
    /// Reported sizes then exclude whatever the entry pointed at.
    Skip,
}

/// Configuration for building a bundle tree.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root of the resolved bundle.
    pub root: PathBuf,

    /// Number of hashing threads (0 = one per available core).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Handling of symlinks, devices, sockets and fifos.
    #[builder(default)]
    #[serde(default)]
    pub unsupported_entries: EntryPolicy,
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple config for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            threads: 0,
            unsupported_entries: EntryPolicy::Fail,
        }
    }

    /// Resolve the worker count, substituting available parallelism for 0.
    pub fn worker_count(&self) -> usize {
        match self.threads {
            0 => std::thread::available_parallelism().map_or(1, |n| n.get()),
            n => n,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
