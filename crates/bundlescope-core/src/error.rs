//! Error types for scanning operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while building a bundle tree.
///
/// Any of these aborts the whole build; there is no partial tree.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Entry that is neither a regular file nor a directory.
    #[error("Unsupported entry ({entry_type}): {path}")]
    UnsupportedEntry {
        path: PathBuf,
        entry_type: &'static str,
    },

    /// File name that is not valid UTF-8.
    #[error("File name is not valid UTF-8: {path}")]
    InvalidName { path: PathBuf },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Path the error refers to, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::PermissionDenied { path }
            | Self::NotFound { path }
            | Self::Io { path, .. }
            | Self::UnsupportedEntry { path, .. }
            | Self::InvalidName { path } => Some(path),
            Self::InvalidConfig { .. } => None,
        }
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Symlink, device, socket or fifo left out of the tree.
    UnsupportedEntry,
    /// Entry whose name is not valid UTF-8 left out of the tree.
    InvalidName,
}

/// Non-fatal warning encountered during scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a warning for a skipped unsupported entry.
    pub fn skipped_entry(path: impl Into<PathBuf>, entry_type: &str) -> Self {
        let path = path.into();
        let message = format!("Skipped {entry_type}: {}", path.display());
        Self::new(path, message, WarningKind::UnsupportedEntry)
    }

    /// Create a warning for an entry skipped because of its name.
    pub fn invalid_name(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let message = format!("Skipped non-UTF-8 name: {}", path.display());
        Self::new(path, message, WarningKind::InvalidName)
    }
}
