//! Scan progress reporting.

use std::path::PathBuf;
use std::time::Duration;

/// Progress information while leaf files are hashed.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Number of files hashed so far.
    pub files_hashed: u64,
    /// Total number of files to hash.
    pub total_files: u64,
    /// Total bytes hashed so far.
    pub bytes_hashed: u64,
    /// Most recently hashed file.
    pub current_path: PathBuf,
    /// Time elapsed since the scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new(total_files: u64) -> Self {
        Self {
            files_hashed: 0,
            total_files,
            bytes_hashed: 0,
            current_path: PathBuf::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Fraction of files hashed, in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total_files == 0 {
            1.0
        } else {
            self.files_hashed as f64 / self.total_files as f64
        }
    }

    /// Calculate hashing throughput in bytes per second.
    pub fn bytes_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.bytes_hashed as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Check whether every file has been hashed.
    pub fn is_complete(&self) -> bool {
        self.files_hashed >= self.total_files
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new(0)
    }
}
