//! Streaming SHA-256 hashing of leaf files.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use bundlescope_core::{ContentHash, ScanError};

/// Read buffer size for streaming hashes.
const BUFFER_SIZE: usize = 64 * 1024;

/// Digest and byte length of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashedFile {
    /// SHA-256 of the file contents.
    pub hash: ContentHash,
    /// Number of bytes read.
    pub size: u64,
}

/// Hash a file's full contents.
///
/// The returned size is the number of bytes actually hashed, so it always
/// agrees with the digest even if the file changed since it was listed.
pub fn hash_file(path: &Path) -> Result<HashedFile, ScanError> {
    let mut file = File::open(path).map_err(|e| ScanError::io(path, e))?;
    hash_reader(&mut file).map_err(|e| ScanError::io(path, e))
}

/// Hash everything a reader yields.
pub fn hash_reader(reader: &mut impl Read) -> std::io::Result<HashedFile> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut size: u64 = 0;

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
        size += bytes_read as u64;
    }

    Ok(HashedFile {
        hash: ContentHash::new(hasher.finalize().into()),
        size,
    })
}
