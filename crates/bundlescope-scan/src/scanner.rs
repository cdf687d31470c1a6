//! JWalk-based bundle tree builder with parallel leaf hashing.

use std::collections::HashMap;
use std::fs::FileType;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use compact_str::{CompactString, format_compact};
use jwalk::{Parallelism, WalkDir};
use rayon::prelude::*;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use bundlescope_core::{
    BundleTree, EntryPolicy, FileNode, ScanConfig, ScanError, ScanWarning, classify_name,
};

use crate::hasher::{HashedFile, hash_file};
use crate::progress::ScanProgress;

/// Files hashed between two progress broadcasts.
const PROGRESS_INTERVAL: u64 = 256;

/// Builds a [`BundleTree`] from a bundle directory.
///
/// Directory listing runs on jwalk's parallel walker; leaf files are then
/// hashed on a bounded rayon pool. Children are always ordered by name
/// before directory digests are combined, so the result does not depend
/// on enumeration or completion order.
pub struct BundleScanner {
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl BundleScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to hashing progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Build the tree rooted at `config.root`.
    ///
    /// The first error aborts the build; no partial tree is returned.
    pub fn scan(&self, config: &ScanConfig) -> Result<BundleTree, ScanError> {
        let start = Instant::now();
        let root_path = config
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&config.root, e))?;
        let metadata = std::fs::metadata(&root_path).map_err(|e| ScanError::io(&root_path, e))?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_count())
            .thread_name(|i| format!("bundlescope-hash-{i}"))
            .build()
            .map_err(|e| ScanError::InvalidConfig {
                message: e.to_string(),
            })?;

        let mut warnings = Vec::new();
        let file_type = metadata.file_type();

        let root = if file_type.is_dir() {
            let mut listing = self.collect_entries(config, &root_path, &mut warnings)?;
            debug!(
                files = listing.files.len(),
                directories = listing.children_by_parent.len(),
                "listed bundle"
            );

            let hashes = self.hash_files(&listing.files, &pool, start)?;
            build_directory(
                CompactString::default(),
                &root_path,
                &mut listing.children_by_parent,
                &hashes,
            )
        } else if file_type.is_file() {
            let hashes = self.hash_files(std::slice::from_ref(&root_path), &pool, start)?;
            let name = file_name_of(&root_path);
            build_file(CompactString::default(), &name, &hashes[0])
        } else {
            // The root can never be skipped: there would be no tree left.
            return Err(ScanError::UnsupportedEntry {
                path: root_path,
                entry_type: describe_file_type(&file_type),
            });
        };

        let scan_duration = start.elapsed();
        info!(
            root = %root_path.display(),
            size = root.size,
            elapsed_ms = scan_duration.as_millis() as u64,
            "bundle tree built"
        );

        Ok(BundleTree::new(
            root,
            root_path,
            config.clone(),
            scan_duration,
            warnings,
        ))
    }

    /// List every entry below the root using jwalk, grouped by parent.
    ///
    /// A directory that cannot be listed fails the build rather than
    /// showing up empty.
    fn collect_entries(
        &self,
        config: &ScanConfig,
        root_path: &Path,
        warnings: &mut Vec<ScanWarning>,
    ) -> Result<Listing, ScanError> {
        let parallelism = match config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        // The root is walked too so that an unreadable root is reported.
        let walker = WalkDir::new(root_path)
            .parallelism(parallelism)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true)
            .min_depth(0);

        let mut listing = Listing::default();
        let mut skipped_dirs: Vec<PathBuf> = Vec::new();

        for entry_result in walker {
            let mut entry = entry_result.map_err(|err| walk_error(err, root_path))?;
            let path = entry.path();

            if skipped_dirs.iter().any(|dir| path.starts_with(dir)) {
                continue;
            }
            if let Some(err) = entry.read_children_error.take() {
                return Err(walk_error(err, &path));
            }
            if entry.depth == 0 {
                continue;
            }

            let file_type = entry.file_type();
            let Some(name) = entry.file_name().to_str().map(CompactString::new) else {
                match config.unsupported_entries {
                    EntryPolicy::Fail => return Err(ScanError::InvalidName { path }),
                    EntryPolicy::Skip => {
                        warn!(path = %path.display(), "skipping entry with non-UTF-8 name");
                        warnings.push(ScanWarning::invalid_name(&path));
                        if file_type.is_dir() {
                            skipped_dirs.push(path);
                        }
                        continue;
                    }
                }
            };

            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                listing.files.push(path.clone());
                EntryKind::File(listing.files.len() - 1)
            } else {
                let entry_type = describe_file_type(&file_type);
                match config.unsupported_entries {
                    EntryPolicy::Fail => {
                        return Err(ScanError::UnsupportedEntry { path, entry_type });
                    }
                    EntryPolicy::Skip => {
                        warn!(path = %path.display(), entry_type, "skipping unsupported entry");
                        warnings.push(ScanWarning::skipped_entry(&path, entry_type));
                        continue;
                    }
                }
            };

            if let Some(parent) = path.parent() {
                listing
                    .children_by_parent
                    .entry(parent.to_path_buf())
                    .or_default()
                    .push(EntryInfo { name, path, kind });
            }
        }

        Ok(listing)
    }

    /// Hash every listed file on the pool, preserving input order.
    ///
    /// Collecting into a `Result` stops handing out new files as soon as
    /// one read fails; that first error is returned.
    fn hash_files(
        &self,
        files: &[PathBuf],
        pool: &rayon::ThreadPool,
        start: Instant,
    ) -> Result<Vec<HashedFile>, ScanError> {
        let total_files = files.len() as u64;
        let files_hashed = AtomicU64::new(0);
        let bytes_hashed = AtomicU64::new(0);

        let hashes = pool.install(|| {
            files
                .par_iter()
                .map(|path| -> Result<HashedFile, ScanError> {
                    let hashed = hash_file(path)?;

                    let count = files_hashed.fetch_add(1, Ordering::Relaxed) + 1;
                    let bytes =
                        bytes_hashed.fetch_add(hashed.size, Ordering::Relaxed) + hashed.size;
                    if count % PROGRESS_INTERVAL == 0 {
                        let _ = self.progress_tx.send(ScanProgress {
                            files_hashed: count,
                            total_files,
                            bytes_hashed: bytes,
                            current_path: path.clone(),
                            elapsed: start.elapsed(),
                        });
                    }

                    Ok(hashed)
                })
                .collect::<Result<Vec<_>, _>>()
        })?;

        let _ = self.progress_tx.send(ScanProgress {
            files_hashed: total_files,
            total_files,
            bytes_hashed: bytes_hashed.load(Ordering::Relaxed),
            current_path: files.last().cloned().unwrap_or_default(),
            elapsed: start.elapsed(),
        });

        Ok(hashes)
    }
}

impl Default for BundleScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Entries collected from the walk.
#[derive(Default)]
struct Listing {
    /// Children of each directory, keyed by the directory's absolute path.
    children_by_parent: HashMap<PathBuf, Vec<EntryInfo>>,
    /// Every regular file, in walk order.
    files: Vec<PathBuf>,
}

/// Temporary struct for collecting entry information.
struct EntryInfo {
    name: CompactString,
    path: PathBuf,
    kind: EntryKind,
}

enum EntryKind {
    Directory,
    /// Index into [`Listing::files`] and the matching hash results.
    File(usize),
}

/// Recursively assemble a directory node from the listing.
fn build_directory(
    relative_path: CompactString,
    path: &Path,
    children_by_parent: &mut HashMap<PathBuf, Vec<EntryInfo>>,
    hashes: &[HashedFile],
) -> FileNode {
    let mut entries = children_by_parent.remove(path).unwrap_or_default();
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let mut children = Vec::with_capacity(entries.len());
    for entry in entries {
        let child_path = join_relative(&relative_path, &entry.name);
        let child = match entry.kind {
            EntryKind::Directory => {
                build_directory(child_path, &entry.path, children_by_parent, hashes)
            }
            EntryKind::File(index) => build_file(child_path, &entry.name, &hashes[index]),
        };
        children.push(child);
    }

    FileNode::new_directory(relative_path, children)
}

fn build_file(relative_path: CompactString, name: &str, hashed: &HashedFile) -> FileNode {
    FileNode::new_file(
        relative_path,
        classify_name(name, false),
        hashed.size,
        hashed.hash,
    )
}

fn join_relative(parent: &str, name: &str) -> CompactString {
    if parent.is_empty() {
        CompactString::new(name)
    } else {
        format_compact!("{parent}/{name}")
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn walk_error(err: jwalk::Error, root_path: &Path) -> ScanError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root_path.to_path_buf());
    let message = err.to_string();
    match err.into_io_error() {
        Some(source) => ScanError::io(path, source),
        None => ScanError::Io {
            path,
            source: std::io::Error::other(message),
        },
    }
}

/// Human-readable name for a non-regular, non-directory file type.
#[cfg(unix)]
fn describe_file_type(file_type: &FileType) -> &'static str {
    use std::os::unix::fs::FileTypeExt;

    if file_type.is_symlink() {
        "symlink"
    } else if file_type.is_block_device() {
        "block device"
    } else if file_type.is_char_device() {
        "character device"
    } else if file_type.is_fifo() {
        "fifo"
    } else if file_type.is_socket() {
        "socket"
    } else {
        "special file"
    }
}

#[cfg(not(unix))]
fn describe_file_type(file_type: &FileType) -> &'static str {
    if file_type.is_symlink() {
        "symlink"
    } else {
        "special file"
    }
}
