use bundlescope_scan::{
    BundleScanner, ContentHash, EntryPolicy, FileNode, NodeKind, ScanConfig, ScanError,
    WarningKind, build,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const BUNDLE_SIZE: u64 = 300 + 15 + 2000 + 15 + 15 + 512 + 64 + 64;

fn write(root: &Path, relative: &str, contents: &[u8]) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn create_app_bundle() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    write(root, "App", &[0u8; 300]);
    write(root, "Info.plist", b"<plist></plist>");
    write(root, "Frameworks/Core.framework/Core", &[1u8; 2000]);
    write(root, "Frameworks/Core.framework/Info.plist", b"<plist></plist>");
    write(root, "Base.lproj/Main.strings", b"\"title\" = \"Hi\";");
    write(root, "Assets.car", &[2u8; 512]);
    write(root, "Fonts/Brand.otf", &[3u8; 64]);
    write(root, "Fonts/Brand-Bold.otf", &[4u8; 64]);
    fs::create_dir(root.join("PlugIns")).unwrap();

    temp
}

fn assert_size_invariant(node: &FileNode) {
    if node.is_dir() {
        let sum: u64 = node.children.iter().map(|c| c.size).sum();
        assert_eq!(node.size, sum, "size mismatch at {:?}", node.relative_path);
        node.children.iter().for_each(assert_size_invariant);
    } else {
        assert!(node.children.is_empty());
    }
}

#[test]
fn test_size_invariant_holds_everywhere() {
    let temp = create_app_bundle();
    let root = build(temp.path()).unwrap();

    assert_size_invariant(&root);
    assert_eq!(root.size, BUNDLE_SIZE);
}

#[test]
fn test_relative_paths_are_unique() {
    let temp = create_app_bundle();
    let root = build(temp.path()).unwrap();

    let mut paths: Vec<&str> = root.iter().map(|n| n.relative_path.as_str()).collect();
    let total = paths.len();
    paths.sort_unstable();
    paths.dedup();
    assert_eq!(paths.len(), total);
    assert_eq!(root.relative_path, "");
}

#[test]
fn test_kinds_are_classified() {
    let temp = create_app_bundle();
    let root = build(temp.path()).unwrap();

    assert_eq!(root.find("Assets.car").unwrap().kind, NodeKind::AssetCatalog);
    assert_eq!(root.find("Fonts/Brand.otf").unwrap().kind, NodeKind::Font);
    assert_eq!(
        root.find("Base.lproj/Main.strings").unwrap().kind,
        NodeKind::Localization
    );
    assert_eq!(root.find("App").unwrap().kind, NodeKind::Binary);
    assert_eq!(root.find("Fonts").unwrap().kind, NodeKind::Directory);
}

#[test]
fn test_hash_is_deterministic_across_creation_order() {
    let first = TempDir::new().unwrap();
    for name in ["c.bin", "a.bin", "b.bin"] {
        write(first.path(), &format!("dir/{name}"), name.as_bytes());
    }

    let second = TempDir::new().unwrap();
    for name in ["b.bin", "c.bin", "a.bin"] {
        write(second.path(), &format!("dir/{name}"), name.as_bytes());
    }

    let a = build(first.path()).unwrap();
    let b = build(second.path()).unwrap();
    assert_eq!(a, b);

    let again = build(first.path()).unwrap();
    assert_eq!(a.content_hash, again.content_hash);
}

#[test]
fn test_directory_hash_combines_sorted_children() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "b.txt", b"bee");
    write(temp.path(), "a.txt", b"ay");

    let root = build(temp.path()).unwrap();
    let (a, b) = (ContentHash::digest(b"ay"), ContentHash::digest(b"bee"));
    let expected = ContentHash::combine([&a, &b]);
    assert_eq!(root.content_hash, expected);
}

#[test]
fn test_single_byte_change_propagates_to_ancestors_only() {
    let temp = create_app_bundle();
    let before = build(temp.path()).unwrap();

    let mut bytes = vec![1u8; 2000];
    bytes[1000] = 9;
    write(temp.path(), "Frameworks/Core.framework/Core", &bytes);
    let after = build(temp.path()).unwrap();

    let changed_paths = [
        "Frameworks/Core.framework/Core",
        "Frameworks/Core.framework",
        "Frameworks",
        "",
    ];
    for changed in changed_paths {
        assert_ne!(
            before.find(changed).unwrap().content_hash,
            after.find(changed).unwrap().content_hash,
            "{changed} should change"
        );
    }

    for unchanged in ["Frameworks/Core.framework/Info.plist", "Fonts", "Assets.car", "Base.lproj"] {
        assert_eq!(
            before.find(unchanged).unwrap().content_hash,
            after.find(unchanged).unwrap().content_hash,
            "{unchanged} should not change"
        );
    }
}

#[test]
fn test_empty_directory_node() {
    let temp = create_app_bundle();
    let root = build(temp.path()).unwrap();

    let plugins = root.find("PlugIns").unwrap();
    assert!(plugins.is_dir());
    assert!(plugins.children.is_empty());
    assert_eq!(plugins.size, 0);
    assert_eq!(plugins.content_hash, ContentHash::empty());
}

#[test]
fn test_empty_root() {
    let temp = TempDir::new().unwrap();
    let root = build(temp.path()).unwrap();

    assert_eq!(root.size, 0);
    assert_eq!(root.content_hash, ContentHash::empty());
    assert!(root.children.is_empty());
}

#[test]
fn test_hidden_files_are_included() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), ".hidden", b"secret");
    write(temp.path(), "_CodeSignature/CodeResources", b"sig");

    let root = build(temp.path()).unwrap();
    assert_eq!(root.size, 9);
    assert!(root.find(".hidden").is_some());
}

#[test]
fn test_file_root_builds_single_leaf() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "movie.mov", b"frames");

    let root = build(temp.path().join("movie.mov")).unwrap();
    assert!(root.is_leaf());
    assert_eq!(root.kind, NodeKind::Video);
    assert_eq!(root.size, 6);
    assert_eq!(root.relative_path, "");
}

#[test]
fn test_missing_root_is_not_found() {
    let temp = TempDir::new().unwrap();
    let err = build(temp.path().join("nope.app")).unwrap_err();
    assert!(matches!(err, ScanError::NotFound { .. }));
    assert!(err.path().is_some());
}

#[cfg(unix)]
#[test]
fn test_symlink_fails_by_default() {
    let temp = create_app_bundle();
    std::os::unix::fs::symlink("App", temp.path().join("AppLink")).unwrap();

    let err = build(temp.path()).unwrap_err();
    match err {
        ScanError::UnsupportedEntry { path, entry_type } => {
            assert_eq!(entry_type, "symlink");
            assert!(path.ends_with("AppLink"));
        }
        other => panic!("expected UnsupportedEntry, got {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn test_symlink_skipped_with_warning() {
    let temp = create_app_bundle();
    std::os::unix::fs::symlink("App", temp.path().join("AppLink")).unwrap();

    let config = ScanConfig::builder()
        .root(temp.path())
        .unsupported_entries(EntryPolicy::Skip)
        .build()
        .unwrap();
    let tree = BundleScanner::new().scan(&config).unwrap();

    assert!(tree.root.find("AppLink").is_none());
    assert_eq!(tree.warnings.len(), 1);
    assert_eq!(tree.warnings[0].kind, WarningKind::UnsupportedEntry);
    assert_eq!(tree.root.size, BUNDLE_SIZE);
}

/// Make a directory unreadable. Returns false when permissions are not
/// enforced (e.g. when running as root), in which case the caller skips.
#[cfg(unix)]
fn lock_dir(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o000)).unwrap();
    fs::read_dir(path).is_err()
}

#[cfg(unix)]
fn unlock_dir(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_fails_build() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "Open/a.txt", b"ab");
    write(temp.path(), "Locked/secret.bin", b"hidden");

    let locked = temp.path().join("Locked");
    if !lock_dir(&locked) {
        unlock_dir(&locked);
        return;
    }

    let result = build(temp.path());
    unlock_dir(&locked);

    match result {
        Err(ScanError::PermissionDenied { path }) => assert!(path.ends_with("Locked")),
        other => panic!("expected PermissionDenied, got {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn test_unreadable_root_fails_build() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("App.app");
    write(&root, "a.txt", b"ab");

    if !lock_dir(&root) {
        unlock_dir(&root);
        return;
    }

    let result = build(&root);
    unlock_dir(&root);

    assert!(result.is_err(), "unreadable root must not build: {result:?}");
}

#[cfg(target_os = "linux")]
fn raw_path(root: &Path, name: &[u8]) -> std::path::PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    root.join(OsStr::from_bytes(name))
}

#[cfg(target_os = "linux")]
fn write_raw(root: &Path, name: &[u8], contents: &[u8]) {
    fs::write(raw_path(root, name), contents).unwrap();
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_name_fails_by_default() {
    let temp = TempDir::new().unwrap();
    write_raw(temp.path(), b"a\xff", b"one");
    write_raw(temp.path(), b"a\xfe", b"two");

    let err = build(temp.path()).unwrap_err();
    assert!(matches!(err, ScanError::InvalidName { .. }), "got {err:?}");
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_names_skipped_with_warning() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "ok.txt", b"fine");
    write_raw(temp.path(), b"a\xff", b"one");
    write_raw(temp.path(), b"a\xfe", b"two");
    let bad_dir = raw_path(temp.path(), b"d\xff");
    fs::create_dir(&bad_dir).unwrap();
    write_raw(&bad_dir, b"inner", b"x");

    let config = ScanConfig::builder()
        .root(temp.path())
        .unsupported_entries(EntryPolicy::Skip)
        .build()
        .unwrap();
    let tree = BundleScanner::new().scan(&config).unwrap();

    let paths: Vec<&str> = tree.root.iter().map(|n| n.relative_path.as_str()).collect();
    assert_eq!(paths, vec!["", "ok.txt"]);
    assert_eq!(tree.root.size, 4);
    assert_eq!(tree.warnings.len(), 3);
    assert!(tree.warnings.iter().all(|w| w.kind == WarningKind::InvalidName));
}

#[test]
fn test_progress_reports_completion() {
    let temp = create_app_bundle();
    let scanner = BundleScanner::new();
    let mut rx = scanner.subscribe();

    scanner.scan(&ScanConfig::new(temp.path())).unwrap();

    let mut last = None;
    while let Ok(progress) = rx.try_recv() {
        last = Some(progress);
    }
    let last = last.expect("final progress update");
    assert!(last.is_complete());
    assert_eq!(last.total_files, 8);
    assert_eq!(last.bytes_hashed, BUNDLE_SIZE);
}
