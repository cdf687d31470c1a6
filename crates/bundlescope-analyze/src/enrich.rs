//! Splicing externally produced metadata into a built tree.
//!
//! Asset catalogs (`.car`) are opaque files on disk. An external inspector
//! can list the renditions inside them; this module turns those listings
//! into synthetic child nodes so reports can show what a catalog contains.
//! Synthetic nodes are display-only: ancestor sizes and hashes stay as they
//! were computed from the filesystem.

use std::collections::{BTreeMap, HashMap, HashSet};

use compact_str::{CompactString, format_compact};
use serde::{Deserialize, Serialize};
use tracing::debug;

use bundlescope_core::{ContentHash, FileNode, NodeKind, RenditionInfo, classify_name};

/// Asset name prefix used for system-generated packed assets.
pub const PACKED_ASSET_PREFIX: &str = "ZZZZPackedAsset-";

/// One rendition record as reported by an asset-catalog inspector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRendition {
    /// Logical asset name.
    pub asset_name: String,
    /// Rendition file name within the asset.
    pub rendition_name: String,
    /// Size on disk in bytes.
    pub size: u64,
    /// Digest reported by the inspector, kept as opaque text.
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub idiom: String,
    #[serde(default)]
    pub scale: u32,
    #[serde(default)]
    pub compression: String,
}

impl AssetRendition {
    /// Whether this record describes a real, user-visible rendition.
    pub fn is_displayable(&self) -> bool {
        self.size > 0
            && !self.asset_name.is_empty()
            && !self.rendition_name.is_empty()
            && !self.asset_name.starts_with(PACKED_ASSET_PREFIX)
            && !self.rendition_name.starts_with(PACKED_ASSET_PREFIX)
    }
}

/// An asset whose rendition appears more than once across catalogs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDuplicate {
    pub asset_name: String,
    pub digest: String,
    /// Size of one occurrence in bytes.
    pub size: u64,
    /// `"<car path> (<rendition>)"` for every occurrence.
    pub locations: Vec<String>,
    /// size * (occurrences - 1).
    pub wasted_space: u64,
}

impl AssetDuplicate {
    /// Get the number of occurrences.
    pub fn count(&self) -> usize {
        self.locations.len()
    }
}

/// Append synthetic children under the node whose path matches exactly.
///
/// The matched node's size grows by the children's total. Its hash, its
/// siblings and its ancestors are left alone. Children whose path is
/// already present under the node are dropped, so merging the same
/// listing twice changes nothing. Returns `false` and leaves the tree
/// unchanged when no node matches.
pub fn merge(root: &mut FileNode, path: &str, children: Vec<FileNode>) -> bool {
    let Some(node) = root.find_mut(path) else {
        debug!(path, "No node to merge into");
        return false;
    };

    let existing: HashSet<CompactString> =
        node.children.iter().map(|c| c.relative_path.clone()).collect();
    let fresh: Vec<FileNode> = children
        .into_iter()
        .filter(|c| !existing.contains(&c.relative_path))
        .collect();

    let added: u64 = fresh.iter().map(|c| c.size).sum();
    node.size += added;
    node.children.extend(fresh);
    true
}

/// Build the synthetic nodes for one catalog's renditions.
///
/// Returns one directory-kind node per asset, sorted by asset name, each
/// holding its rendition leaves sorted by name.
pub fn rendition_nodes(car_path: &str, renditions: &[AssetRendition]) -> Vec<FileNode> {
    let mut assets: BTreeMap<&str, Vec<&AssetRendition>> = BTreeMap::new();
    for rendition in renditions.iter().filter(|r| r.is_displayable()) {
        assets
            .entry(rendition.asset_name.as_str())
            .or_default()
            .push(rendition);
    }

    assets
        .into_iter()
        .map(|(asset_name, renditions)| {
            let asset_path = format_compact!("{car_path}/{asset_name}");
            let mut taken: HashSet<CompactString> = HashSet::new();

            let mut leaves: Vec<FileNode> = renditions
                .into_iter()
                .map(|r| {
                    let name = unique_name(&mut taken, &r.rendition_name);
                    let mut leaf = FileNode::new_file(
                        format_compact!("{asset_path}/{name}"),
                        classify_name(&r.rendition_name, false),
                        r.size,
                        ContentHash::digest(r.digest.as_bytes()),
                    );
                    leaf.rendition = Some(RenditionInfo {
                        idiom: r.idiom.as_str().into(),
                        scale: r.scale,
                        compression: r.compression.as_str().into(),
                    });
                    leaf
                })
                .collect();
            leaves.sort_by(|a, b| a.name().cmp(b.name()));

            FileNode::new_directory(asset_path, leaves)
        })
        .collect()
}

fn unique_name(taken: &mut HashSet<CompactString>, name: &str) -> CompactString {
    let mut candidate = CompactString::from(name);
    let mut n = 2;
    while taken.contains(&candidate) {
        candidate = format_compact!("{name} ({n})");
        n += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

/// Merge every catalog's renditions under its `.car` node.
///
/// `catalogs` is keyed by the catalog's relative path. Returns the number
/// of catalogs that matched a node in the tree.
pub fn enrich_asset_catalogs(
    root: &mut FileNode,
    catalogs: &BTreeMap<String, Vec<AssetRendition>>,
) -> usize {
    let mut merged = 0;
    for (car_path, renditions) in catalogs {
        let nodes = rendition_nodes(car_path, renditions);
        let count = nodes.len();
        if merge(root, car_path, nodes) {
            debug!(path = %car_path, assets = count, "Merged asset catalog");
            merged += 1;
        }
    }
    merged
}

/// Find renditions repeated across catalogs, keyed by asset name and digest.
pub fn find_asset_duplicates(
    catalogs: &BTreeMap<String, Vec<AssetRendition>>,
) -> Vec<AssetDuplicate> {
    let mut occurrences: HashMap<(&str, &str), (u64, Vec<String>)> = HashMap::new();

    for (car_path, renditions) in catalogs {
        for rendition in renditions {
            if !rendition.is_displayable() || rendition.digest.is_empty() {
                continue;
            }
            let (size, locations) = occurrences
                .entry((rendition.asset_name.as_str(), rendition.digest.as_str()))
                .or_default();
            *size = rendition.size;
            locations.push(format!("{car_path} ({})", rendition.rendition_name));
        }
    }

    let mut duplicates: Vec<AssetDuplicate> = occurrences
        .into_iter()
        .filter(|(_, (_, locations))| locations.len() > 1)
        .map(|((asset_name, digest), (size, locations))| AssetDuplicate {
            asset_name: asset_name.to_string(),
            digest: digest.to_string(),
            size,
            wasted_space: size * (locations.len() as u64 - 1),
            locations,
        })
        .collect();

    duplicates.sort_by(|a, b| {
        b.wasted_space
            .cmp(&a.wasted_space)
            .then_with(|| a.asset_name.cmp(&b.asset_name))
            .then_with(|| a.digest.cmp(&b.digest))
    });
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendition(asset: &str, name: &str, size: u64, digest: &str) -> AssetRendition {
        AssetRendition {
            asset_name: asset.to_string(),
            rendition_name: name.to_string(),
            size,
            digest: digest.to_string(),
            idiom: "universal".to_string(),
            scale: 2,
            compression: "lzfse".to_string(),
        }
    }

    #[test]
    fn test_merge_missing_path_is_noop() {
        let mut root = FileNode::new_directory(
            "",
            vec![FileNode::new_file("a", NodeKind::Binary, 3, ContentHash::digest(b"abc"))],
        );
        let before = root.clone();

        let extra = FileNode::new_file("zz/x", NodeKind::Binary, 1, ContentHash::digest(b"x"));
        assert!(!merge(&mut root, "zz", vec![extra]));
        assert_eq!(root, before);
    }

    #[test]
    fn test_merge_twice_is_idempotent() {
        let hash = ContentHash::digest(b"car");
        let car = FileNode::new_file("A.car", NodeKind::AssetCatalog, 10, hash);
        let mut root = FileNode::new_directory("", vec![car]);
        let renditions = vec![rendition("Icon", "i.png", 10, "d1")];

        assert!(merge(&mut root, "A.car", rendition_nodes("A.car", &renditions)));
        let once = root.clone();
        assert!(merge(&mut root, "A.car", rendition_nodes("A.car", &renditions)));
        assert_eq!(root, once);

        let paths: Vec<&str> = root.iter().map(|n| n.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["", "A.car", "A.car/Icon", "A.car/Icon/i.png"]);
        assert_eq!(root.find("A.car").unwrap().size, 20);
    }

    #[test]
    fn test_rendition_nodes_filters_and_groups() {
        let renditions = vec![
            rendition("Icon", "Icon@2x.png", 100, "d1"),
            rendition("Icon", "Icon@3x.png", 150, "d2"),
            rendition("Logo", "Logo.pdf", 40, "d3"),
            rendition("Empty", "Empty.png", 0, "d4"),
            rendition("ZZZZPackedAsset-1.0.0", "packed", 10, "d5"),
            rendition("", "anon.png", 10, "d6"),
        ];

        let nodes = rendition_nodes("Assets.car", &renditions);
        let paths: Vec<&str> = nodes.iter().map(|n| n.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["Assets.car/Icon", "Assets.car/Logo"]);

        let icon = &nodes[0];
        assert!(icon.is_dir());
        assert_eq!(icon.size, 250);
        assert_eq!(icon.children[0].relative_path, "Assets.car/Icon/Icon@2x.png");
        assert_eq!(icon.children[0].content_hash, ContentHash::digest(b"d1"));
        assert_eq!(icon.children[0].rendition.as_ref().unwrap().scale, 2);
    }

    #[test]
    fn test_colliding_rendition_names_get_suffix() {
        let renditions = vec![
            rendition("Icon", "Icon.png", 10, "a"),
            rendition("Icon", "Icon.png", 20, "b"),
        ];

        let nodes = rendition_nodes("Assets.car", &renditions);
        let names: Vec<&str> = nodes[0].children.iter().map(FileNode::name).collect();
        assert_eq!(names, vec!["Icon.png", "Icon.png (2)"]);
    }

    #[test]
    fn test_asset_duplicates_across_catalogs() {
        let mut catalogs = BTreeMap::new();
        catalogs.insert(
            "A.car".to_string(),
            vec![rendition("Icon", "Icon@2x.png", 100, "same"), rendition("Bg", "bg.png", 9, "x")],
        );
        catalogs.insert(
            "Sub/B.car".to_string(),
            vec![rendition("Icon", "Icon@2x.png", 100, "same"), rendition("Bg", "bg.png", 9, "y")],
        );

        let duplicates = find_asset_duplicates(&catalogs);
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].asset_name, "Icon");
        assert_eq!(duplicates[0].wasted_space, 100);
        assert_eq!(
            duplicates[0].locations,
            vec!["A.car (Icon@2x.png)", "Sub/B.car (Icon@2x.png)"]
        );
    }
}
