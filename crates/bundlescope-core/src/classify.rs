//! Extension-based type classification.

use crate::node::NodeKind;

/// Classify an entry by its extension.
///
/// The match is case-insensitive and accepts the extension with or without
/// its leading dot. Unrecognized extensions resolve to [`NodeKind::Binary`].
pub fn classify(extension: &str, is_dir: bool) -> NodeKind {
    if is_dir {
        return NodeKind::Directory;
    }

    let ext = extension.strip_prefix('.').unwrap_or(extension);
    let is = |candidate: &str| ext.eq_ignore_ascii_case(candidate);

    if ["otf", "ttc", "ttf", "woff"].into_iter().any(is) {
        NodeKind::Font
    } else if ["strings", "xcstrings", "stringsdict"].into_iter().any(is) {
        NodeKind::Localization
    } else if ["car", "xcassets"].into_iter().any(is) {
        NodeKind::AssetCatalog
    } else if ["mp4", "mov", "m4v"].into_iter().any(is) {
        NodeKind::Video
    } else if ["mlmodel", "mlmodelc"].into_iter().any(is) {
        NodeKind::CoremlModel
    } else {
        NodeKind::Binary
    }
}

/// Classify an entry by its file name.
///
/// Only the text after the final dot counts (`a.tar.mov` is a video), and
/// that includes dot-files: `.ttf` alone classifies as a font.
pub fn classify_name(name: &str, is_dir: bool) -> NodeKind {
    let extension = name.rfind('.').map_or("", |idx| &name[idx + 1..]);
    classify(extension, is_dir)
}
