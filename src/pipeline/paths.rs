//! Output-path computation and lexical path normalization.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Prefix marking a file as a combined output.
pub const COMBINED_PREFIX: &str = "combined_";

/// Collapse `.` segments, `name/..` pairs and repeated separators without
/// touching the filesystem.
///
/// Leading `..` segments of a relative path are kept, `..` directly under
/// the root is dropped, and an empty result becomes `.`.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        PathBuf::from(".")
    } else {
        parts.iter().collect()
    }
}

/// `<output_dir>/combined_<stem of index>.<extension>`.
///
/// Only the last extension of the index name is dropped, so `a.b.pvtu`
/// becomes `combined_a.b.vtu`.
pub fn output_path(output_dir: &Path, index: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(COMBINED_PREFIX);
    name.push(index.file_stem().unwrap_or_default());
    name.push(".");
    name.push(extension);
    output_dir.join(name)
}
