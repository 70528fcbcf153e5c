//! # Entry Descriptors
//!
//! Backend-agnostic records for files and directories discovered by a
//! traversal. Descriptors are built fresh per call from a live walk and
//! returned by value; nothing is cached.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::Metadata;
use std::path::Path;

/// Kind of a listed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// Metadata record for one file or directory
///
/// `path` is logical (relative to the bucket or to the caller-supplied
/// listing root), never the real filesystem path. `last_modified` is a
/// `YYYY-MM-DD HH:MM:SS` local-time string. For directories `size` is
/// whatever the platform reports and `extension` is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryDescriptor {
    pub path: String,
    pub last_modified: String,
    pub size: u64,
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub extension: String,
    /// Auxiliary data (`full_path`, `filename`, `count`), present only on
    /// directory entries and only when child counting was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Map<String, Value>>,
}

impl EntryDescriptor {
    pub(crate) fn dir(path: String, meta: &Metadata) -> Self {
        Self {
            path,
            last_modified: format_mtime(meta),
            size: meta.len(),
            kind: EntryKind::Dir,
            extension: String::new(),
            extra: None,
        }
    }

    pub(crate) fn file(path: String, meta: &Metadata, extension: String) -> Self {
        Self {
            path,
            last_modified: format_mtime(meta),
            size: meta.len(),
            kind: EntryKind::File,
            extension,
            extra: None,
        }
    }
}

/// An entry descriptor plus its ordered children
///
/// Children are populated only for directory nodes within the depth bound
/// of the tree call that produced them; file nodes never have children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub item: EntryDescriptor,
    pub children: Vec<TreeNode>,
}

/// Minimal reference to a previously listed entry, as consumed by
/// [`delete_multi`](crate::backend::BucketBackend::delete_multi).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryRef {
    pub path: String,
    pub kind: EntryKind,
}

/// Render a modification time with second precision, local time.
pub(crate) fn format_mtime(meta: &Metadata) -> String {
    meta.modified()
        .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

/// File extension including the leading dot (`.txt`); empty when there is
/// none. Directories always get the empty string from their constructor.
pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default()
}

/// Join two logical path segments with `/`, tolerating an empty base.
pub(crate) fn join_logical(base: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", base, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_logical() {
        assert_eq!(join_logical("", "a.txt"), "a.txt");
        assert_eq!(join_logical("docs", "a.txt"), "docs/a.txt");
        assert_eq!(join_logical("docs/", "sub"), "docs/sub");
        assert_eq!(join_logical("/docs/sub", "a.txt"), "/docs/sub/a.txt");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("a/b/report.txt")), ".txt");
        assert_eq!(extension_of(Path::new("archive.tar.gz")), ".gz");
        assert_eq!(extension_of(Path::new("README")), "");
    }

    #[test]
    fn test_kind_serialization() {
        assert_eq!(serde_json::to_string(&EntryKind::File).unwrap(), "\"file\"");
        assert_eq!(serde_json::to_string(&EntryKind::Dir).unwrap(), "\"dir\"");
    }

    #[test]
    fn test_descriptor_omits_empty_fields() {
        let temp = tempfile::TempDir::new().unwrap();
        let meta = std::fs::metadata(temp.path()).unwrap();
        let descriptor = EntryDescriptor::dir("docs".to_string(), &meta);

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["kind"], "dir");
        assert!(json.get("extension").is_none());
        assert!(json.get("extra").is_none());
    }
}
