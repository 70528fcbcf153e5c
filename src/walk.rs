//! # Directory Walk Core
//!
//! One depth-first traversal primitive and its two consumers: the
//! paginated flat lister and the depth-bounded tree builder. The primitive
//! never decides recursion on its own; both consumers walk a single level
//! and the tree builder re-invokes itself per subdirectory, so pagination
//! and depth control each live in exactly one place.

use serde_json::{Map, Value};
use std::fs::Metadata;
use std::path::Path;
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

use crate::backend::ListPage;
use crate::entry::{extension_of, join_logical, EntryDescriptor, TreeNode};
use crate::errors::{StorageError, StorageResult};

/// Exclusion predicate evaluated once per visited entry, before any
/// descent decision. `true` skips the entry and, for a directory, its
/// entire subtree. The walk root itself is never passed to the predicate.
pub type ExcludeFilter = dyn Fn(&Path, &DirEntry) -> bool + Send + Sync;

/// Visitor verdict for [`walk_entries`]
pub(crate) enum Flow {
    Continue,
    Stop,
}

/// Stat a path, distinguishing "does not exist" from other failures.
/// Returns `(exists, is_directory)`.
pub(crate) fn probe(path: &Path) -> StorageResult<(bool, bool)> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok((true, meta.is_dir())),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok((false, false)),
        Err(err) => Err(StorageError::Io(format!("{}: {}", path.display(), err))),
    }
}

fn is_excluded(filter: Option<&ExcludeFilter>, entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    filter.map_or(false, |f| f(entry.path(), entry))
}

/// Depth-first walk under `root`, skipping the root entry itself.
///
/// `one_level` restricts the walk to direct children; consumers needing
/// recursion call back in themselves. Entries matching the exclusion
/// filter are pruned together with their subtrees. Entries whose metadata
/// cannot be read are skipped silently. The visitor may return
/// [`Flow::Stop`] to end the walk early; any other traversal failure
/// aborts the walk with [`StorageError::Traversal`].
pub(crate) fn walk_entries(
    root: &Path,
    one_level: bool,
    filter: Option<&ExcludeFilter>,
    visit: &mut dyn FnMut(&DirEntry, &Metadata) -> Flow,
) -> StorageResult<()> {
    let mut walker = WalkDir::new(root).min_depth(1);
    if one_level {
        walker = walker.max_depth(1);
    }

    for entry in walker.into_iter().filter_entry(|e| !is_excluded(filter, e)) {
        let entry = entry.map_err(|e| StorageError::Traversal(e.to_string()))?;
        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(_) => continue,
        };
        if let Flow::Stop = visit(&entry, &meta) {
            return Ok(());
        }
    }

    Ok(())
}

/// One page of the direct children of `root`.
///
/// `page` is 1-based; the included window is
/// `[offset * page_size, offset * page_size + page_size)` over the
/// non-excluded children in walk order. The walk stops as soon as the page
/// fills, so the returned `total_scanned` only counts children visited up
/// to that point.
pub(crate) fn paginate(
    root: &Path,
    logical_root: &str,
    page: usize,
    page_size: usize,
    with_child_count: bool,
    filter: Option<&ExcludeFilter>,
) -> StorageResult<ListPage> {
    let offset = page.saturating_sub(1);
    let window_start = offset.saturating_mul(page_size);

    let mut entries: Vec<EntryDescriptor> = Vec::with_capacity(page_size);
    let mut scanned = 0usize;
    let mut included = 0usize;

    walk_entries(root, true, filter, &mut |entry, meta| {
        if included >= page_size {
            return Flow::Stop;
        }

        if scanned >= window_start && included < page_size {
            let name = entry.file_name().to_string_lossy();
            let logical = join_logical(logical_root, &name);
            let descriptor = if meta.is_dir() {
                let mut descriptor = EntryDescriptor::dir(logical, meta);
                if with_child_count {
                    descriptor.extra = Some(child_count_params(entry, filter));
                }
                descriptor
            } else {
                EntryDescriptor::file(logical, meta, extension_of(entry.path()))
            };
            entries.push(descriptor);
            included += 1;
        }

        scanned += 1;
        Flow::Continue
    })?;

    Ok(ListPage {
        entries,
        total_scanned: scanned,
    })
}

/// Count every non-excluded entry below `root`, recursively and without a
/// window limit. Walk failures end the count early; the partial total is
/// returned best-effort.
pub(crate) fn count_descendants(root: &Path, filter: Option<&ExcludeFilter>) -> usize {
    let mut total = 0usize;
    let walked = walk_entries(root, false, filter, &mut |_, _| {
        total += 1;
        Flow::Continue
    });
    if let Err(err) = walked {
        warn!(path = %root.display(), error = %err, "descendant count ended early");
    }
    total
}

fn child_count_params(entry: &DirEntry, filter: Option<&ExcludeFilter>) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert(
        "full_path".to_string(),
        Value::from(entry.path().display().to_string()),
    );
    params.insert(
        "filename".to_string(),
        Value::from(entry.file_name().to_string_lossy().as_ref()),
    );
    params.insert(
        "count".to_string(),
        Value::from(count_descendants(entry.path(), filter) as u64),
    );
    params
}

/// Build the tree of entries under `root`, depth-first.
///
/// Walks one level and recurses per subdirectory with `depth + 1` while
/// `max_depth <= 0` (unbounded) or `depth < max_depth`; a directory at the
/// bound is still emitted, childless. Files become leaves unless
/// `no_leaf`. Sibling order is walk order. Walk failures are logged and
/// the partial tree returned best-effort.
pub(crate) fn build_tree(
    root: &Path,
    logical_root: &str,
    depth: i32,
    max_depth: i32,
    no_leaf: bool,
    with_child_count: bool,
    filter: Option<&ExcludeFilter>,
) -> Vec<TreeNode> {
    let mut nodes: Vec<TreeNode> = Vec::new();

    let walked = walk_entries(root, true, filter, &mut |entry, meta| {
        let name = entry.file_name().to_string_lossy();
        let logical = join_logical(logical_root, &name);

        if meta.is_dir() {
            let mut item = EntryDescriptor::dir(logical.clone(), meta);
            if with_child_count {
                item.extra = Some(child_count_params(entry, filter));
            }
            let children = if max_depth <= 0 || depth < max_depth {
                build_tree(
                    entry.path(),
                    &logical,
                    depth + 1,
                    max_depth,
                    no_leaf,
                    with_child_count,
                    filter,
                )
            } else {
                Vec::new()
            };
            nodes.push(TreeNode { item, children });
        } else if !no_leaf {
            let item = EntryDescriptor::file(logical, meta, extension_of(entry.path()));
            nodes.push(TreeNode {
                item,
                children: Vec::new(),
            });
        }

        Flow::Continue
    });

    if let Err(err) = walked {
        warn!(path = %root.display(), error = %err, "tree walk ended early");
    }

    nodes
}
