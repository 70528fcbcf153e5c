//! # Bucket Backend Trait
//!
//! The contract an upstream manager consumes. A backend is bucket-scoped:
//! every logical path it receives is interpreted relative to its bucket
//! namespace. Implementations other than [`LocalBucket`](crate::LocalBucket)
//! (e.g. remote object stores) can be swapped in without changing callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Read;

use crate::entry::{EntryDescriptor, EntryRef, TreeNode};
use crate::errors::StorageResult;

/// Injected accessor handed to [`BucketBackend::get_to_file`]: fetches the
/// bytes behind a remote location so the backend can persist them.
pub type RemoteFetch<'a> = &'a dyn Fn(&str) -> std::io::Result<Vec<u8>>;

/// Per-call listing options
#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions {
    /// Annotate each directory entry with the recursive count of its
    /// non-excluded descendants. Computed via an independent unbounded
    /// scan per directory, so it is not free.
    pub with_child_count: bool,
}

/// One page of a flat directory listing
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListPage {
    pub entries: Vec<EntryDescriptor>,
    /// Number of non-excluded direct children visited before the walk
    /// ended. The scan stops early once the page fills, so this is an
    /// authoritative total only when the final page was reached without
    /// early exit. Callers wanting a true total must run an uncapped scan.
    pub total_scanned: usize,
}

/// A remote bucket namespace, as reported by
/// [`BucketBackend::remote_buckets`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Bucket-scoped object store backend
///
/// All operations are synchronous and blocking; no handle outlives a call.
/// Concurrent calls against the same logical path are not coordinated and
/// race at the storage layer.
pub trait BucketBackend: Send + Sync + std::fmt::Debug {
    /// Name of the bucket this backend is scoped to
    fn bucket_name(&self) -> &str;

    /// Constant identifier for this backend kind
    fn driver_name(&self) -> &str;

    /// Remote bucket namespaces, if the backend has any
    fn remote_buckets(&self, opts: &ListOptions) -> Vec<Bucket>;

    /// Store the reader's bytes under `name`, creating missing parent
    /// directories and truncating any existing object.
    fn put(&self, name: &str, reader: &mut dyn Read) -> StorageResult<()>;

    /// Store a UTF-8 string under `name`
    fn put_string(&self, name: &str, content: &str) -> StorageResult<()> {
        let mut bytes = content.as_bytes();
        self.put(name, &mut bytes)
    }

    /// Store the bucket-relative file `source` under `name`
    fn put_from_file(&self, name: &str, source: &str) -> StorageResult<()>;

    /// Read the full contents of the object `name`
    fn get(&self, name: &str) -> StorageResult<Vec<u8>>;

    /// Fetch `dest` through the supplied accessor and persist the bytes
    /// under `name`. Without an accessor the call is a no-op.
    fn get_to_file(
        &self,
        name: &str,
        dest: &str,
        remote_fetch: Option<RemoteFetch<'_>>,
    ) -> StorageResult<()>;

    /// Delete the object `name`; an empty name is a no-op.
    fn delete(&self, name: &str) -> StorageResult<()>;

    /// Recursively delete a directory's contents bottom-up, then the
    /// directory itself. Already-absent paths are ignored.
    fn delete_all(&self, dir: &str) -> StorageResult<()>;

    /// Delete each referenced entry, dispatching on its recorded kind.
    /// Individual failures are ignored.
    fn delete_multi(&self, entries: &[EntryRef]) -> StorageResult<()>;

    /// Whether `name` exists. NotFound is `Ok(false)`, not an error.
    fn exists(&self, name: &str) -> StorageResult<bool>;

    /// Copy the object at `source` to `dest` (both bucket-relative)
    fn copy(&self, dest: &str, source: &str) -> StorageResult<()>;

    /// Move `source` to `dest` as copy-then-delete. Not atomic: a failure
    /// after the copy leaves both paths populated.
    fn mv(&self, dest: &str, source: &str) -> StorageResult<()>;

    /// Alias for [`mv`](Self::mv)
    fn rename(&self, dest: &str, source: &str) -> StorageResult<()> {
        self.mv(dest, source)
    }

    /// Append the reader's bytes to the existing object `name`, returning
    /// the number of bytes written. `position` is accepted for contract
    /// compatibility but the write always targets end-of-file.
    fn append(&self, name: &str, position: u64, reader: &mut dyn Read) -> StorageResult<usize>;

    /// [`append`](Self::append) over a UTF-8 string
    fn append_string(&self, name: &str, position: u64, content: &str) -> StorageResult<usize> {
        let mut bytes = content.as_bytes();
        self.append(name, position, &mut bytes)
    }

    /// One page of the direct children of `dir`. `page` is 1-based; page 0
    /// is treated as page 1. Subdirectory contents are never expanded.
    fn list(
        &self,
        dir: &str,
        page: usize,
        page_size: usize,
        opts: &ListOptions,
    ) -> StorageResult<ListPage>;

    /// Depth-bounded recursive tree of `dir`. `depth` is the caller's
    /// starting depth (normally 0); `max_depth <= 0` means unbounded,
    /// otherwise descent stops once `depth == max_depth` (the directory
    /// node is still emitted, childless). `no_leaf` omits file nodes.
    /// `page` and `limit` are accepted for contract compatibility and
    /// unused by this operation.
    #[allow(clippy::too_many_arguments)]
    fn tree(
        &self,
        dir: &str,
        page: usize,
        limit: usize,
        depth: i32,
        max_depth: i32,
        no_leaf: bool,
        opts: &ListOptions,
    ) -> StorageResult<Vec<TreeNode>>;
}
