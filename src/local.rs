//! # Local Filesystem Bucket
//!
//! [`BucketBackend`] over a directory rooted at `root/bucket`. Every
//! logical path is confined under that base: `..` segments are rejected
//! outright, and missing parent directories are created on write. All operations are blocking and open their own
//! handles per call.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};
use tracing::warn;

use crate::backend::{Bucket, BucketBackend, ListOptions, ListPage, RemoteFetch};
use crate::entry::{join_logical, EntryKind, EntryRef, TreeNode};
use crate::errors::{StorageError, StorageResult};
use crate::walk::{self, ExcludeFilter};

/// Driver identifier reported by [`BucketBackend::driver_name`]
pub const DRIVER_NAME: &str = "local";

/// Local-filesystem bucket backend
pub struct LocalBucket {
    root: PathBuf,
    bucket: String,
    filter: Option<Box<ExcludeFilter>>,
}

impl fmt::Debug for LocalBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalBucket")
            .field("root", &self.root)
            .field("bucket", &self.bucket)
            .field("filter", &self.filter.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl LocalBucket {
    /// Create a backend scoped to `root/bucket`, creating that directory
    /// (and all ancestors) if missing. An init failure leaves no usable
    /// instance.
    ///
    /// `filter` is the exclusion predicate applied to every traversal
    /// entry; `None` excludes nothing.
    pub fn new(
        root: impl Into<PathBuf>,
        bucket: impl Into<String>,
        filter: Option<Box<ExcludeFilter>>,
    ) -> StorageResult<Self> {
        let root = root.into();
        let bucket = bucket.into();
        let base = root.join(&bucket);
        fs::create_dir_all(&base)
            .map_err(|e| StorageError::BucketInit(format!("{}: {}", base.display(), e)))?;
        Ok(Self { root, bucket, filter })
    }

    /// Map a logical path to its real path under `root/bucket`. Paths
    /// carrying `..` segments are rejected so the result cannot escape the
    /// base. With `create_parents`, missing ancestors of the target are
    /// created first and a create failure is surfaced to the caller.
    fn resolve(&self, logical: &str, create_parents: bool) -> StorageResult<PathBuf> {
        let relative = logical.trim_start_matches('/');
        if Path::new(relative)
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(StorageError::InvalidPath(logical.to_string()));
        }
        let real = self.root.join(&self.bucket).join(relative);
        if create_parents {
            if let Some(parent) = real.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| StorageError::Io(format!("{}: {}", parent.display(), e)))?;
            }
        }
        Ok(real)
    }

    fn filter(&self) -> Option<&ExcludeFilter> {
        self.filter.as_deref()
    }

    /// Probe a directory argument, turning "missing" and "not a directory"
    /// into their dedicated errors.
    fn resolve_dir(&self, dir: &str) -> StorageResult<PathBuf> {
        let real = self.resolve(dir, false)?;
        let (exists, is_dir) = walk::probe(&real)?;
        if !exists {
            return Err(StorageError::PathNotFound(dir.to_string()));
        }
        if !is_dir {
            return Err(StorageError::NotADirectory(dir.to_string()));
        }
        Ok(real)
    }
}

impl BucketBackend for LocalBucket {
    fn bucket_name(&self) -> &str {
        &self.bucket
    }

    fn driver_name(&self) -> &str {
        DRIVER_NAME
    }

    fn remote_buckets(&self, _opts: &ListOptions) -> Vec<Bucket> {
        // No remote namespace concept for the local driver.
        Vec::new()
    }

    fn put(&self, name: &str, reader: &mut dyn Read) -> StorageResult<()> {
        let path = self.resolve(name, true)?;
        let mut out = File::create(&path).map_err(|e| {
            warn!(driver = DRIVER_NAME, bucket = %self.bucket, name, error = %e, "put: failed to create file");
            StorageError::Io(format!("failed to create file: {}", e))
        })?;
        io::copy(reader, &mut out).map_err(|e| {
            warn!(driver = DRIVER_NAME, bucket = %self.bucket, name, error = %e, "put: failed to save file");
            StorageError::Io(format!("failed to save file: {}", e))
        })?;
        Ok(())
    }

    fn put_from_file(&self, name: &str, source: &str) -> StorageResult<()> {
        let source_path = self.resolve(source, false)?;
        let mut file = File::open(&source_path).map_err(|e| {
            warn!(driver = DRIVER_NAME, bucket = %self.bucket, source, error = %e, "put: failed to open source file");
            StorageError::from_io(source, e)
        })?;
        self.put(name, &mut file)
    }

    fn get(&self, name: &str) -> StorageResult<Vec<u8>> {
        let path = self.resolve(name, false)?;
        fs::read(&path).map_err(|e| StorageError::from_io(name, e))
    }

    fn get_to_file(
        &self,
        name: &str,
        dest: &str,
        remote_fetch: Option<RemoteFetch<'_>>,
    ) -> StorageResult<()> {
        if let Some(fetch) = remote_fetch {
            let bytes = fetch(dest)
                .map_err(|e| StorageError::Io(format!("remote fetch failed: {}", e)))?;
            return self.put(name, &mut bytes.as_slice());
        }
        Ok(())
    }

    fn delete(&self, name: &str) -> StorageResult<()> {
        if name.is_empty() {
            return Ok(());
        }
        let path = self.resolve(name, false)?;
        fs::remove_file(&path).map_err(|e| StorageError::from_io(name, e))
    }

    fn delete_all(&self, dir: &str) -> StorageResult<()> {
        if dir.is_empty() {
            return Ok(());
        }
        let path = self.resolve(dir, false)?;
        let entries = match fs::read_dir(&path) {
            Ok(entries) => entries,
            Err(_) => return Ok(()),
        };

        for entry in entries.flatten() {
            let logical = join_logical(dir, &entry.file_name().to_string_lossy());
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                self.delete_all(&logical)?;
            } else {
                // Concurrent deleters may have raced us here.
                let _ = self.delete(&logical);
            }
        }

        let _ = fs::remove_dir(&path);
        Ok(())
    }

    fn delete_multi(&self, entries: &[EntryRef]) -> StorageResult<()> {
        for entry in entries {
            match entry.kind {
                EntryKind::File => {
                    let _ = self.delete(&entry.path);
                }
                EntryKind::Dir => {
                    let _ = self.delete_all(&entry.path);
                }
            }
        }
        Ok(())
    }

    fn exists(&self, name: &str) -> StorageResult<bool> {
        let path = self.resolve(name, false)?;
        let (exists, _) = walk::probe(&path)?;
        Ok(exists)
    }

    fn copy(&self, dest: &str, source: &str) -> StorageResult<()> {
        self.put_from_file(dest, source)
    }

    fn mv(&self, dest: &str, source: &str) -> StorageResult<()> {
        self.put_from_file(dest, source)?;
        self.delete(source)
    }

    fn append(&self, name: &str, _position: u64, reader: &mut dyn Read) -> StorageResult<usize> {
        let path = self.resolve(name, false)?;
        let file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|e| {
                warn!(driver = DRIVER_NAME, bucket = %self.bucket, name, error = %e, "append: failed to open file");
                StorageError::from_io(name, e)
            })?;

        let mut data = Vec::new();
        reader.read_to_end(&mut data).map_err(|e| {
            warn!(driver = DRIVER_NAME, bucket = %self.bucket, name, error = %e, "append: reader error");
            StorageError::Io(format!("append: {}", e))
        })?;

        let mut writer = BufWriter::new(file);
        writer
            .write_all(&data)
            .and_then(|_| writer.flush())
            .map_err(|e| {
                warn!(driver = DRIVER_NAME, bucket = %self.bucket, name, error = %e, "append: failed to write file");
                StorageError::Io(format!("append: {}", e))
            })?;
        Ok(data.len())
    }

    fn list(
        &self,
        dir: &str,
        page: usize,
        page_size: usize,
        opts: &ListOptions,
    ) -> StorageResult<ListPage> {
        let real = self.resolve_dir(dir)?;
        walk::paginate(&real, dir, page, page_size, opts.with_child_count, self.filter())
    }

    fn tree(
        &self,
        dir: &str,
        _page: usize,
        _limit: usize,
        depth: i32,
        max_depth: i32,
        no_leaf: bool,
        opts: &ListOptions,
    ) -> StorageResult<Vec<TreeNode>> {
        let real = self.resolve_dir(dir)?;
        Ok(walk::build_tree(
            &real,
            dir,
            depth,
            max_depth,
            no_leaf,
            opts.with_child_count,
            self.filter(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_bucket(temp: &TempDir) -> LocalBucket {
        LocalBucket::new(temp.path(), "test", None).unwrap()
    }

    #[test]
    fn test_new_creates_bucket_root() {
        let temp = TempDir::new().unwrap();
        let bucket = create_bucket(&temp);
        assert!(temp.path().join("test").is_dir());
        assert_eq!(bucket.bucket_name(), "test");
        assert_eq!(bucket.driver_name(), "local");
    }

    #[test]
    fn test_resolve_strips_leading_slash() {
        let temp = TempDir::new().unwrap();
        let bucket = create_bucket(&temp);

        bucket.put_string("/a/b/c.txt", "x").unwrap();
        assert!(temp.path().join("test/a/b/c.txt").is_file());
        assert!(bucket.exists("a/b/c.txt").unwrap());
    }

    #[test]
    fn test_resolve_rejects_parent_segments() {
        let temp = TempDir::new().unwrap();
        let bucket = create_bucket(&temp);

        assert!(matches!(
            bucket.get("../outside.txt"),
            Err(StorageError::InvalidPath(_))
        ));
        assert!(matches!(
            bucket.put_string("a/../../outside.txt", "x"),
            Err(StorageError::InvalidPath(_))
        ));
        assert!(!temp.path().join("outside.txt").exists());
    }

    #[test]
    fn test_put_creates_parents() {
        let temp = TempDir::new().unwrap();
        let bucket = create_bucket(&temp);

        bucket.put_string("deep/nested/dirs/file.txt", "content").unwrap();
        assert_eq!(bucket.get("deep/nested/dirs/file.txt").unwrap(), b"content");
    }

    #[test]
    fn test_put_truncates_existing() {
        let temp = TempDir::new().unwrap();
        let bucket = create_bucket(&temp);

        bucket.put_string("f.txt", "long original content").unwrap();
        bucket.put_string("f.txt", "short").unwrap();
        assert_eq!(bucket.get("f.txt").unwrap(), b"short");
    }

    #[test]
    fn test_get_missing_is_path_not_found() {
        let temp = TempDir::new().unwrap();
        let bucket = create_bucket(&temp);
        assert!(matches!(
            bucket.get("missing.txt"),
            Err(StorageError::PathNotFound(_))
        ));
    }

    #[test]
    fn test_delete_empty_name_is_noop() {
        let temp = TempDir::new().unwrap();
        let bucket = create_bucket(&temp);
        bucket.delete("").unwrap();
    }

    #[test]
    fn test_delete_missing_is_path_not_found() {
        let temp = TempDir::new().unwrap();
        let bucket = create_bucket(&temp);
        assert!(matches!(
            bucket.delete("missing.txt"),
            Err(StorageError::PathNotFound(_))
        ));
    }

    #[test]
    fn test_append_requires_existing_file() {
        let temp = TempDir::new().unwrap();
        let bucket = create_bucket(&temp);
        let result = bucket.append_string("missing.txt", 0, "tail");
        assert!(matches!(result, Err(StorageError::PathNotFound(_))));
    }

    #[test]
    fn test_append_targets_end_of_file() {
        let temp = TempDir::new().unwrap();
        let bucket = create_bucket(&temp);

        bucket.put_string("log.txt", "head").unwrap();
        // Position is accepted but ignored: the write lands at EOF.
        let written = bucket.append_string("log.txt", 1, "-tail").unwrap();
        assert_eq!(written, 5);
        assert_eq!(bucket.get("log.txt").unwrap(), b"head-tail");
    }

    #[test]
    fn test_list_missing_dir_errors() {
        let temp = TempDir::new().unwrap();
        let bucket = create_bucket(&temp);
        assert!(matches!(
            bucket.list("nowhere", 1, 10, &ListOptions::default()),
            Err(StorageError::PathNotFound(_))
        ));
    }

    #[test]
    fn test_list_on_file_errors() {
        let temp = TempDir::new().unwrap();
        let bucket = create_bucket(&temp);
        bucket.put_string("plain.txt", "x").unwrap();
        assert!(matches!(
            bucket.list("plain.txt", 1, 10, &ListOptions::default()),
            Err(StorageError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_exclusion_filter_applies_to_listing() {
        let temp = TempDir::new().unwrap();
        let filter: Box<ExcludeFilter> = Box::new(|path, _| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with('.'))
                .unwrap_or(false)
        });
        let bucket = LocalBucket::new(temp.path(), "test", Some(filter)).unwrap();

        bucket.put_string("visible.txt", "v").unwrap();
        bucket.put_string(".hidden", "h").unwrap();

        let page = bucket.list("", 1, 10, &ListOptions::default()).unwrap();
        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].path, "visible.txt");
        assert_eq!(page.total_scanned, 1);
    }

    #[test]
    fn test_remote_buckets_empty() {
        let temp = TempDir::new().unwrap();
        let bucket = create_bucket(&temp);
        assert!(bucket.remote_buckets(&ListOptions::default()).is_empty());
    }
}
