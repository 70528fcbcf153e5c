//! # bucketfs
//!
//! Local-filesystem bucket object store: bucket-scoped CRUD plus two
//! discovery operations — an offset-paginated flat listing and a
//! depth-bounded recursive tree — over a directory rooted at
//! `root/bucket`, under an injectable exclusion predicate.
//!
//! The [`BucketBackend`] trait is the pluggable contract a higher-level
//! manager consumes; [`LocalBucket`] is its filesystem implementation.
//!
//! ```no_run
//! use bucketfs::{BucketBackend, ListOptions, LocalBucket};
//!
//! let bucket = LocalBucket::new("/var/data", "avatars", None)?;
//! bucket.put_string("users/42/profile.txt", "hello")?;
//! let page = bucket.list("users", 1, 50, &ListOptions::default())?;
//! # Ok::<(), bucketfs::StorageError>(())
//! ```

pub mod backend;
pub mod entry;
pub mod errors;
pub mod local;
pub mod walk;

pub use backend::{Bucket, BucketBackend, ListOptions, ListPage, RemoteFetch};
pub use entry::{EntryDescriptor, EntryKind, EntryRef, TreeNode};
pub use errors::{StorageError, StorageResult};
pub use local::{LocalBucket, DRIVER_NAME};
pub use walk::ExcludeFilter;
