//! # Storage Errors

use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Bucket storage errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Bucket init failed: {0}")]
    BucketInit(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Traversal error: {0}")]
    Traversal(String),
}

impl StorageError {
    /// Map an I/O error for `path`, keeping NotFound distinct from other
    /// failures.
    pub(crate) fn from_io(path: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            StorageError::PathNotFound(path.to_string())
        } else {
            StorageError::Io(format!("{}: {}", path, err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_not_found() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(
            StorageError::from_io("a/b.txt", err),
            StorageError::PathNotFound(p) if p == "a/b.txt"
        ));
    }

    #[test]
    fn test_from_io_other() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(
            StorageError::from_io("a/b.txt", err),
            StorageError::Io(_)
        ));
    }
}
