//! Common error types for fansync.

use std::path::PathBuf;
use thiserror::Error;

/// Common error type for fansync operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("usage error: {0}")]
    Usage(String),

    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("no bundles found under {0}")]
    NoBundles(PathBuf),

    #[error("not a bundle name: {0}")]
    InvalidBundleName(String),

    #[error("bundle already exists: {0}")]
    BundleExists(PathBuf),

    #[error("invalid bundle: {0}")]
    InvalidBundle(String),

    #[error("checksum mismatch for {file}: expected {expected}, got {actual}")]
    Verification {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("insufficient privileges for {path}: {source}")]
    Privilege {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid metadata record: {0}")]
    Metadata(String),

    #[error("invalid checksum manifest: {0}")]
    Manifest(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias using common Error.
pub type Result<T> = std::result::Result<T, Error>;

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(e.to_string())
    }
}

impl Error {
    /// Classify an IO failure against `path`: permission problems become
    /// `Privilege`, a missing path becomes `PathNotFound`.
    pub fn from_io(e: std::io::Error, path: &std::path::Path) -> Self {
        match e.kind() {
            std::io::ErrorKind::PermissionDenied => Error::Privilege {
                path: path.to_path_buf(),
                source: e,
            },
            std::io::ErrorKind::NotFound => Error::PathNotFound(path.to_path_buf()),
            _ => Error::Io(e),
        }
    }
}
