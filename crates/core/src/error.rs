//! Error types for blobfs
//!
//! Every failure surfaced by the adapter maps onto one of a small, stable set
//! of kinds. Backend failures arrive as [`BackendError`] and are turned into
//! [`Error`] by [`translate_backend_error`].

use http::StatusCode;
use thiserror::Error;

use crate::path::BlobPath;

/// Result type alias for blobfs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for blobfs operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed path string, URI-shaped input or failed segment validation
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The backend (or a caller-supplied hint) reports the path as missing
    #[error("Path does not exist '{0}'")]
    PathNotFound(String),

    /// The path names a container or a non-file entry
    #[error("Not a regular file: '{0}'")]
    NotAFile(String),

    /// Operation attempted on a closed reader
    #[error("{0}")]
    Closed(String),

    /// Negative position or similar argument error
    #[error("{0}")]
    InvalidArgument(String),

    /// Position past the known end, or any other backend failure
    #[error("{0}")]
    BackendIo(String),

    /// Member of the filesystem interface that this adapter does not provide
    #[error("{0}")]
    NotImplemented(String),

    /// Invalid options, profile or configuration file contents
    #[error("Configuration error: {0}")]
    Config(String),

    /// No profile with this name in the configuration file
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// Local I/O error (configuration file access)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML encoding or decoding failure
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Shorthand for [`Error::PathNotFound`]
    pub fn path_not_found(path: impl Into<String>) -> Self {
        Error::PathNotFound(path.into())
    }

    /// Shorthand for [`Error::NotAFile`]
    pub fn not_a_file(path: impl Into<String>) -> Self {
        Error::NotAFile(path.into())
    }

    /// Returns true if the error means the target does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::PathNotFound(_))
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// A failed call to the remote object store
///
/// Carries the HTTP status when the service answered, and the backend's own
/// diagnostic text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    /// Status reported by the service, `None` for transport failures
    pub status: Option<StatusCode>,
    /// Backend diagnostic text, kept verbatim
    pub message: String,
}

impl BackendError {
    pub fn new(status: Option<StatusCode>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// A "not found" answer from the service
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Some(StatusCode::NOT_FOUND), message)
    }

    /// A failure that never reached the service
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(StatusCode::NOT_FOUND)
    }
}

/// Translate a backend failure into the adapter's error taxonomy
///
/// A "not found" status becomes [`Error::PathNotFound`] for `path`. At this
/// layer it is not possible to tell whether the container or the blob was
/// missing. Anything else becomes [`Error::BackendIo`] carrying `prefix` and
/// the backend message.
pub fn translate_backend_error(prefix: &str, path: &BlobPath, err: BackendError) -> Error {
    if err.is_not_found() {
        return Error::path_not_found(path.full_path());
    }
    Error::BackendIo(format!("{prefix} Azure Error: {}", err.message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_translates_to_path_not_found() {
        let path = BlobPath::parse("container/dir/file.txt").unwrap();
        let err = translate_backend_error(
            "When fetching properties:",
            &path,
            BackendError::not_found("BlobNotFound"),
        );
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "Path does not exist 'container/dir/file.txt'"
        );
    }

    #[test]
    fn test_other_failure_keeps_prefix_and_message() {
        let path = BlobPath::parse("container/file").unwrap();
        let err = translate_backend_error(
            "When reading from 'http://host/container/file' at position 0 for 4 bytes:",
            &path,
            BackendError::new(Some(StatusCode::FORBIDDEN), "AuthorizationFailure"),
        );
        match err {
            Error::BackendIo(msg) => {
                assert!(msg.starts_with("When reading from 'http://host/container/file'"));
                assert!(msg.ends_with("Azure Error: AuthorizationFailure"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_transport_failure_is_not_not_found() {
        let err = BackendError::transport("connection reset");
        assert!(!err.is_not_found());
        assert_eq!(err.status, None);
        assert_eq!(err.to_string(), "connection reset");
    }
}
