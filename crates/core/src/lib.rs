//! bfs-core: Core library for blobfs
//!
//! This crate exposes a container/blob object store through a generic
//! hierarchical filesystem interface:
//! - Path parsing and validation (`container/segment/...`)
//! - A random-access reader over a single remote blob
//! - A filesystem facade that opens readers from paths or path hints
//! - Storage options and profile configuration
//!
//! The remote service itself is reached through the [`BlobService`] and
//! [`BlobClient`] traits, so this crate does not depend on any particular
//! HTTP stack. `bfs-azure` provides the Azure Blob implementation.

pub mod config;
pub mod error;
pub mod filesystem;
pub mod fs;
pub mod options;
pub mod path;
pub mod reader;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{Config, ConfigManager, Profile, RetryConfig};
pub use error::{BackendError, Error, Result, translate_backend_error};
pub use filesystem::BlobFileSystem;
pub use fs::{
    FileInfo, FileSelector, FileSystem, FileType, InputStream, OutputStream, RandomAccessFile,
};
pub use options::{AzureBackend, Credentials, CredentialsKind, StorageOptions};
pub use path::BlobPath;
pub use reader::ObjectInputFile;
pub use traits::{BlobClient, BlobProperties, BlobService, Metadata};
