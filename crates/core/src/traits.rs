//! Remote object-store capability
//!
//! These traits are what the reader and the filesystem facade need from a
//! backend. They are implemented by `bfs-azure` for the Blob REST API and by
//! in-memory stand-ins in tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{BackendError, Result};

/// User-defined key/value metadata attached to a blob
///
/// Backends that carry metadata in HTTP headers report keys in lowercase,
/// whatever case they were stored with.
pub type Metadata = BTreeMap<String, String>;

/// Result of a property fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobProperties {
    /// Blob size in bytes
    pub size: u64,
    /// User-defined metadata
    pub metadata: Metadata,
}

impl BlobProperties {
    pub fn new(size: u64) -> Self {
        Self {
            size,
            metadata: Metadata::new(),
        }
    }
}

/// Handle to one blob
///
/// Handles are shared between readers through `Arc`, so implementations must
/// be safe for concurrent read-only use.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobClient: Send + Sync {
    /// URL of the blob, used in diagnostics
    fn url(&self) -> String;

    /// Fetch size and metadata
    ///
    /// Metadata keys may come back lowercased (see [`Metadata`]).
    async fn get_properties(&self) -> std::result::Result<BlobProperties, BackendError>;

    /// Download `out.len()` bytes starting at `offset` into `out`
    ///
    /// Returns the number of bytes the service actually sent, which may be
    /// fewer than requested.
    async fn download_range(
        &self,
        offset: u64,
        out: &mut [u8],
    ) -> std::result::Result<usize, BackendError>;
}

/// Entry point to a storage account
pub trait BlobService: Send + Sync {
    /// Obtain a handle for `blob` inside `container`; no network call is made
    fn blob_client(&self, container: &str, blob: &str) -> Result<Arc<dyn BlobClient>>;
}
