//! In-memory blob service for unit tests
//!
//! Counts every call so tests can assert how many round trips an operation
//! made.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use http::StatusCode;

use crate::error::{BackendError, Result};
use crate::traits::{BlobClient, BlobProperties, BlobService, Metadata};

#[derive(Debug, Default)]
pub(crate) struct CallCounts {
    pub clients: AtomicUsize,
    pub properties: AtomicUsize,
    pub downloads: AtomicUsize,
}

impl CallCounts {
    pub fn network_calls(&self) -> usize {
        self.properties.load(Ordering::SeqCst) + self.downloads.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
struct StoredBlob {
    data: Vec<u8>,
    metadata: Metadata,
}

#[derive(Default)]
pub(crate) struct MemoryBlobService {
    blobs: HashMap<(String, String), StoredBlob>,
    max_chunk: Option<usize>,
    pub calls: Arc<CallCounts>,
}

impl MemoryBlobService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(mut self, container: &str, blob: &str, data: &[u8]) -> Self {
        self.blobs.insert(
            (container.to_string(), blob.to_string()),
            StoredBlob {
                data: data.to_vec(),
                metadata: Metadata::new(),
            },
        );
        self
    }

    pub fn with_metadata(mut self, container: &str, blob: &str, key: &str, value: &str) -> Self {
        if let Some(stored) = self
            .blobs
            .get_mut(&(container.to_string(), blob.to_string()))
        {
            stored.metadata.insert(key.to_string(), value.to_string());
        }
        self
    }

    /// Never return more than `max_chunk` bytes from one download
    pub fn with_short_reads(mut self, max_chunk: usize) -> Self {
        self.max_chunk = Some(max_chunk);
        self
    }

    pub fn memory_client(&self, container: &str, blob: &str) -> MemoryBlobClient {
        MemoryBlobClient {
            url: format!("memory://{container}/{blob}"),
            blob: self
                .blobs
                .get(&(container.to_string(), blob.to_string()))
                .cloned(),
            max_chunk: self.max_chunk,
            calls: self.calls.clone(),
        }
    }
}

impl BlobService for MemoryBlobService {
    fn blob_client(&self, container: &str, blob: &str) -> Result<Arc<dyn BlobClient>> {
        self.calls.clients.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(self.memory_client(container, blob)))
    }
}

pub(crate) struct MemoryBlobClient {
    url: String,
    blob: Option<StoredBlob>,
    max_chunk: Option<usize>,
    calls: Arc<CallCounts>,
}

#[async_trait]
impl BlobClient for MemoryBlobClient {
    fn url(&self) -> String {
        self.url.clone()
    }

    async fn get_properties(&self) -> std::result::Result<BlobProperties, BackendError> {
        self.calls.properties.fetch_add(1, Ordering::SeqCst);
        let blob = self
            .blob
            .as_ref()
            .ok_or_else(|| BackendError::not_found("BlobNotFound"))?;
        Ok(BlobProperties {
            size: blob.data.len() as u64,
            metadata: blob.metadata.clone(),
        })
    }

    async fn download_range(
        &self,
        offset: u64,
        out: &mut [u8],
    ) -> std::result::Result<usize, BackendError> {
        self.calls.downloads.fetch_add(1, Ordering::SeqCst);
        let blob = self
            .blob
            .as_ref()
            .ok_or_else(|| BackendError::not_found("BlobNotFound"))?;

        let start = offset as usize;
        if start >= blob.data.len() {
            return Err(BackendError::new(
                Some(StatusCode::RANGE_NOT_SATISFIABLE),
                "InvalidRange",
            ));
        }
        let mut end = (start + out.len()).min(blob.data.len());
        if let Some(max_chunk) = self.max_chunk {
            end = end.min(start + max_chunk);
        }
        let n = end - start;
        out[..n].copy_from_slice(&blob.data[start..end]);
        Ok(n)
    }
}
