//! bfs-azure: Azure Blob Storage backend for blobfs
//!
//! This crate implements the `BlobService` and `BlobClient` traits defined in
//! bfs-core on top of the Blob REST API, using reqwest for transport.

pub mod auth;
pub mod client;

pub use auth::SharedKeySigner;
pub use client::{AzureBlobClient, AzureBlobService};

use std::sync::Arc;

use bfs_core::{BlobFileSystem, BlobService, Result, StorageOptions};

/// Create a filesystem for the account described by `options`
///
/// Fails only if the options cannot produce a service (bad endpoint or
/// credentials). No request is sent.
pub fn make(options: StorageOptions) -> Result<BlobFileSystem> {
    BlobFileSystem::make(options, |options| {
        let service: Arc<dyn BlobService> = Arc::new(AzureBlobService::new(options)?);
        Ok(service)
    })
}
