//! Random-access reader over a single blob
//!
//! [`ObjectInputFile`] behaves like a local seekable file. Its size is known
//! once it is open, every read is clamped to that size, and each read issues
//! exactly one ranged download.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::{self, Ready};

use crate::error::{Error, Result, translate_backend_error};
use crate::fs::{InputStream, RandomAccessFile};
use crate::path::BlobPath;
use crate::traits::{BlobClient, Metadata};

/// Reader bound to one blob
///
/// Not meant to be shared between tasks: the cursor is plain state behind
/// `&mut self`. Positional reads only need `&self`. Distinct readers over the
/// same blob are independent.
pub struct ObjectInputFile {
    /// `None` once closed
    client: Option<Arc<dyn BlobClient>>,
    path: BlobPath,
    pos: u64,
    content_length: u64,
    metadata: Arc<Metadata>,
}

impl ObjectInputFile {
    /// Open a reader, fetching the blob's properties unless `size` is given
    ///
    /// With a known size no request is made and the metadata stays empty.
    pub async fn open(
        client: Arc<dyn BlobClient>,
        path: BlobPath,
        size: Option<u64>,
    ) -> Result<Self> {
        if let Some(size) = size {
            return Ok(Self::with_properties(client, path, size, Metadata::new()));
        }

        tracing::debug!(url = %client.url(), "Fetching blob properties");
        match client.get_properties().await {
            Ok(properties) => Ok(Self::with_properties(
                client,
                path,
                properties.size,
                properties.metadata,
            )),
            Err(e) => {
                let prefix = format!("When fetching properties for '{}':", client.url());
                Err(translate_backend_error(&prefix, &path, e))
            }
        }
    }

    fn with_properties(
        client: Arc<dyn BlobClient>,
        path: BlobPath,
        content_length: u64,
        metadata: Metadata,
    ) -> Self {
        Self {
            client: Some(client),
            path,
            pos: 0,
            content_length,
            metadata: Arc::new(metadata),
        }
    }

    /// Path this reader was opened for
    pub fn path(&self) -> &BlobPath {
        &self.path
    }

    fn check_closed(&self, action: &str) -> Result<&Arc<dyn BlobClient>> {
        self.client.as_ref().ok_or_else(|| {
            Error::Closed(format!("Cannot {action} on closed file '{}'.", self.path))
        })
    }

    /// Negative positions are argument errors; positions past the end are
    /// I/O errors. The end itself is a valid position.
    fn check_position(&self, position: i64, action: &str) -> Result<u64> {
        let Ok(offset) = u64::try_from(position) else {
            return Err(Error::InvalidArgument(format!(
                "Cannot {action} from negative position {position} in '{}'",
                self.path
            )));
        };
        if offset > self.content_length {
            return Err(Error::BackendIo(format!(
                "Cannot {action} past end of file '{}': position {position}, size {}",
                self.path, self.content_length
            )));
        }
        Ok(offset)
    }

    fn remaining_from(&self, offset: u64, nbytes: usize) -> usize {
        let remaining = self.content_length - offset;
        // Fits in usize: bounded by nbytes.
        remaining.min(nbytes as u64) as usize
    }

    fn cursor(&self) -> i64 {
        self.pos as i64
    }
}

#[async_trait]
impl InputStream for ObjectInputFile {
    fn tell(&self) -> Result<u64> {
        self.check_closed("tell")?;
        Ok(self.pos)
    }

    fn close(&mut self) -> Result<()> {
        if self.client.take().is_some() {
            tracing::debug!(path = %self.path, "Closed blob reader");
        }
        Ok(())
    }

    fn closed(&self) -> bool {
        self.client.is_none()
    }

    fn read_metadata(&self) -> Result<Arc<Metadata>> {
        self.check_closed("read metadata")?;
        Ok(self.metadata.clone())
    }

    fn read_metadata_async(&self) -> Ready<Result<Arc<Metadata>>> {
        future::ready(self.read_metadata())
    }

    async fn read_into(&mut self, out: &mut [u8]) -> Result<usize> {
        let bytes_read = self.read_at_into(self.cursor(), out).await?;
        self.pos += bytes_read as u64;
        Ok(bytes_read)
    }

    async fn read(&mut self, nbytes: usize) -> Result<Bytes> {
        let buffer = self.read_at(self.cursor(), nbytes).await?;
        self.pos += buffer.len() as u64;
        Ok(buffer)
    }
}

#[async_trait]
impl RandomAccessFile for ObjectInputFile {
    fn get_size(&self) -> Result<u64> {
        self.check_closed("size")?;
        Ok(self.content_length)
    }

    fn seek(&mut self, position: i64) -> Result<()> {
        self.check_closed("seek")?;
        self.pos = self.check_position(position, "seek")?;
        Ok(())
    }

    async fn read_at_into(&self, position: i64, out: &mut [u8]) -> Result<usize> {
        let client = self.check_closed("read")?;
        let offset = self.check_position(position, "read")?;

        let nbytes = self.remaining_from(offset, out.len());
        if nbytes == 0 {
            return Ok(0);
        }

        tracing::debug!(url = %client.url(), offset, nbytes, "Reading blob range");
        let bytes_read = client
            .download_range(offset, &mut out[..nbytes])
            .await
            .map_err(|e| {
                let prefix = format!(
                    "When reading from '{}' at position {offset} for {nbytes} bytes:",
                    client.url()
                );
                translate_backend_error(&prefix, &self.path, e)
            })?;

        Ok(bytes_read.min(nbytes))
    }

    async fn read_at(&self, position: i64, nbytes: usize) -> Result<Bytes> {
        self.check_closed("read")?;
        let offset = self.check_position(position, "read")?;

        let nbytes = self.remaining_from(offset, nbytes);
        let mut buffer = vec![0u8; nbytes];
        if nbytes > 0 {
            let bytes_read = self.read_at_into(position, &mut buffer).await?;
            buffer.truncate(bytes_read);
        }
        Ok(Bytes::from(buffer))
    }
}
