//! cat command - Stream blob contents to stdout

use std::io::Write;

use anyhow::Context;
use clap::Args;

use bfs_core::{InputStream, ObjectInputFile, RandomAccessFile};

use crate::commands::open_remote;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Bytes requested per read
const CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Write a blob, or a byte range of it, to stdout
#[derive(Args, Debug)]
pub struct CatArgs {
    /// Blob to read (profile/container/blob)
    pub path: String,

    /// Start reading at this byte offset
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub offset: i64,

    /// Stop after this many bytes
    #[arg(long)]
    pub length: Option<u64>,
}

/// Execute the cat command
pub async fn execute(args: CatArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let (_, mut reader) = match open_remote(&args.path, &formatter).await {
        Ok(opened) => opened,
        Err(code) => return code,
    };

    let stdout = std::io::stdout();
    let result = copy_range(&mut reader, args.offset, args.length, &mut stdout.lock()).await;
    if let Err(e) = reader.close() {
        tracing::debug!(error = %e, "Failed to close reader");
    }

    match result {
        Ok(written) => {
            tracing::debug!(path = %args.path, written, "Finished streaming blob");
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            match e.downcast_ref::<bfs_core::Error>() {
                Some(err) => ExitCode::from(err),
                None => ExitCode::GeneralError,
            }
        }
    }
}

/// Seek to `offset` and copy up to `length` bytes into `out`
///
/// Returns the number of bytes written. Fails if the backend stops
/// returning data before the end of the blob or of the requested range.
async fn copy_range<W: Write>(
    reader: &mut ObjectInputFile,
    offset: i64,
    length: Option<u64>,
    out: &mut W,
) -> anyhow::Result<u64> {
    if offset != 0 {
        reader.seek(offset)?;
    }
    let start = reader.tell()?;
    let size = reader.get_size()?;
    let end = length.map_or(size, |len| size.min(start.saturating_add(len)));

    let mut remaining = length.unwrap_or(u64::MAX);
    let mut written = 0u64;
    while remaining > 0 {
        let nbytes = remaining.min(CHUNK_SIZE as u64) as usize;
        let chunk = reader.read(nbytes).await?;
        if chunk.is_empty() {
            break;
        }
        out.write_all(&chunk).context("Failed to write to stdout")?;
        written += chunk.len() as u64;
        remaining -= chunk.len() as u64;
    }
    out.flush().context("Failed to write to stdout")?;

    let position = reader.tell()?;
    if position < end {
        return Err(bfs_core::Error::BackendIo(format!(
            "Blob '{}' ended at byte {position}, expected data up to byte {end}",
            reader.path()
        ))
        .into());
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use bfs_core::{BackendError, BlobClient, BlobPath, BlobProperties};

    const DATA: &[u8] = b"The quick brown fox";

    struct StaticBlob;

    #[async_trait]
    impl BlobClient for StaticBlob {
        fn url(&self) -> String {
            "memory://c/fox.txt".to_string()
        }

        async fn get_properties(&self) -> Result<BlobProperties, BackendError> {
            Ok(BlobProperties::new(DATA.len() as u64))
        }

        async fn download_range(
            &self,
            offset: u64,
            out: &mut [u8],
        ) -> Result<usize, BackendError> {
            let start = offset as usize;
            let n = out.len().min(DATA.len() - start);
            out[..n].copy_from_slice(&DATA[start..start + n]);
            Ok(n)
        }
    }

    async fn open() -> ObjectInputFile {
        let path = BlobPath::parse("c/fox.txt").unwrap();
        ObjectInputFile::open(Arc::new(StaticBlob), path, None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_copy_whole_blob() {
        let mut reader = open().await;
        let mut out = Vec::new();
        let written = copy_range(&mut reader, 0, None, &mut out).await.unwrap();
        assert_eq!(written, DATA.len() as u64);
        assert_eq!(out, DATA);
    }

    #[tokio::test]
    async fn test_copy_range() {
        let mut reader = open().await;
        let mut out = Vec::new();
        copy_range(&mut reader, 4, Some(5), &mut out).await.unwrap();
        assert_eq!(out, b"quick");
    }

    #[tokio::test]
    async fn test_copy_past_end_fails() {
        let mut reader = open().await;
        let mut out = Vec::new();
        let err = copy_range(&mut reader, 100, None, &mut out)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<bfs_core::Error>(),
            Some(bfs_core::Error::BackendIo(_))
        ));
        assert!(out.is_empty());
    }

    /// Reports the full size but stops returning data after three bytes
    struct StallingBlob;

    #[async_trait]
    impl BlobClient for StallingBlob {
        fn url(&self) -> String {
            "memory://c/stall.txt".to_string()
        }

        async fn get_properties(&self) -> Result<BlobProperties, BackendError> {
            Ok(BlobProperties::new(DATA.len() as u64))
        }

        async fn download_range(
            &self,
            offset: u64,
            out: &mut [u8],
        ) -> Result<usize, BackendError> {
            let start = offset as usize;
            let n = out.len().min(3usize.saturating_sub(start));
            out[..n].copy_from_slice(&DATA[start..start + n]);
            Ok(n)
        }
    }

    #[tokio::test]
    async fn test_copy_short_backend_read_fails() {
        let path = BlobPath::parse("c/stall.txt").unwrap();
        let mut reader = ObjectInputFile::open(Arc::new(StallingBlob), path, None)
            .await
            .unwrap();
        let mut out = Vec::new();
        let err = copy_range(&mut reader, 0, None, &mut out).await.unwrap_err();
        match err.downcast_ref::<bfs_core::Error>() {
            Some(bfs_core::Error::BackendIo(msg)) => {
                assert!(msg.contains("c/stall.txt"));
                assert!(msg.contains("expected data up to byte 19"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(out, b"The");
    }

    #[tokio::test]
    async fn test_copy_range_clamped_to_blob_end() {
        let mut reader = open().await;
        let mut out = Vec::new();
        let written = copy_range(&mut reader, 16, Some(100), &mut out)
            .await
            .unwrap();
        assert_eq!(written, 3);
        assert_eq!(out, b"fox");
    }

    #[tokio::test]
    async fn test_copy_negative_offset_fails() {
        let mut reader = open().await;
        let mut out = Vec::new();
        let err = copy_range(&mut reader, -1, None, &mut out).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<bfs_core::Error>(),
            Some(bfs_core::Error::InvalidArgument(_))
        ));
    }
}
