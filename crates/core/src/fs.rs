//! Generic hierarchical filesystem interface
//!
//! A backend-neutral view of a filesystem: info queries, directory and file
//! management, and input/output streams. Adapters may implement only part of
//! it and answer [`Error::NotImplemented`](crate::Error::NotImplemented) for
//! the rest.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::Ready;

use crate::error::Result;
use crate::traits::Metadata;

/// Kind of entry a [`FileInfo`] describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileType {
    /// Entry does not exist
    NotFound,
    /// Entry exists but its type is not known
    #[default]
    Unknown,
    /// Regular file
    File,
    /// Directory
    Directory,
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileType::NotFound => write!(f, "not-found"),
            FileType::Unknown => write!(f, "unknown"),
            FileType::File => write!(f, "file"),
            FileType::Directory => write!(f, "directory"),
        }
    }
}

/// Caller-supplied description of a path
///
/// Passing one to an open call lets the filesystem skip a metadata round trip
/// when the type and size are already known.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileInfo {
    path: String,
    file_type: FileType,
    size: Option<u64>,
}

impl FileInfo {
    pub fn new(path: impl Into<String>, file_type: FileType) -> Self {
        Self {
            path: path.into(),
            file_type,
            size: None,
        }
    }

    /// Info for a regular file of known size
    pub fn file(path: impl Into<String>, size: u64) -> Self {
        Self::new(path, FileType::File).with_size(size)
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// Size in bytes, if known
    pub fn size(&self) -> Option<u64> {
        self.size
    }
}

/// Selection of entries below a base directory
#[derive(Debug, Clone, Default)]
pub struct FileSelector {
    pub base_dir: String,
    pub allow_not_found: bool,
    pub recursive: bool,
}

/// Sequential read access to a file
#[async_trait]
pub trait InputStream: Send + Sync {
    /// Current position
    fn tell(&self) -> Result<u64>;

    /// Release resources; no further I/O is possible afterwards
    fn close(&mut self) -> Result<()>;

    fn closed(&self) -> bool;

    /// Metadata attached to the file
    fn read_metadata(&self) -> Result<Arc<Metadata>>;

    /// Metadata attached to the file, as an already-resolved future
    fn read_metadata_async(&self) -> Ready<Result<Arc<Metadata>>>;

    /// Read up to `out.len()` bytes at the current position and advance
    async fn read_into(&mut self, out: &mut [u8]) -> Result<usize>;

    /// Read up to `nbytes` bytes at the current position and advance
    async fn read(&mut self, nbytes: usize) -> Result<Bytes>;
}

/// Positional read access to a file of known size
#[async_trait]
pub trait RandomAccessFile: InputStream {
    /// Total size in bytes
    fn get_size(&self) -> Result<u64>;

    /// Move the current position
    fn seek(&mut self, position: i64) -> Result<()>;

    /// Read up to `out.len()` bytes at `position` without moving the cursor
    async fn read_at_into(&self, position: i64, out: &mut [u8]) -> Result<usize>;

    /// Read up to `nbytes` bytes at `position` without moving the cursor
    async fn read_at(&self, position: i64, nbytes: usize) -> Result<Bytes>;
}

/// Sequential write access to a file
#[async_trait]
pub trait OutputStream: Send + Sync {
    fn tell(&self) -> Result<u64>;

    async fn write(&mut self, data: &[u8]) -> Result<()>;

    async fn flush(&mut self) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

/// A hierarchical filesystem
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Short name identifying the implementation
    fn type_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    /// True if `other` refers to the same filesystem configuration
    fn equals(&self, other: &dyn FileSystem) -> bool;

    async fn get_file_info(&self, path: &str) -> Result<FileInfo>;

    async fn get_file_info_selector(&self, select: &FileSelector) -> Result<Vec<FileInfo>>;

    async fn create_dir(&self, path: &str, recursive: bool) -> Result<()>;

    async fn delete_dir(&self, path: &str) -> Result<()>;

    async fn delete_dir_contents(&self, path: &str, missing_dir_ok: bool) -> Result<()>;

    async fn delete_root_dir_contents(&self) -> Result<()>;

    async fn delete_file(&self, path: &str) -> Result<()>;

    async fn move_file(&self, src: &str, dest: &str) -> Result<()>;

    async fn copy_file(&self, src: &str, dest: &str) -> Result<()>;

    async fn open_input_stream(&self, path: &str) -> Result<Box<dyn InputStream>>;

    async fn open_input_stream_with_info(&self, info: &FileInfo) -> Result<Box<dyn InputStream>>;

    async fn open_input_file(&self, path: &str) -> Result<Box<dyn RandomAccessFile>>;

    async fn open_input_file_with_info(
        &self,
        info: &FileInfo,
    ) -> Result<Box<dyn RandomAccessFile>>;

    async fn open_output_stream(
        &self,
        path: &str,
        metadata: Option<&Metadata>,
    ) -> Result<Box<dyn OutputStream>>;

    async fn open_append_stream(
        &self,
        path: &str,
        metadata: Option<&Metadata>,
    ) -> Result<Box<dyn OutputStream>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_info_builders() {
        let info = FileInfo::file("container/blob", 42);
        assert_eq!(info.path(), "container/blob");
        assert_eq!(info.file_type(), FileType::File);
        assert_eq!(info.size(), Some(42));

        let info = FileInfo::new("container/blob", FileType::Unknown);
        assert_eq!(info.size(), None);
    }

    #[test]
    fn test_traits_are_object_safe() {
        fn _fs(_: &dyn FileSystem) {}
        fn _file(_: &dyn RandomAccessFile) {}
        fn _output(_: &dyn OutputStream) {}
    }
}
