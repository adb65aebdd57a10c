//! Filesystem facade over a blob service
//!
//! [`BlobFileSystem`] implements the read side of [`FileSystem`]: it parses
//! path strings, checks that they name a blob, and hands out
//! [`ObjectInputFile`] readers. Every mutating member answers
//! [`Error::NotImplemented`].

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::fs::{
    FileInfo, FileSelector, FileSystem, FileType, InputStream, OutputStream, RandomAccessFile,
};
use crate::options::StorageOptions;
use crate::path::{BlobPath, assert_no_trailing_slash};
use crate::reader::ObjectInputFile;
use crate::traits::{BlobService, Metadata};

/// Type tag reported by [`BlobFileSystem::type_name`]
pub const TYPE_NAME: &str = "abfs";

const NOT_IMPLEMENTED: &str = "The Azure FileSystem is not fully implemented";

fn not_implemented<T>() -> Result<T> {
    Err(Error::NotImplemented(NOT_IMPLEMENTED.to_string()))
}

/// A storage account seen as a filesystem
///
/// The first path segment is the container, the rest is the blob name.
pub struct BlobFileSystem {
    options: StorageOptions,
    service: Arc<dyn BlobService>,
}

impl BlobFileSystem {
    /// Wrap an already-constructed service
    pub fn new(options: StorageOptions, service: Arc<dyn BlobService>) -> Self {
        Self { options, service }
    }

    /// Build the service from `options` and wrap it
    ///
    /// Construction failures of the service are returned unchanged.
    pub fn make<F>(options: StorageOptions, connect: F) -> Result<Self>
    where
        F: FnOnce(&StorageOptions) -> Result<Arc<dyn BlobService>>,
    {
        let service = connect(&options)?;
        tracing::debug!(endpoint = %options.account_blob_url, "Created blob filesystem");
        Ok(Self::new(options, service))
    }

    pub fn options(&self) -> &StorageOptions {
        &self.options
    }

    /// Open a reader for `path`, fetching the blob's properties
    pub async fn open_reader(&self, path: &str) -> Result<ObjectInputFile> {
        assert_no_trailing_slash(path)?;
        let path = BlobPath::parse(path)?;
        self.open_validated(path, None).await
    }

    /// Open a reader using what `info` already says about the path
    ///
    /// A hint that says the path is missing, or is not a file, fails without
    /// any network call. A known size skips the property fetch.
    pub async fn open_reader_with_info(&self, info: &FileInfo) -> Result<ObjectInputFile> {
        assert_no_trailing_slash(info.path())?;
        match info.file_type() {
            FileType::NotFound => return Err(Error::path_not_found(info.path())),
            FileType::File | FileType::Unknown => {}
            FileType::Directory => return Err(Error::not_a_file(info.path())),
        }
        let path = BlobPath::parse(info.path())?;
        self.open_validated(path, info.size()).await
    }

    async fn open_validated(&self, path: BlobPath, size: Option<u64>) -> Result<ObjectInputFile> {
        path.validate_file_path()?;
        let client = self
            .service
            .blob_client(path.container(), path.path_to_file())?;
        tracing::debug!(path = %path, size_hint = ?size, "Opening blob for reading");
        ObjectInputFile::open(client, path, size).await
    }
}

#[async_trait]
impl FileSystem for BlobFileSystem {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equals(&self, other: &dyn FileSystem) -> bool {
        if std::ptr::addr_eq(self as *const Self, other as *const dyn FileSystem) {
            return true;
        }
        if other.type_name() != self.type_name() {
            return false;
        }
        other
            .as_any()
            .downcast_ref::<BlobFileSystem>()
            .is_some_and(|other| self.options == other.options)
    }

    async fn get_file_info(&self, _path: &str) -> Result<FileInfo> {
        not_implemented()
    }

    async fn get_file_info_selector(&self, _select: &FileSelector) -> Result<Vec<FileInfo>> {
        not_implemented()
    }

    async fn create_dir(&self, _path: &str, _recursive: bool) -> Result<()> {
        not_implemented()
    }

    async fn delete_dir(&self, _path: &str) -> Result<()> {
        not_implemented()
    }

    async fn delete_dir_contents(&self, _path: &str, _missing_dir_ok: bool) -> Result<()> {
        not_implemented()
    }

    async fn delete_root_dir_contents(&self) -> Result<()> {
        not_implemented()
    }

    async fn delete_file(&self, _path: &str) -> Result<()> {
        not_implemented()
    }

    async fn move_file(&self, _src: &str, _dest: &str) -> Result<()> {
        not_implemented()
    }

    async fn copy_file(&self, _src: &str, _dest: &str) -> Result<()> {
        not_implemented()
    }

    async fn open_input_stream(&self, path: &str) -> Result<Box<dyn InputStream>> {
        Ok(Box::new(self.open_reader(path).await?))
    }

    async fn open_input_stream_with_info(&self, info: &FileInfo) -> Result<Box<dyn InputStream>> {
        Ok(Box::new(self.open_reader_with_info(info).await?))
    }

    async fn open_input_file(&self, path: &str) -> Result<Box<dyn RandomAccessFile>> {
        Ok(Box::new(self.open_reader(path).await?))
    }

    async fn open_input_file_with_info(
        &self,
        info: &FileInfo,
    ) -> Result<Box<dyn RandomAccessFile>> {
        Ok(Box::new(self.open_reader_with_info(info).await?))
    }

    async fn open_output_stream(
        &self,
        _path: &str,
        _metadata: Option<&Metadata>,
    ) -> Result<Box<dyn OutputStream>> {
        not_implemented()
    }

    async fn open_append_stream(
        &self,
        _path: &str,
        _metadata: Option<&Metadata>,
    ) -> Result<Box<dyn OutputStream>> {
        not_implemented()
    }
}
