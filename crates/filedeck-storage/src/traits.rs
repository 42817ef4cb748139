//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// Options for [`Storage::make_directory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryOptions {
    /// Unix permission bits requested for new directories.
    pub mode: u32,
    /// Create missing parents.
    pub recursive: bool,
    /// Treat "already exists" as success.
    pub force: bool,
}

impl Default for DirectoryOptions {
    fn default() -> Self {
        Self {
            mode: filedeck_core::constants::DIRECTORY_MODE,
            recursive: true,
            force: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Storage abstraction trait
///
/// All storage backends (local filesystem, S3, memory) implement this trait so
/// the browser can work against any of them without knowing whether
/// directories are real or simulated.
///
/// Listing methods return keys relative to the backend root, in the native
/// separator, without a trailing separator.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Whether a file or directory exists at `key`.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Delete a file. Returns `false` when nothing was there.
    async fn delete(&self, key: &str) -> StorageResult<bool>;

    /// Delete a directory and everything below it. Returns `false` when nothing was there.
    async fn delete_directory(&self, key: &str) -> StorageResult<bool>;

    /// Files directly inside `dir_key`.
    async fn files(&self, dir_key: &str) -> StorageResult<Vec<String>>;

    /// Directories directly inside `dir_key`.
    async fn directories(&self, dir_key: &str) -> StorageResult<Vec<String>>;

    /// Every file below `dir_key`, at any depth.
    async fn all_files(&self, dir_key: &str) -> StorageResult<Vec<String>>;

    /// Move a file or a whole directory.
    async fn move_item(&self, from_key: &str, to_key: &str) -> StorageResult<bool>;

    async fn read(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Store `data` as `name` inside `dir_key`. Returns the new key.
    async fn write(
        &self,
        dir_key: &str,
        name: &str,
        data: Vec<u8>,
        visibility: Visibility,
    ) -> StorageResult<String>;

    /// Store `data` at exactly `key`, replacing any previous content.
    async fn put(&self, key: &str, data: Vec<u8>, visibility: Visibility) -> StorageResult<()>;

    /// Create a directory. With `force`, an existing directory is not an error.
    async fn make_directory(&self, key: &str, options: DirectoryOptions) -> StorageResult<()>;

    /// Best-effort ACL/permission change. Backends without ACLs do nothing.
    async fn set_visibility(&self, key: &str, visibility: Visibility) -> StorageResult<()>;

    async fn metadata(&self, key: &str) -> StorageResult<ObjectMetadata>;

    /// MIME type inferred from the key's extension.
    fn mime_type(&self, key: &str) -> String {
        mime_guess::from_path(key)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }

    /// Public URL for `key`.
    fn url(&self, key: &str) -> String;

    /// Prefix that turns a key into an absolute path.
    fn root_path(&self) -> String;

    /// Native key separator.
    fn separator(&self) -> char;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
