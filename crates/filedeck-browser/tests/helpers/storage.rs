//! Storage wrapper recording existence checks and mutating calls, used to
//! assert ordering.

use async_trait::async_trait;
use filedeck_core::StorageBackend;
use filedeck_storage::{
    DirectoryOptions, MemoryStorage, ObjectMetadata, Storage, StorageResult, Visibility,
};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct RecordingStorage {
    inner: MemoryStorage,
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingStorage {
    pub fn new(inner: MemoryStorage) -> Self {
        Self {
            inner,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Recorded `op key[ -> key]` lines, oldest first.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    fn record(&self, line: String) {
        self.calls.lock().expect("calls lock poisoned").push(line);
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.record(format!("exists {}", key));
        self.inner.exists(key).await
    }

    async fn delete(&self, key: &str) -> StorageResult<bool> {
        self.record(format!("delete {}", key));
        self.inner.delete(key).await
    }

    async fn delete_directory(&self, key: &str) -> StorageResult<bool> {
        self.record(format!("delete_directory {}", key));
        self.inner.delete_directory(key).await
    }

    async fn files(&self, dir_key: &str) -> StorageResult<Vec<String>> {
        self.inner.files(dir_key).await
    }

    async fn directories(&self, dir_key: &str) -> StorageResult<Vec<String>> {
        self.inner.directories(dir_key).await
    }

    async fn all_files(&self, dir_key: &str) -> StorageResult<Vec<String>> {
        self.inner.all_files(dir_key).await
    }

    async fn move_item(&self, from_key: &str, to_key: &str) -> StorageResult<bool> {
        self.record(format!("move {} -> {}", from_key, to_key));
        self.inner.move_item(from_key, to_key).await
    }

    async fn read(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.inner.read(key).await
    }

    async fn write(
        &self,
        dir_key: &str,
        name: &str,
        data: Vec<u8>,
        visibility: Visibility,
    ) -> StorageResult<String> {
        self.record(format!("write {} {}", dir_key, name));
        self.inner.write(dir_key, name, data, visibility).await
    }

    async fn put(&self, key: &str, data: Vec<u8>, visibility: Visibility) -> StorageResult<()> {
        self.record(format!("put {}", key));
        self.inner.put(key, data, visibility).await
    }

    async fn make_directory(&self, key: &str, options: DirectoryOptions) -> StorageResult<()> {
        self.record(format!("make_directory {}", key));
        self.inner.make_directory(key, options).await
    }

    async fn set_visibility(&self, key: &str, visibility: Visibility) -> StorageResult<()> {
        self.inner.set_visibility(key, visibility).await
    }

    async fn metadata(&self, key: &str) -> StorageResult<ObjectMetadata> {
        self.inner.metadata(key).await
    }

    fn url(&self, key: &str) -> String {
        self.inner.url(key)
    }

    fn root_path(&self) -> String {
        self.inner.root_path()
    }

    fn separator(&self) -> char {
        self.inner.separator()
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}
