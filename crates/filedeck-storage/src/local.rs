use crate::keys::{join_key, normalize_key, public_url};
use crate::traits::{
    DirectoryOptions, ObjectMetadata, Storage, StorageError, StorageResult, Visibility,
};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// Directories are real directories under `base_path`; keys use the platform
/// separator.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/filedeck")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:3000/storage")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        let base_path = fs::canonicalize(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Convert storage key to filesystem path with security validation
    fn key_to_path(&self, key: &str) -> StorageResult<(String, PathBuf)> {
        let key = normalize_key(key, MAIN_SEPARATOR)?;
        let path = if key.is_empty() {
            self.base_path.clone()
        } else {
            self.base_path.join(&key)
        };
        Ok((key, path))
    }

    fn path_to_key(&self, path: &Path) -> Option<String> {
        path.strip_prefix(&self.base_path)
            .ok()
            .map(|relative| relative.to_string_lossy().into_owned())
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn write_file(&self, key: &str, path: &Path, data: Vec<u8>) -> StorageResult<()> {
        let size = data.len();
        self.ensure_parent_dir(path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(())
    }

    /// Direct children of a directory, split by kind.
    async fn list_children(&self, dir_key: &str, want_dirs: bool) -> StorageResult<Vec<String>> {
        let (dir_key, path) = self.key_to_path(dir_key)?;

        let mut entries = match fs::read_dir(&path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_dir() == want_dirs {
                let name = entry.file_name().to_string_lossy().into_owned();
                keys.push(join_key(&dir_key, &name, MAIN_SEPARATOR));
            }
        }
        keys.sort();
        Ok(keys)
    }

    #[cfg(unix)]
    async fn apply_visibility(path: &Path, visibility: Visibility) -> StorageResult<()> {
        use std::os::unix::fs::PermissionsExt;

        let is_dir = fs::metadata(path).await?.is_dir();
        let mode = match (is_dir, visibility) {
            (true, Visibility::Public) => 0o755,
            (true, Visibility::Private) => 0o700,
            (false, Visibility::Public) => 0o644,
            (false, Visibility::Private) => 0o600,
        };
        fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await?;
        Ok(())
    }

    #[cfg(not(unix))]
    async fn apply_visibility(_path: &Path, _visibility: Visibility) -> StorageResult<()> {
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let (_, path) = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn delete(&self, key: &str) -> StorageResult<bool> {
        let (key, path) = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    path.display(),
                    e
                )))
            }
        }

        tracing::info!(
            path = %path.display(),
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(true)
    }

    async fn delete_directory(&self, key: &str) -> StorageResult<bool> {
        let (key, path) = self.key_to_path(key)?;
        if key.is_empty() {
            return Err(StorageError::InvalidKey(
                "Refusing to delete the storage root".to_string(),
            ));
        }

        match fs::remove_dir_all(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(StorageError::DeleteFailed(format!(
                    "Failed to delete directory {}: {}",
                    path.display(),
                    e
                )))
            }
        }

        tracing::info!(
            path = %path.display(),
            key = %key,
            "Local storage directory delete successful"
        );

        Ok(true)
    }

    async fn files(&self, dir_key: &str) -> StorageResult<Vec<String>> {
        self.list_children(dir_key, false).await
    }

    async fn directories(&self, dir_key: &str) -> StorageResult<Vec<String>> {
        self.list_children(dir_key, true).await
    }

    async fn all_files(&self, dir_key: &str) -> StorageResult<Vec<String>> {
        let (_, root) = self.key_to_path(dir_key)?;
        let walker = self.clone();

        let paths = tokio::task::spawn_blocking(move || {
            walkdir::WalkDir::new(&root)
                .min_depth(1)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .collect::<Vec<PathBuf>>()
        })
        .await
        .map_err(|e| StorageError::BackendError(format!("Directory walk failed: {}", e)))?;

        let mut keys: Vec<String> = paths
            .iter()
            .filter_map(|path| walker.path_to_key(path))
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn move_item(&self, from_key: &str, to_key: &str) -> StorageResult<bool> {
        let (from_key, from) = self.key_to_path(from_key)?;
        let (to_key, to) = self.key_to_path(to_key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&from).await.unwrap_or(false) {
            return Err(StorageError::NotFound(from_key));
        }

        self.ensure_parent_dir(&to).await?;
        fs::rename(&from, &to).await?;

        tracing::info!(
            from_key = %from_key,
            to_key = %to_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage move successful"
        );

        Ok(true)
    }

    async fn read(&self, key: &str) -> StorageResult<Vec<u8>> {
        let (key, path) = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(key));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        tracing::debug!(
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage read successful"
        );

        Ok(data)
    }

    async fn write(
        &self,
        dir_key: &str,
        name: &str,
        data: Vec<u8>,
        visibility: Visibility,
    ) -> StorageResult<String> {
        let (dir_key, _) = self.key_to_path(dir_key)?;
        let key = join_key(&dir_key, name, MAIN_SEPARATOR);
        self.put(&key, data, visibility).await?;
        Ok(key)
    }

    async fn put(&self, key: &str, data: Vec<u8>, visibility: Visibility) -> StorageResult<()> {
        let (key, path) = self.key_to_path(key)?;
        self.write_file(&key, &path, data).await?;
        Self::apply_visibility(&path, visibility).await
    }

    async fn make_directory(&self, key: &str, options: DirectoryOptions) -> StorageResult<()> {
        let (key, path) = self.key_to_path(key)?;

        let mut builder = fs::DirBuilder::new();
        builder.recursive(options.recursive);
        #[cfg(unix)]
        builder.mode(options.mode);

        match builder.create(&path).await {
            Ok(()) => {
                tracing::debug!(key = %key, mode = options.mode, "Local directory created");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists && options.force => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_visibility(&self, key: &str, visibility: Visibility) -> StorageResult<()> {
        let (_, path) = self.key_to_path(key)?;
        Self::apply_visibility(&path, visibility).await
    }

    async fn metadata(&self, key: &str) -> StorageResult<ObjectMetadata> {
        let (key, path) = self.key_to_path(key)?;
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StorageError::NotFound(key)),
            Err(e) => return Err(e.into()),
        };

        let last_modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(ObjectMetadata {
            size: metadata.len(),
            last_modified,
        })
    }

    fn url(&self, key: &str) -> String {
        public_url(&self.base_url, key, MAIN_SEPARATOR)
    }

    fn root_path(&self) -> String {
        format!("{}{}", self.base_path.display(), MAIN_SEPARATOR)
    }

    fn separator(&self) -> char {
        MAIN_SEPARATOR
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn storage(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir, "http://localhost:3000/storage".to_string())
            .await
            .unwrap()
    }

    fn key(parts: &[&str]) -> String {
        parts.join(&MAIN_SEPARATOR.to_string())
    }

    #[tokio::test]
    async fn test_local_storage_write_read() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let written = storage
            .write(&key(&["files", "alice"]), "test.txt", b"test data".to_vec(), Visibility::Public)
            .await
            .unwrap();

        assert_eq!(written, key(&["files", "alice", "test.txt"]));
        assert_eq!(storage.read(&written).await.unwrap(), b"test data".to_vec());
        assert_eq!(storage.mime_type(&written), "text/plain");
        assert!(storage
            .url(&written)
            .ends_with("/storage/files/alice/test.txt"));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.read(&key(&["..", "..", "etc", "passwd"])).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete(&key(&["..", "etc", "passwd"])).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_storage_delete_nonexistent() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        assert!(!storage.delete("nonexistent.txt").await.unwrap());
        assert!(!storage.delete_directory("nothing").await.unwrap());
    }

    #[tokio::test]
    async fn test_listings() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage
            .put(&key(&["files", "a.txt"]), b"a".to_vec(), Visibility::Public)
            .await
            .unwrap();
        storage
            .put(&key(&["files", "sub", "b.txt"]), b"b".to_vec(), Visibility::Public)
            .await
            .unwrap();

        assert_eq!(storage.files("files").await.unwrap(), vec![key(&["files", "a.txt"])]);
        assert_eq!(
            storage.directories("files").await.unwrap(),
            vec![key(&["files", "sub"])]
        );
        assert_eq!(
            storage.all_files("files").await.unwrap(),
            vec![key(&["files", "a.txt"]), key(&["files", "sub", "b.txt"])]
        );
        assert!(storage.files("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_make_directory_is_idempotent() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let nested = key(&["photos", "alice", "thumbs"]);

        storage
            .make_directory(&nested, DirectoryOptions::default())
            .await
            .unwrap();
        storage
            .make_directory(&nested, DirectoryOptions::default())
            .await
            .unwrap();
        assert!(storage.exists(&nested).await.unwrap());

        let strict = DirectoryOptions {
            force: false,
            ..DirectoryOptions::default()
        };
        // create_dir_all succeeds on existing directories even without force
        assert!(storage.make_directory(&nested, strict).await.is_ok());

        let non_recursive = DirectoryOptions {
            recursive: false,
            force: false,
            ..DirectoryOptions::default()
        };
        assert!(storage.make_directory(&nested, non_recursive).await.is_err());
    }

    #[tokio::test]
    async fn test_move_directory() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage
            .put(&key(&["old", "a.txt"]), b"a".to_vec(), Visibility::Public)
            .await
            .unwrap();
        assert!(storage.move_item("old", "new").await.unwrap());
        assert!(!storage.exists("old").await.unwrap());
        assert!(storage.exists(&key(&["new", "a.txt"])).await.unwrap());

        let missing = storage.move_item("old", "other").await;
        assert!(matches!(missing, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_root_path_and_metadata() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        assert!(storage.root_path().ends_with(MAIN_SEPARATOR));
        storage
            .put("size.bin", vec![0u8; 42], Visibility::Private)
            .await
            .unwrap();
        assert_eq!(storage.metadata("size.bin").await.unwrap().size, 42);
        assert!(matches!(
            storage.metadata("none.bin").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
