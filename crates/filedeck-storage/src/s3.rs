use crate::keys::{join_key, normalize_key};
use crate::traits::{
    DirectoryOptions, ObjectMetadata, Storage, StorageError, StorageResult, Visibility,
};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectMeta, ObjectStore, ObjectStoreExt, PutPayload, Result as ObjectResult};
use std::sync::Arc;

const SEPARATOR: char = '/';

/// Zero-byte object that keeps an otherwise empty "directory" visible.
const DIRECTORY_MARKER: &str = ".keep";

/// S3 storage implementation
///
/// Object stores have no directories: a directory exists when some object
/// lives under its prefix, and [`Storage::make_directory`] writes a marker
/// object so empty directories survive.
#[derive(Clone)]
pub struct S3Storage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        // Build AmazonS3 object store from environment and explicit settings.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self::with_store(Arc::new(store), bucket, region, endpoint_url))
    }

    /// Wrap an already built object store.
    pub fn with_store(
        store: Arc<dyn ObjectStore>,
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> Self {
        S3Storage {
            store,
            bucket,
            region,
            endpoint_url,
        }
    }

    /// Generate public URL for S3 object
    ///
    /// For AWS S3, uses the standard format: https://{bucket}.s3.{region}.amazonaws.com/{key}
    /// For S3-compatible providers, uses path-style: {endpoint}/{bucket}/{key}
    fn generate_url(&self, key: &str) -> String {
        let encoded: Vec<String> = key
            .split(SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        let key = encoded.join("/");

        if let Some(ref endpoint) = self.endpoint_url {
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, self.bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            )
        }
    }

    fn location(key: &str) -> StorageResult<(String, Option<Path>)> {
        let key = normalize_key(key, SEPARATOR)?;
        let location = if key.is_empty() {
            None
        } else {
            Some(Path::from(key.clone()))
        };
        Ok((key, location))
    }

    fn is_marker(meta: &ObjectMeta) -> bool {
        meta.location.filename() == Some(DIRECTORY_MARKER)
    }

    async fn head(&self, location: &Path) -> StorageResult<Option<ObjectMeta>> {
        match self.store.head(location).await {
            Ok(meta) => Ok(Some(meta)),
            Err(ObjectStoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    /// Every object under a prefix, markers included.
    async fn list_recursive(&self, prefix: Option<&Path>) -> StorageResult<Vec<ObjectMeta>> {
        self.store
            .list(prefix)
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))
    }

    async fn has_children(&self, prefix: &Path) -> StorageResult<bool> {
        let mut stream = self.store.list(Some(prefix));
        match stream.next().await {
            Some(Ok(_)) => Ok(true),
            Some(Err(e)) => Err(StorageError::BackendError(e.to_string())),
            None => Ok(false),
        }
    }

    async fn put_bytes(&self, key: &str, location: &Path, data: Vec<u8>) -> StorageResult<()> {
        let size = data.len() as u64;
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self
            .store
            .put(location, PutPayload::from(Bytes::from(data)))
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    async fn copy_then_delete(&self, from: &Path, to: &Path) -> StorageResult<()> {
        let copy_result: ObjectResult<_> = self.store.copy(from, to).await;
        copy_result.map_err(|e| StorageError::BackendError(e.to_string()))?;

        let delete_result: ObjectResult<_> = self.store.delete(from).await;
        delete_result.map_err(|e| StorageError::DeleteFailed(e.to_string()))
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let (_, location) = Self::location(key)?;
        let Some(location) = location else {
            return Ok(true);
        };

        if self.head(&location).await?.is_some() {
            return Ok(true);
        }
        self.has_children(&location).await
    }

    async fn delete(&self, key: &str) -> StorageResult<bool> {
        let (key, location) = Self::location(key)?;
        let Some(location) = location else {
            return Err(StorageError::InvalidKey("Empty key".to_string()));
        };
        let start = std::time::Instant::now();

        if self.head(&location).await?.is_none() {
            return Ok(false);
        }

        let result: ObjectResult<_> = self.store.delete(&location).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 delete failed"
            );
            StorageError::DeleteFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(true)
    }

    async fn delete_directory(&self, key: &str) -> StorageResult<bool> {
        let (key, location) = Self::location(key)?;
        let Some(location) = location else {
            return Err(StorageError::InvalidKey(
                "Refusing to delete the bucket root".to_string(),
            ));
        };

        let objects = self.list_recursive(Some(&location)).await?;
        for meta in &objects {
            let result: ObjectResult<_> = self.store.delete(&meta.location).await;
            result.map_err(|e| StorageError::DeleteFailed(e.to_string()))?;
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            objects = objects.len(),
            "S3 prefix delete successful"
        );

        Ok(!objects.is_empty())
    }

    async fn files(&self, dir_key: &str) -> StorageResult<Vec<String>> {
        let (_, location) = Self::location(dir_key)?;
        let listing = self
            .store
            .list_with_delimiter(location.as_ref())
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        let mut keys: Vec<String> = listing
            .objects
            .iter()
            .filter(|meta| !Self::is_marker(meta))
            .map(|meta| meta.location.to_string())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn directories(&self, dir_key: &str) -> StorageResult<Vec<String>> {
        let (_, location) = Self::location(dir_key)?;
        let listing = self
            .store
            .list_with_delimiter(location.as_ref())
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        let mut keys: Vec<String> = listing
            .common_prefixes
            .iter()
            .map(|prefix| prefix.to_string())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn all_files(&self, dir_key: &str) -> StorageResult<Vec<String>> {
        let (_, location) = Self::location(dir_key)?;
        let mut keys: Vec<String> = self
            .list_recursive(location.as_ref())
            .await?
            .iter()
            .filter(|meta| !Self::is_marker(meta))
            .map(|meta| meta.location.to_string())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn move_item(&self, from_key: &str, to_key: &str) -> StorageResult<bool> {
        let (from_key, from) = Self::location(from_key)?;
        let (to_key, to) = Self::location(to_key)?;
        let (Some(from), Some(to)) = (from, to) else {
            return Err(StorageError::InvalidKey("Cannot move the bucket root".to_string()));
        };
        let start = std::time::Instant::now();

        if self.head(&from).await?.is_some() {
            self.copy_then_delete(&from, &to).await?;
        } else {
            let objects = self.list_recursive(Some(&from)).await?;
            if objects.is_empty() {
                return Err(StorageError::NotFound(from_key));
            }

            let prefix_len = from.as_ref().len();
            for meta in objects {
                let suffix = &meta.location.as_ref()[prefix_len..];
                let target = Path::from(format!("{}{}", to.as_ref(), suffix));
                self.copy_then_delete(&meta.location, &target).await?;
            }
        }

        tracing::info!(
            from_key = %from_key,
            to_key = %to_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 move successful"
        );

        Ok(true)
    }

    async fn read(&self, key: &str) -> StorageResult<Vec<u8>> {
        let (key, location) = Self::location(key)?;
        let Some(location) = location else {
            return Err(StorageError::InvalidKey("Empty key".to_string()));
        };
        let start = std::time::Instant::now();

        let result = match self.store.get(&location).await {
            Ok(result) => result,
            Err(ObjectStoreError::NotFound { .. }) => return Err(StorageError::NotFound(key)),
            Err(e) => return Err(StorageError::DownloadFailed(e.to_string())),
        };

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(bytes.to_vec())
    }

    async fn write(
        &self,
        dir_key: &str,
        name: &str,
        data: Vec<u8>,
        visibility: Visibility,
    ) -> StorageResult<String> {
        let (dir_key, _) = Self::location(dir_key)?;
        let key = join_key(&dir_key, name, SEPARATOR);
        self.put(&key, data, visibility).await?;
        Ok(key)
    }

    async fn put(&self, key: &str, data: Vec<u8>, _visibility: Visibility) -> StorageResult<()> {
        let (key, location) = Self::location(key)?;
        let Some(location) = location else {
            return Err(StorageError::InvalidKey("Empty key".to_string()));
        };
        self.put_bytes(&key, &location, data).await
    }

    async fn make_directory(&self, key: &str, _options: DirectoryOptions) -> StorageResult<()> {
        let (key, location) = Self::location(key)?;
        if location.is_none() {
            return Ok(());
        }

        let marker_key = join_key(&key, DIRECTORY_MARKER, SEPARATOR);
        let marker = Path::from(marker_key.clone());
        self.put_bytes(&marker_key, &marker, Vec::new()).await
    }

    async fn set_visibility(&self, key: &str, visibility: Visibility) -> StorageResult<()> {
        tracing::debug!(
            bucket = %self.bucket,
            key = %key,
            visibility = ?visibility,
            "S3 visibility change skipped"
        );
        Ok(())
    }

    async fn metadata(&self, key: &str) -> StorageResult<ObjectMetadata> {
        let (key, location) = Self::location(key)?;
        let Some(location) = location else {
            return Err(StorageError::InvalidKey("Empty key".to_string()));
        };

        match self.head(&location).await? {
            Some(meta) => Ok(ObjectMetadata {
                size: meta.size,
                last_modified: meta.last_modified,
            }),
            None => Err(StorageError::NotFound(key)),
        }
    }

    fn url(&self, key: &str) -> String {
        self.generate_url(key)
    }

    fn root_path(&self) -> String {
        String::new()
    }

    fn separator(&self) -> char {
        SEPARATOR
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
