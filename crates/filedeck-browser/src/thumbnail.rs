//! Shadow thumbnail folder
//!
//! A thumbnail sits at `<working dir>/<thumb folder>/<source name>` and has no
//! identity of its own: every path is derived from the source identity.

use std::sync::Arc;

use filedeck_core::constants::THUMBNAIL_EXCLUDED_MIME_TYPES;
use filedeck_core::{AppError, FileManagerConfig, ItemIdentity};
use filedeck_processing::ImageCodec;
use filedeck_storage::Visibility;

use crate::directory::ensure_directory;
use crate::error::{codec_error, StorageResultExt};
use crate::path::PathResolver;

#[derive(Clone)]
pub struct ThumbnailCoordinator {
    config: Arc<FileManagerConfig>,
    codec: Arc<dyn ImageCodec>,
    resolver: PathResolver,
}

impl ThumbnailCoordinator {
    pub fn new(
        config: Arc<FileManagerConfig>,
        codec: Arc<dyn ImageCodec>,
        resolver: PathResolver,
    ) -> Self {
        Self {
            config,
            codec,
            resolver,
        }
    }

    /// Thumbnails are enabled, the type is an image and not an excluded one.
    pub fn should_create(&self, mime_type: &str) -> bool {
        self.config.should_create_thumbnails
            && mime_type.starts_with("image")
            && !THUMBNAIL_EXCLUDED_MIME_TYPES.contains(&mime_type)
    }

    pub async fn has_thumbnail(&self, source: &ItemIdentity) -> Result<bool, AppError> {
        let key = self.resolver.backend_key(&source.as_thumbnail());
        self.resolver
            .storage()
            .exists(&key)
            .await
            .context("exists", &key)
    }

    /// Build (or rebuild) the thumbnail of `source`. Returns `false` when the
    /// source is not eligible.
    pub async fn generate(&self, source: &ItemIdentity) -> Result<bool, AppError> {
        let storage = self.resolver.storage();
        let source_key = self.resolver.backend_key(&source.as_source());
        let mime_type = storage.mime_type(&source_key);

        if !self.should_create(&mime_type) {
            return Ok(false);
        }

        let start = std::time::Instant::now();

        let thumb_dir_key = self
            .resolver
            .backend_key(&source.as_thumbnail().without_name());
        ensure_directory(storage.as_ref(), &thumb_dir_key).await?;

        let (width, height) = self
            .config
            .thumb_dimensions(self.resolver.context().category());

        let data = storage.read(&source_key).await.context("read", &source_key)?;
        let thumbnail = self
            .codec
            .cover(data, &mime_type, width, height)
            .await
            .map_err(codec_error)?;

        let thumb_key = self.resolver.backend_key(&source.as_thumbnail());
        storage
            .put(&thumb_key, thumbnail.to_vec(), Visibility::Public)
            .await
            .context("put", &thumb_key)?;

        tracing::debug!(
            key = %thumb_key,
            width,
            height,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Thumbnail generated"
        );

        Ok(true)
    }

    /// Move the thumbnail of `from` next to `to`, if there is one. Call it
    /// before moving the source.
    pub async fn relocate(&self, from: &ItemIdentity, to: &ItemIdentity) -> Result<bool, AppError> {
        if !self.has_thumbnail(from).await? {
            return Ok(false);
        }

        let from_key = self.resolver.backend_key(&from.as_thumbnail());
        let to_key = self.resolver.backend_key(&to.as_thumbnail());
        self.resolver
            .storage()
            .move_item(&from_key, &to_key)
            .await
            .context("move", &from_key)
    }

    /// Delete the thumbnail of `source`. Missing thumbnails are fine.
    pub async fn delete(&self, source: &ItemIdentity) -> Result<bool, AppError> {
        let key = self.resolver.backend_key(&source.as_thumbnail());
        self.resolver
            .storage()
            .delete(&key)
            .await
            .context("delete", &key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BrowserContext;
    use filedeck_core::StorageBackend;
    use filedeck_processing::ImageTransformer;
    use filedeck_storage::{MemoryStorage, Storage};
    use image::{DynamicImage, Rgb, RgbImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([0, 90, 200])));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn coordinator(config: FileManagerConfig, storage: MemoryStorage) -> ThumbnailCoordinator {
        let config = Arc::new(config);
        let context = BrowserContext::new(&config, Some("image"), "alice");
        let resolver = PathResolver::new(config.clone(), Arc::new(storage), context);
        ThumbnailCoordinator::new(config, Arc::new(ImageTransformer::new()), resolver)
    }

    fn config() -> FileManagerConfig {
        FileManagerConfig {
            storage_backend: StorageBackend::Memory,
            ..FileManagerConfig::default()
        }
    }

    #[test]
    fn test_should_create() {
        let coordinator = coordinator(config(), MemoryStorage::new());
        assert!(coordinator.should_create("image/png"));
        assert!(coordinator.should_create("image/jpeg"));
        assert!(!coordinator.should_create("image/gif"));
        assert!(!coordinator.should_create("image/svg+xml"));
        assert!(!coordinator.should_create("application/pdf"));

        let disabled = coordinator_disabled();
        assert!(!disabled.should_create("image/png"));
    }

    fn coordinator_disabled() -> ThumbnailCoordinator {
        coordinator(
            FileManagerConfig {
                should_create_thumbnails: false,
                ..config()
            },
            MemoryStorage::new(),
        )
    }

    #[tokio::test]
    async fn test_generate_uses_category_dimensions() {
        let storage = MemoryStorage::new();
        storage
            .put("photos/alice/a.png", png(300, 150), Visibility::Public)
            .await
            .unwrap();
        let coordinator = coordinator(config(), storage.clone());
        let source = ItemIdentity::new().in_directory("/alice").with_name("a.png");

        assert!(coordinator.generate(&source).await.unwrap());

        let thumb = storage.read("photos/alice/thumbs/a.png").await.unwrap();
        let decoded = image::load_from_memory(&thumb).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (80, 80));
        assert!(coordinator.has_thumbnail(&source).await.unwrap());
    }

    #[tokio::test]
    async fn test_generate_skips_excluded_types() {
        let storage = MemoryStorage::new();
        storage
            .put("photos/alice/anim.gif", b"GIF89a".to_vec(), Visibility::Public)
            .await
            .unwrap();
        let coordinator = coordinator(config(), storage.clone());
        let source = ItemIdentity::new().in_directory("/alice").with_name("anim.gif");

        assert!(!coordinator.generate(&source).await.unwrap());
        assert!(!storage.exists("photos/alice/thumbs").await.unwrap());
    }

    #[tokio::test]
    async fn test_relocate_and_delete() {
        let storage = MemoryStorage::new();
        storage
            .put("photos/alice/thumbs/a.png", b"t".to_vec(), Visibility::Public)
            .await
            .unwrap();
        let coordinator = coordinator(config(), storage.clone());
        let alice = ItemIdentity::new().in_directory("/alice");

        assert!(coordinator
            .relocate(&alice.with_name("a.png"), &alice.with_name("b.png"))
            .await
            .unwrap());
        assert!(!storage.exists("photos/alice/thumbs/a.png").await.unwrap());
        assert!(storage.exists("photos/alice/thumbs/b.png").await.unwrap());

        assert!(!coordinator
            .relocate(&alice.with_name("a.png"), &alice.with_name("c.png"))
            .await
            .unwrap());

        assert!(coordinator.delete(&alice.with_name("b.png")).await.unwrap());
        assert!(!coordinator.delete(&alice.with_name("b.png")).await.unwrap());
    }
}
