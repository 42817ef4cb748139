//! File browser operations
//!
//! Every operation resolves identities through [`PathResolver`], asks
//! [`DirectoryClassifier`] whether an item is a folder and mirrors the
//! change on the shadow thumbnail folder. Preconditions are checked before
//! the destructive or creative backend call.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use filedeck_core::constants::{DS, RESIZE_PREVIEW_MAX_HEIGHT, RESIZE_PREVIEW_MAX_WIDTH};
use filedeck_core::{
    human_filesize, utf8_pathinfo, AppError, BrowserEvent, BrowserEventListener, DisplayMode,
    FileManagerConfig, FolderNode, FolderType, InvalidNameReason, ItemIdentity, ItemInfo,
    ItemKind, ItemListing, NoOpEventListener, Paginator, PathPart, ResizePreview, SortKey,
    UploadCandidate,
};
use filedeck_processing::{CropRect, ImageCodec};
use filedeck_storage::{Storage, Visibility};

use crate::context::BrowserContext;
use crate::directory::{ensure_directory, DirectoryClassifier};
use crate::error::{codec_error, StorageResultExt};
use crate::naming::NameAllocator;
use crate::path::PathResolver;
use crate::thumbnail::ThumbnailCoordinator;
use crate::validator::UploadValidator;

const FOLDER_ICON: &str = "fa-folder-o";
const IMAGE_ICON: &str = "fa-image";

/// User-facing operations over one request context.
#[derive(Clone)]
pub struct FileBrowser {
    config: Arc<FileManagerConfig>,
    storage: Arc<dyn Storage>,
    codec: Arc<dyn ImageCodec>,
    resolver: PathResolver,
    classifier: DirectoryClassifier,
    names: NameAllocator,
    validator: UploadValidator,
    thumbnails: ThumbnailCoordinator,
    listener: Arc<dyn BrowserEventListener>,
}

impl FileBrowser {
    pub fn new(
        config: Arc<FileManagerConfig>,
        storage: Arc<dyn Storage>,
        codec: Arc<dyn ImageCodec>,
        context: BrowserContext,
    ) -> Self {
        let resolver = PathResolver::new(config.clone(), storage.clone(), context);
        Self {
            classifier: DirectoryClassifier::new(resolver.clone()),
            names: NameAllocator::new(config.clone(), resolver.clone()),
            validator: UploadValidator::new(config.clone(), resolver.clone()),
            thumbnails: ThumbnailCoordinator::new(config.clone(), codec.clone(), resolver.clone()),
            listener: Arc::new(NoOpEventListener),
            config,
            storage,
            codec,
            resolver,
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn BrowserEventListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn classifier(&self) -> &DirectoryClassifier {
        &self.classifier
    }

    pub fn thumbnails(&self) -> &ThumbnailCoordinator {
        &self.thumbnails
    }

    /// Current working directory (logical path).
    pub fn working_dir(&self) -> String {
        self.resolver.working_dir_path(&ItemIdentity::new())
    }

    fn current(&self, name: &str) -> ItemIdentity {
        ItemIdentity::new().with_name(name)
    }

    fn require_name(name: &str, kind: ItemKind) -> Result<(), AppError> {
        if name.is_empty() {
            return Err(AppError::InvalidName {
                kind,
                name: String::new(),
                reason: InvalidNameReason::Empty,
            });
        }
        Ok(())
    }

    async fn emit(&self, event: BrowserEvent) {
        if let Err(e) = self.listener.on_event(&event).await {
            tracing::warn!(event = event.name(), error = %e, "Event listener failed");
        }
    }

    async fn exists(&self, identity: &ItemIdentity) -> Result<bool, AppError> {
        let key = self.resolver.backend_key(identity);
        self.storage.exists(&key).await.context("exists", &key)
    }

    fn allowed_folder_types(&self) -> Vec<FolderType> {
        let category = self.resolver.context().category();
        [FolderType::User, FolderType::Share]
            .into_iter()
            .filter(|ft| self.config.allow_folder_type(category, *ft))
            .collect()
    }

    /// Create the user and shared root folders when they are missing.
    pub async fn ensure_default_folders(&self) -> Result<(), AppError> {
        for folder_type in self.allowed_folder_types() {
            let root = ItemIdentity::new().in_directory(self.resolver.root_folder(folder_type));
            if !self.exists(&root).await? {
                let key = self.resolver.backend_key(&root);
                ensure_directory(self.storage.as_ref(), &key).await?;
                tracing::info!(key = %key, folder_type = folder_type.as_str(), "Root folder created");
            }
        }
        Ok(())
    }

    /// Allowed root folders with their direct sub-folders.
    pub async fn root_folders(&self) -> Result<Vec<FolderNode>, AppError> {
        let folder_types = self.allowed_folder_types();
        let count = folder_types.len();
        let mut nodes = Vec::with_capacity(count);

        for (index, folder_type) in folder_types.into_iter().enumerate() {
            let root = self.resolver.root_folder(folder_type);
            let children = self.folders_in(&root, SortKey::Name).await?;
            let child_count = children.len();
            let children = children
                .into_iter()
                .enumerate()
                .map(|(i, child)| FolderNode {
                    name: child.name,
                    url: child.url,
                    children: Vec::new(),
                    has_next: i + 1 < child_count,
                })
                .collect();

            nodes.push(FolderNode {
                name: folder_type.as_str().to_string(),
                url: root,
                children,
                has_next: index + 1 < count,
            });
        }

        Ok(nodes)
    }

    /// Sub-folders of the working directory, thumbnail folder excluded.
    pub async fn folders(&self, sort: SortKey) -> Result<Vec<ItemInfo>, AppError> {
        self.folders_in(&self.working_dir(), sort).await
    }

    async fn folders_in(&self, working_dir: &str, sort: SortKey) -> Result<Vec<ItemInfo>, AppError> {
        let dir = ItemIdentity::new().in_directory(working_dir);
        let key = self.resolver.backend_key(&dir);
        let directories = self
            .storage
            .directories(&key)
            .await
            .context("list directories", &key)?;

        let base = self.resolver.working_dir_path(&dir);
        let mut items: Vec<ItemInfo> = directories
            .iter()
            .map(|key| last_segment(&self.resolver.translate_to_logical(key)).to_string())
            .filter(|name| name != &self.config.thumb_folder_name)
            .map(|name| ItemInfo {
                url: format!("{}{}{}", base.trim_end_matches(DS), DS, name),
                name,
                time: None,
                size: None,
                icon: FOLDER_ICON.to_string(),
                is_file: false,
                is_image: false,
                mime_type: None,
                thumb_url: None,
                modified_unix: 0,
            })
            .collect();

        sort_items(&mut items, sort);
        Ok(items)
    }

    /// Files of the working directory.
    pub async fn files(&self, sort: SortKey) -> Result<Vec<ItemInfo>, AppError> {
        let dir = ItemIdentity::new();
        let key = self.resolver.backend_key(&dir);
        let keys = self.storage.files(&key).await.context("list files", &key)?;

        let mut items = Vec::with_capacity(keys.len());
        for file_key in keys {
            let name = last_segment(&self.resolver.translate_to_logical(&file_key)).to_string();
            items.push(self.file_info(&dir.with_name(name)).await?);
        }

        sort_items(&mut items, sort);
        Ok(items)
    }

    async fn file_info(&self, identity: &ItemIdentity) -> Result<ItemInfo, AppError> {
        let key = self.resolver.backend_key(identity);
        let metadata = self.storage.metadata(&key).await.context("metadata", &key)?;
        let mime_type = self.storage.mime_type(&key);
        let is_image = mime_type.starts_with("image");
        let url = self.storage.url(&key);

        let thumb_url = if !is_image {
            None
        } else if self.thumbnails.has_thumbnail(identity).await? {
            Some(self.resolver.url(&identity.as_thumbnail()))
        } else {
            Some(url.clone())
        };

        let icon = if is_image {
            IMAGE_ICON.to_string()
        } else {
            utf8_pathinfo(identity.name(), PathPart::Extension)
        };

        Ok(ItemInfo {
            name: identity.name().to_string(),
            url,
            time: Some(
                metadata
                    .last_modified
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            size: Some(human_filesize(metadata.size)),
            icon,
            is_file: true,
            is_image,
            mime_type: Some(mime_type),
            thumb_url,
            modified_unix: metadata.last_modified.timestamp(),
        })
    }

    /// Folders then files, one page at a time. Pages start at 1.
    pub async fn list_items(&self, sort: SortKey, page: usize) -> Result<ItemListing, AppError> {
        let mut all = self.folders(sort).await?;
        all.extend(self.files(sort).await?);

        let per_page = self.config.items_per_page.max(1);
        let current_page = page.max(1);
        let total = all.len();
        let items = all
            .into_iter()
            .skip((current_page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();

        Ok(ItemListing {
            items,
            paginator: Paginator {
                current_page,
                total,
                per_page,
            },
            display: self.display_mode(),
            working_dir: self.working_dir(),
        })
    }

    fn display_mode(&self) -> DisplayMode {
        self.resolver.context().display_override().unwrap_or_else(|| {
            self.config
                .category(self.resolver.context().category())
                .map(|c| c.startup_view)
                .unwrap_or_default()
        })
    }

    /// Validate and store an upload in the working directory. Returns the
    /// final name.
    pub async fn upload(&self, candidate: &UploadCandidate, data: Vec<u8>) -> Result<String, AppError> {
        let start = std::time::Instant::now();
        let dir = ItemIdentity::new();

        self.validator.validate_transfer(candidate).await?;
        let name = self
            .names
            .new_name(&dir, &candidate.original_name, &candidate.extension)
            .await?;
        let target = dir.with_name(name.as_str());

        self.validator.validate(candidate, &target).await?;

        let path = self.resolver.absolute_path(&target);
        self.emit(BrowserEvent::FileUploading { path: path.clone() }).await;

        let dir_key = self.resolver.backend_key(&dir);
        self.storage
            .write(&dir_key, &name, data, Visibility::Public)
            .await
            .map_err(|e| AppError::UploadFailed(e.to_string()))?;

        self.thumbnails
            .generate(&target)
            .await
            .map_err(|e| AppError::UploadFailed(e.to_string()))?;

        if candidate.is_image() {
            self.emit(BrowserEvent::ImageUploaded { path: path.clone() }).await;
        }
        self.emit(BrowserEvent::FileUploaded { path }).await;

        tracing::info!(
            name = %name,
            size_bytes = candidate.size_bytes,
            mime_type = %candidate.mime_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File uploaded"
        );

        Ok(name)
    }

    pub async fn create_folder(&self, name: &str) -> Result<(), AppError> {
        Self::require_name(name, ItemKind::Folder)?;

        let folder = self.current(name);
        if self.exists(&folder).await? {
            return Err(AppError::AlreadyExists(name.to_string()));
        }

        self.names.check_folder_name(name)?;

        let path = self.resolver.absolute_path(&folder);
        self.emit(BrowserEvent::FolderCreating { path: path.clone() }).await;

        let key = self.resolver.backend_key(&folder);
        ensure_directory(self.storage.as_ref(), &key).await?;

        tracing::info!(key = %key, "Folder created");
        self.emit(BrowserEvent::FolderCreated { path }).await;
        Ok(())
    }

    /// Delete files and empty folders. Failures are collected per item and
    /// do not stop the remaining deletions.
    pub async fn delete(&self, names: &[String]) -> Vec<AppError> {
        let mut errors = Vec::new();
        for name in names {
            if let Err(e) = self.delete_one(name).await {
                tracing::debug!(name = %name, error = %e, "Delete failed");
                errors.push(e);
            }
        }
        errors
    }

    async fn delete_one(&self, name: &str) -> Result<(), AppError> {
        Self::require_name(name, ItemKind::File)?;

        let item = self.current(name);
        if !self.exists(&item).await? {
            return Err(AppError::NotFound(name.to_string()));
        }

        let key = self.resolver.backend_key(&item);
        let path = self.resolver.absolute_path(&item);

        if self.classifier.is_directory(&item).await? {
            let contents = self
                .storage
                .all_files(&key)
                .await
                .context("list all files", &key)?;
            if !contents.is_empty() {
                return Err(AppError::DirectoryNotEmpty(name.to_string()));
            }

            self.emit(BrowserEvent::Deleting { path: path.clone() }).await;
            self.storage
                .delete_directory(&key)
                .await
                .context("delete directory", &key)?;
        } else {
            self.emit(BrowserEvent::Deleting { path: path.clone() }).await;
            if self.storage.mime_type(&key).starts_with("image") {
                self.thumbnails.delete(&item).await?;
            }
            self.storage.delete(&key).await.context("delete", &key)?;
        }

        tracing::info!(key = %key, "Item deleted");
        self.emit(BrowserEvent::Deleted { path }).await;
        Ok(())
    }

    /// Rename a file or folder in the working directory. Files keep their
    /// extension whatever the new name says. Returns the final name.
    pub async fn rename(&self, old_name: &str, new_name: &str) -> Result<String, AppError> {
        Self::require_name(old_name, ItemKind::File)?;
        Self::require_name(new_name, ItemKind::File)?;

        let old = self.current(old_name);
        if !self.exists(&old).await? {
            return Err(AppError::NotFound(old_name.to_string()));
        }

        let kind = if self.classifier.is_directory(&old).await? {
            ItemKind::Folder
        } else {
            ItemKind::File
        };
        self.names.check_name(new_name, kind)?;

        let mut final_name = new_name.to_string();
        if kind == ItemKind::File {
            let extension = utf8_pathinfo(old_name, PathPart::Extension);
            if !extension.is_empty() {
                let dotted = format!(".{}", extension);
                final_name = format!("{}{}", new_name.replace(&dotted, ""), dotted);
            }
        }

        let new = self.current(final_name.as_str());
        if self.exists(&new).await? {
            return Err(AppError::AlreadyExists(final_name));
        }

        let old_path = self.resolver.absolute_path(&old);
        let new_path = self.resolver.absolute_path(&new);
        self.emit(BrowserEvent::Renaming {
            old_path: old_path.clone(),
            new_path: new_path.clone(),
        })
        .await;

        if kind == ItemKind::File {
            self.thumbnails.relocate(&old, &new).await?;
        }

        let old_key = self.resolver.backend_key(&old);
        let new_key = self.resolver.backend_key(&new);
        self.storage
            .move_item(&old_key, &new_key)
            .await
            .context("move", &old_key)?;

        tracing::info!(from = %old_key, to = %new_key, "Item renamed");
        self.emit(BrowserEvent::Renamed { old_path, new_path }).await;
        Ok(final_name)
    }

    /// Move items of the working directory into `target_dir`, which must be
    /// an existing directory. A folder never moves into itself or below.
    pub async fn move_items(&self, names: &[String], target_dir: &str) -> Vec<AppError> {
        let target = ItemIdentity::new().in_directory(target_dir);
        match self.classifier.is_directory(&target).await {
            Ok(true) => {}
            Ok(false) => return vec![AppError::NotFound(target_dir.to_string())],
            Err(e) => return vec![e],
        }

        let mut errors = Vec::new();
        for name in names {
            if let Err(e) = self.move_one(name, &target).await {
                tracing::debug!(name = %name, target = %target_dir, error = %e, "Move failed");
                errors.push(e);
            }
        }
        errors
    }

    async fn move_one(&self, name: &str, target_dir: &ItemIdentity) -> Result<(), AppError> {
        Self::require_name(name, ItemKind::File)?;

        let source = self.current(name);
        let source_path = self.resolver.working_dir_path(&source);
        let target_path = self.resolver.working_dir_path(target_dir);
        if is_same_or_below(&target_path, &source_path) {
            return Err(AppError::InvalidMoveTarget(name.to_string()));
        }

        if !self.exists(&source).await? {
            return Err(AppError::NotFound(name.to_string()));
        }

        let target = target_dir.with_name(name);
        if self.exists(&target).await? {
            return Err(AppError::AlreadyExists(name.to_string()));
        }

        self.thumbnails.relocate(&source, &target).await?;

        let from_key = self.resolver.backend_key(&source);
        let to_key = self.resolver.backend_key(&target);
        self.storage
            .move_item(&from_key, &to_key)
            .await
            .context("move", &from_key)?;

        tracing::info!(from = %from_key, to = %to_key, "Item moved");
        self.emit(BrowserEvent::Moved {
            old_path: self.resolver.absolute_path(&source),
            new_path: self.resolver.absolute_path(&target),
        })
        .await;
        Ok(())
    }

    /// Content and MIME type of a file in the working directory.
    pub async fn download(&self, name: &str) -> Result<(Vec<u8>, String), AppError> {
        Self::require_name(name, ItemKind::File)?;

        let item = self.current(name);
        if !self.exists(&item).await? {
            return Err(AppError::NotFound(name.to_string()));
        }

        let key = self.resolver.backend_key(&item);
        let data = self.storage.read(&key).await.context("read", &key)?;
        Ok((data, self.storage.mime_type(&key)))
    }

    /// Crop an image in place, or into a `_cropped_<timestamp>` copy.
    /// Returns the name that was written.
    pub async fn crop(&self, name: &str, rect: CropRect, overwrite: bool) -> Result<String, AppError> {
        let (source, data, mime_type) = self.load_image(name).await?;
        let output = self
            .codec
            .crop(data, &mime_type, rect)
            .await
            .map_err(codec_error)?;

        let target_name = self.edited_name(name, "cropped", overwrite);
        let target = source.with_name(target_name.as_str());
        let path = self.resolver.absolute_path(&target);
        self.emit(BrowserEvent::ImageCropping { path: path.clone() }).await;
        self.store_edited(&target, output.to_vec()).await?;

        self.emit(BrowserEvent::ImageCropped { path }).await;
        Ok(target_name)
    }

    /// Resize an image in place, or into a `_resized_<timestamp>` copy.
    pub async fn resize(
        &self,
        name: &str,
        width: u32,
        height: u32,
        overwrite: bool,
    ) -> Result<String, AppError> {
        let (source, data, mime_type) = self.load_image(name).await?;
        let output = self
            .codec
            .resize(data, &mime_type, width, height)
            .await
            .map_err(codec_error)?;

        let target_name = self.edited_name(name, "resized", overwrite);
        let target = source.with_name(target_name.as_str());
        let path = self.resolver.absolute_path(&target);
        self.emit(BrowserEvent::ImageResizing { path: path.clone() }).await;
        self.store_edited(&target, output.to_vec()).await?;

        self.emit(BrowserEvent::ImageResized { path }).await;
        Ok(target_name)
    }

    /// Original size of an image and the size it is displayed at in the
    /// resize dialog.
    pub async fn resize_preview(&self, name: &str) -> Result<ResizePreview, AppError> {
        let (_, data, _) = self.load_image(name).await?;
        let (original_width, original_height) =
            self.codec.dimensions(data).await.map_err(codec_error)?;
        Ok(preview_size(original_width, original_height))
    }

    async fn load_image(&self, name: &str) -> Result<(ItemIdentity, Vec<u8>, String), AppError> {
        Self::require_name(name, ItemKind::File)?;

        let source = self.current(name);
        if !self.exists(&source).await? {
            return Err(AppError::NotFound(name.to_string()));
        }

        let key = self.resolver.backend_key(&source);
        let data = self.storage.read(&key).await.context("read", &key)?;
        Ok((source, data, self.storage.mime_type(&key)))
    }

    fn edited_name(&self, name: &str, operation: &str, overwrite: bool) -> String {
        if overwrite {
            name.to_string()
        } else {
            derived_name(name, &format!("_{}_{}", operation, Utc::now().timestamp()))
        }
    }

    async fn store_edited(&self, target: &ItemIdentity, data: Vec<u8>) -> Result<(), AppError> {
        let key = self.resolver.backend_key(target);
        self.storage
            .put(&key, data, Visibility::Public)
            .await
            .context("put", &key)?;
        self.thumbnails.generate(target).await?;
        tracing::info!(key = %key, "Edited image stored");
        Ok(())
    }
}

fn last_segment(key: &str) -> &str {
    key.rsplit(DS).next().unwrap_or(key)
}

/// Whether `path` is `ancestor` itself or lies below it.
fn is_same_or_below(path: &str, ancestor: &str) -> bool {
    path == ancestor
        || path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with(DS))
}

fn sort_items(items: &mut [ItemInfo], sort: SortKey) {
    items.sort_by(|a, b| match sort {
        SortKey::Name => compare_names(&a.name, &b.name),
        SortKey::Time => a.modified_unix.cmp(&b.modified_unix),
    });
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// `suffix` inserted before the last extension, or appended when there is none.
pub fn derived_name(name: &str, suffix: &str) -> String {
    match name.rfind('.') {
        Some(idx) => format!("{}{}{}", &name[..idx], suffix, &name[idx..]),
        None => format!("{}{}", name, suffix),
    }
}

/// Scale into the preview box: first to the maximum width, then, if still
/// too tall, to the maximum height.
pub fn preview_size(original_width: u32, original_height: u32) -> ResizePreview {
    let (w, h) = (original_width as f64, original_height as f64);
    let mut ratio = 1.0;
    let mut scaled = false;
    let (mut width, mut height) = (w, h);

    if width > RESIZE_PREVIEW_MAX_WIDTH {
        ratio = RESIZE_PREVIEW_MAX_WIDTH / w;
        width = w * ratio;
        height = h * ratio;
        scaled = true;
    }

    if height > RESIZE_PREVIEW_MAX_HEIGHT {
        ratio = RESIZE_PREVIEW_MAX_HEIGHT / h;
        width = w * ratio;
        height = h * ratio;
        scaled = true;
    }

    ResizePreview {
        original_width,
        original_height,
        width,
        height,
        ratio,
        scaled,
    }
}
