//! Upload naming and name gates.

use std::sync::Arc;

use filedeck_core::{
    utf8_pathinfo, AppError, FileManagerConfig, InvalidNameReason, ItemIdentity, ItemKind,
    PathPart,
};
use regex::Regex;

use crate::error::StorageResultExt;
use crate::path::PathResolver;

const SANITIZE_PATTERN: &str = r"[^A-Za-z0-9\-']";
const FOLDER_NAME_PATTERN: &str = r"[^A-Za-z0-9_\-]";
const FILE_NAME_PATTERN: &str = r"[^.A-Za-z0-9_\-]";

fn compile(pattern: &str) -> Result<Regex, AppError> {
    Regex::new(pattern)
        .map_err(|e| AppError::Internal(format!("Invalid name pattern {}: {}", pattern, e)))
}

/// Picks the name an upload is stored under.
#[derive(Clone)]
pub struct NameAllocator {
    config: Arc<FileManagerConfig>,
    resolver: PathResolver,
}

impl NameAllocator {
    pub fn new(config: Arc<FileManagerConfig>, resolver: PathResolver) -> Self {
        Self { config, resolver }
    }

    /// Base name (no extension) derived from the client-supplied name.
    pub fn sanitize(&self, original_name: &str) -> Result<String, AppError> {
        if self.config.rename_file {
            return Ok(uuid::Uuid::new_v4().simple().to_string());
        }

        let base = utf8_pathinfo(original_name, PathPart::Filename)
            .trim()
            .to_string();

        if self.config.alphanumeric_filename {
            return Ok(compile(SANITIZE_PATTERN)?.replace_all(&base, "_").into_owned());
        }
        Ok(base)
    }

    /// Final name for `base` + `extension` inside `directory`.
    ///
    /// Without `rename_duplicates` the candidate is returned unchanged and
    /// collisions are left to the validation chain. Otherwise a counter suffix
    /// is appended until the name is free. The existence check and the later
    /// write are not atomic: two concurrent uploads may settle on the same
    /// name.
    pub async fn allocate(
        &self,
        directory: &ItemIdentity,
        base: &str,
        extension: &str,
    ) -> Result<String, AppError> {
        let alphanumeric = self.config.alphanumeric_filename;
        let mut candidate = suffixed_name(base, extension, 0, alphanumeric);

        if !self.config.rename_duplicates {
            return Ok(candidate);
        }

        let storage = self.resolver.storage();
        let mut counter = 1;
        loop {
            let key = self.resolver.backend_key(&directory.with_name(candidate.as_str()));
            if !storage.exists(&key).await.context("exists", &key)? {
                break;
            }
            candidate = suffixed_name(base, extension, counter, alphanumeric);
            counter += 1;
        }

        if counter > 1 {
            tracing::debug!(base = %base, name = %candidate, "Allocated name for duplicate upload");
        }
        Ok(candidate)
    }

    /// Sanitize the client name and allocate a free final name.
    pub async fn new_name(
        &self,
        directory: &ItemIdentity,
        original_name: &str,
        extension: &str,
    ) -> Result<String, AppError> {
        let base = self.sanitize(original_name)?;
        self.allocate(directory, &base, extension).await
    }

    /// Reject empty names and, when the alphanumeric switches are on, names
    /// with characters outside `[\w-]` (folders) or `[.\w-]` (files).
    pub fn check_name(&self, name: &str, kind: ItemKind) -> Result<(), AppError> {
        if name.is_empty() {
            return Err(invalid_name(kind, name, InvalidNameReason::Empty));
        }

        if kind == ItemKind::Folder
            && self.config.alphanumeric_directory
            && compile(FOLDER_NAME_PATTERN)?.is_match(name)
        {
            return Err(invalid_name(kind, name, InvalidNameReason::NotAlphanumeric));
        }

        if self.config.alphanumeric_filename && compile(FILE_NAME_PATTERN)?.is_match(name) {
            return Err(invalid_name(kind, name, InvalidNameReason::NotAlphanumeric));
        }

        Ok(())
    }

    /// Folder creation only applies the directory gate.
    pub fn check_folder_name(&self, name: &str) -> Result<(), AppError> {
        if name.is_empty() {
            return Err(invalid_name(ItemKind::Folder, name, InvalidNameReason::Empty));
        }
        if self.config.alphanumeric_directory && compile(FOLDER_NAME_PATTERN)?.is_match(name) {
            return Err(invalid_name(
                ItemKind::Folder,
                name,
                InvalidNameReason::NotAlphanumeric,
            ));
        }
        Ok(())
    }
}

fn invalid_name(kind: ItemKind, name: &str, reason: InvalidNameReason) -> AppError {
    AppError::InvalidName {
        kind,
        name: name.to_string(),
        reason,
    }
}

/// `base.ext`, with `_<counter>` or ` (<counter>)` after the base when
/// `counter` is positive.
pub fn suffixed_name(base: &str, extension: &str, counter: u32, alphanumeric: bool) -> String {
    let stem = match (counter, alphanumeric) {
        (0, _) => base.to_string(),
        (n, true) => format!("{}_{}", base, n),
        (n, false) => format!("{} ({})", base, n),
    };

    if extension.is_empty() {
        stem
    } else {
        format!("{}.{}", stem, extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BrowserContext;
    use filedeck_core::StorageBackend;
    use filedeck_storage::{MemoryStorage, Storage, Visibility};

    fn allocator(config: FileManagerConfig, storage: MemoryStorage) -> NameAllocator {
        let config = Arc::new(config);
        let context = BrowserContext::new(&config, None, "alice");
        let resolver = PathResolver::new(config.clone(), Arc::new(storage), context);
        NameAllocator::new(config, resolver)
    }

    fn config() -> FileManagerConfig {
        FileManagerConfig {
            storage_backend: StorageBackend::Memory,
            ..FileManagerConfig::default()
        }
    }

    #[test]
    fn test_suffixed_name() {
        assert_eq!(suffixed_name("photo", "jpg", 0, false), "photo.jpg");
        assert_eq!(suffixed_name("photo", "jpg", 2, false), "photo (2).jpg");
        assert_eq!(suffixed_name("photo", "jpg", 3, true), "photo_3.jpg");
        assert_eq!(suffixed_name("Makefile", "", 1, false), "Makefile (1)");
    }

    #[tokio::test]
    async fn test_allocate_skips_existing_names() {
        let storage = MemoryStorage::new();
        for key in ["files/alice/photo.jpg", "files/alice/photo (1).jpg"] {
            storage.put(key, b"x".to_vec(), Visibility::Public).await.unwrap();
        }
        let allocator = allocator(
            FileManagerConfig {
                rename_duplicates: true,
                ..config()
            },
            storage,
        );

        let name = allocator
            .allocate(&ItemIdentity::new(), "photo", "jpg")
            .await
            .unwrap();
        assert_eq!(name, "photo (2).jpg");
    }

    #[tokio::test]
    async fn test_allocate_without_rename_duplicates_keeps_candidate() {
        let storage = MemoryStorage::new();
        storage
            .put("files/alice/photo.jpg", b"x".to_vec(), Visibility::Public)
            .await
            .unwrap();
        let allocator = allocator(config(), storage);

        let name = allocator
            .allocate(&ItemIdentity::new(), "photo", "jpg")
            .await
            .unwrap();
        assert_eq!(name, "photo.jpg");
    }

    #[test]
    fn test_sanitize() {
        let plain = allocator(config(), MemoryStorage::new());
        assert_eq!(plain.sanitize("  Über Foto .jpg").unwrap(), "Über Foto");

        let alnum = allocator(
            FileManagerConfig {
                alphanumeric_filename: true,
                ..config()
            },
            MemoryStorage::new(),
        );
        assert_eq!(alnum.sanitize("my photo's #1.jpg").unwrap(), "my_photo's__1");

        let renamed = allocator(
            FileManagerConfig {
                rename_file: true,
                ..config()
            },
            MemoryStorage::new(),
        );
        let token = renamed.sanitize("a.jpg").unwrap();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_name_gates() {
        let allocator = allocator(
            FileManagerConfig {
                alphanumeric_directory: true,
                alphanumeric_filename: true,
                ..config()
            },
            MemoryStorage::new(),
        );

        assert!(allocator.check_name("photo-1_a.jpg", ItemKind::File).is_ok());
        assert!(matches!(
            allocator.check_name("photo 1.jpg", ItemKind::File),
            Err(AppError::InvalidName {
                reason: InvalidNameReason::NotAlphanumeric,
                ..
            })
        ));
        assert!(allocator.check_name("my.folder", ItemKind::Folder).is_err());
        assert!(allocator.check_folder_name("my_folder-2").is_ok());
        assert!(matches!(
            allocator.check_folder_name(""),
            Err(AppError::InvalidName {
                kind: ItemKind::Folder,
                reason: InvalidNameReason::Empty,
                ..
            })
        ));
    }

    #[test]
    fn test_gates_off_accept_anything_non_empty() {
        let allocator = allocator(config(), MemoryStorage::new());
        assert!(allocator.check_name("Ünïcode name.jpg", ItemKind::File).is_ok());
        assert!(allocator.check_folder_name("with space").is_ok());
    }
}
