//! Path resolution
//!
//! An [`ItemIdentity`] is turned into its four representations in a fixed
//! order: the logical working-directory path, the category-prefixed URL key,
//! the backend key in the native separator and finally the absolute path. The
//! absolute path is built from the backend's live root on every call.

use std::sync::Arc;

use filedeck_core::constants::{DS, NO_SUBFOLDER};
use filedeck_core::{FileManagerConfig, FolderType, ItemIdentity, PathRepresentation};
use filedeck_storage::Storage;

use crate::context::BrowserContext;

#[derive(Clone)]
pub struct PathResolver {
    config: Arc<FileManagerConfig>,
    storage: Arc<dyn Storage>,
    context: BrowserContext,
}

impl PathResolver {
    pub fn new(
        config: Arc<FileManagerConfig>,
        storage: Arc<dyn Storage>,
        context: BrowserContext,
    ) -> Self {
        Self {
            config,
            storage,
            context,
        }
    }

    pub fn context(&self) -> &BrowserContext {
        &self.context
    }

    pub fn config(&self) -> &FileManagerConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Compute every representation of `identity`.
    pub fn resolve(&self, identity: &ItemIdentity) -> PathRepresentation {
        let working_dir_path = self.working_dir_path(identity);
        let url_key = self.url_key_for(&working_dir_path);
        let backend_key = self.to_native(&url_key);
        let absolute_path = format!("{}{}", self.storage.root_path(), backend_key);

        PathRepresentation {
            working_dir_path,
            url_key,
            backend_key,
            absolute_path,
        }
    }

    /// Root folder of the given type for the current user.
    pub fn root_folder(&self, folder_type: FolderType) -> String {
        self.config
            .root_folder(folder_type, self.context.user_slug())
    }

    /// Directory the identity lives in: its own working directory, else the
    /// request default, else the default root folder.
    pub fn base_directory(&self, identity: &ItemIdentity) -> String {
        let explicit = identity
            .working_dir()
            .filter(|dir| !dir.is_empty())
            .or_else(|| self.context.working_dir());

        match explicit {
            Some(dir) if dir.starts_with(DS) => dir.to_string(),
            Some(dir) => format!("{}{}", DS, dir),
            None => self.root_folder(self.config.default_folder_type(self.context.category())),
        }
    }

    /// Logical forward-slash path of the identity.
    pub fn working_dir_path(&self, identity: &ItemIdentity) -> String {
        let mut path = self.base_directory(identity);

        if identity.is_thumbnail() {
            path = append_segment(&path, &self.config.thumb_folder_name);
        }

        if !identity.name().is_empty() {
            path = append_segment(&path, identity.name());
        }

        if path.len() > 1 {
            let trimmed = path.trim_end_matches(DS);
            if trimmed.is_empty() {
                return DS.to_string();
            }
            return trimmed.to_string();
        }
        path
    }

    pub fn url_key(&self, identity: &ItemIdentity) -> String {
        self.url_key_for(&self.working_dir_path(identity))
    }

    pub fn backend_key(&self, identity: &ItemIdentity) -> String {
        self.to_native(&self.url_key(identity))
    }

    pub fn absolute_path(&self, identity: &ItemIdentity) -> String {
        format!("{}{}", self.storage.root_path(), self.backend_key(identity))
    }

    /// Public URL of the identity.
    pub fn url(&self, identity: &ItemIdentity) -> String {
        self.storage.url(&self.backend_key(identity))
    }

    /// Reverse of the native-separator translation: a key returned by the
    /// backend back into URL-key form.
    pub fn translate_to_logical(&self, backend_key: &str) -> String {
        let separator = self.storage.separator();
        if separator == DS {
            backend_key.to_string()
        } else {
            backend_key.replace(separator, &DS.to_string())
        }
    }

    fn url_key_for(&self, working_dir_path: &str) -> String {
        let prefix = self
            .config
            .category_folder_name(self.context.category());

        if prefix == NO_SUBFOLDER {
            working_dir_path.trim_start_matches(DS).to_string()
        } else {
            format!("{}{}", prefix, working_dir_path)
        }
    }

    fn to_native(&self, url_key: &str) -> String {
        let separator = self.storage.separator();
        if separator == DS {
            url_key.to_string()
        } else {
            url_key.replace(DS, &separator.to_string())
        }
    }
}

fn append_segment(base: &str, segment: &str) -> String {
    format!("{}{}{}", base.trim_end_matches(DS), DS, segment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filedeck_core::StorageBackend;
    use filedeck_storage::MemoryStorage;

    fn config() -> FileManagerConfig {
        FileManagerConfig {
            storage_backend: StorageBackend::Memory,
            ..FileManagerConfig::default()
        }
    }

    fn resolver_with(config: FileManagerConfig, storage: MemoryStorage, kind: Option<&str>) -> PathResolver {
        let context = BrowserContext::new(&config, kind, "alice");
        PathResolver::new(Arc::new(config), Arc::new(storage), context)
    }

    #[test]
    fn test_default_root_folder() {
        let resolver = resolver_with(config(), MemoryStorage::new(), None);
        let repr = resolver.resolve(&ItemIdentity::new().with_name("a.jpg"));

        assert_eq!(repr.working_dir_path, "/alice/a.jpg");
        assert_eq!(repr.url_key, "files/alice/a.jpg");
        assert_eq!(repr.backend_key, "files/alice/a.jpg");
        assert_eq!(repr.absolute_path, "memory://files/alice/a.jpg");
    }

    #[test]
    fn test_thumbnail_segment() {
        let resolver = resolver_with(config(), MemoryStorage::new(), Some("images"));
        let identity = ItemIdentity::new().in_directory("/alice/trip").with_name("b.png");

        assert_eq!(
            resolver.url_key(&identity.as_thumbnail()),
            "photos/alice/trip/thumbs/b.png"
        );
        assert_eq!(resolver.url_key(&identity), "photos/alice/trip/b.png");
    }

    #[test]
    fn test_root_directory_does_not_double_separator() {
        let resolver = resolver_with(config(), MemoryStorage::new(), None);
        let identity = ItemIdentity::new().in_directory("/").with_name("a.jpg");
        assert_eq!(resolver.working_dir_path(&identity), "/a.jpg");
        assert_eq!(resolver.working_dir_path(&identity.without_name()), "/");
        assert_eq!(
            resolver.working_dir_path(&identity.without_name().as_thumbnail()),
            "/thumbs"
        );
    }

    #[test]
    fn test_no_subfolder_category_strips_leading_separator() {
        let mut config = config();
        config.categories.get_mut("file").unwrap().folder_name = NO_SUBFOLDER.to_string();
        let resolver = resolver_with(config, MemoryStorage::new(), None);

        let identity = ItemIdentity::new().in_directory("/alice").with_name("a.jpg");
        assert_eq!(resolver.url_key(&identity), "alice/a.jpg");
        assert_eq!(resolver.url_key(&ItemIdentity::new().in_directory("/")), "");
    }

    #[test]
    fn test_backslash_backend() {
        let storage = MemoryStorage::with_layout('\\', "C:\\data\\", "http://localhost/storage");
        let resolver = resolver_with(config(), storage, None);
        let identity = ItemIdentity::new().in_directory("/alice/sub").with_name("a.jpg");

        assert_eq!(resolver.backend_key(&identity), "files\\alice\\sub\\a.jpg");
        assert_eq!(
            resolver.absolute_path(&identity),
            "C:\\data\\files\\alice\\sub\\a.jpg"
        );
        assert_eq!(
            resolver.translate_to_logical(&resolver.backend_key(&identity)),
            resolver.url_key(&identity)
        );
    }

    #[test]
    fn test_relative_working_dir_is_anchored() {
        let resolver = resolver_with(config(), MemoryStorage::new(), None);
        let identity = ItemIdentity::new().in_directory("shares").with_name("doc.pdf");
        assert_eq!(resolver.working_dir_path(&identity), "/shares/doc.pdf");
    }

    #[test]
    fn test_context_working_dir_is_the_default() {
        let config = config();
        let context = BrowserContext::new(&config, None, "alice").in_working_dir("/shares");
        let resolver = PathResolver::new(Arc::new(config), Arc::new(MemoryStorage::new()), context);

        assert_eq!(
            resolver.working_dir_path(&ItemIdentity::new().with_name("x.txt")),
            "/shares/x.txt"
        );
        assert_eq!(
            resolver.working_dir_path(&ItemIdentity::new().in_directory("/alice")),
            "/alice"
        );
    }
}
