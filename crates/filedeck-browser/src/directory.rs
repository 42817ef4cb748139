//! Directory inference
//!
//! Flat object stores have no directory metadata, so an item is a directory
//! exactly when its URL key shows up in its parent's directory listing. Every
//! operation asks [`DirectoryClassifier`]; none of them looks at backend
//! specific directory flags.

use filedeck_core::constants::DS;
use filedeck_core::{AppError, ItemIdentity};
use filedeck_storage::{DirectoryOptions, Storage, Visibility};

use crate::error::StorageResultExt;
use crate::path::PathResolver;

#[derive(Clone)]
pub struct DirectoryClassifier {
    resolver: PathResolver,
}

impl DirectoryClassifier {
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    pub async fn is_directory(&self, identity: &ItemIdentity) -> Result<bool, AppError> {
        let path = self.resolver.working_dir_path(identity);
        let parent = ItemIdentity::new().in_directory(parent_working_dir(&path));
        let parent_key = self.resolver.backend_key(&parent);

        let directories = self
            .resolver
            .storage()
            .directories(&parent_key)
            .await
            .context("list directories", &parent_key)?;

        let url_key = self.resolver.url_key(identity);
        Ok(is_member(
            &url_key,
            directories
                .iter()
                .map(|key| self.resolver.translate_to_logical(key)),
        ))
    }
}

/// Everything before the last separator, `/` when that is empty.
pub fn parent_working_dir(path: &str) -> String {
    match path.rfind(DS) {
        Some(idx) if idx > 0 => path[..idx].to_string(),
        _ => DS.to_string(),
    }
}

/// Whether `url_key` is one of the listed keys.
pub fn is_member<I>(url_key: &str, listing: I) -> bool
where
    I: IntoIterator<Item = String>,
{
    listing.into_iter().any(|key| key == url_key)
}

/// Create a directory if needed, then make it public where the backend
/// supports it. "Already exists" counts as success.
pub(crate) async fn ensure_directory(storage: &dyn Storage, key: &str) -> Result<(), AppError> {
    storage
        .make_directory(key, DirectoryOptions::default())
        .await
        .context("make directory", key)?;

    if storage.exists(key).await.context("exists", key)? {
        if let Err(e) = storage.set_visibility(key, Visibility::Public).await {
            tracing::warn!(key = %key, error = %e, "Failed to set directory visibility");
        }
    }

    Ok(())
}
