use crate::keys::{child_prefix, join_key, normalize_key, public_url};
use crate::traits::{
    DirectoryOptions, ObjectMetadata, Storage, StorageError, StorageResult, Visibility,
};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    last_modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    objects: BTreeMap<String, StoredObject>,
    /// Explicitly created directories.
    directories: BTreeSet<String>,
}

/// In-process flat store
///
/// Keys live in one ordered map; directories exist implicitly when some key
/// sits below them, or explicitly after [`Storage::make_directory`]. The
/// separator is configurable so backslash-native layouts can be exercised on
/// any platform.
#[derive(Clone)]
pub struct MemoryStorage {
    state: Arc<RwLock<State>>,
    separator: char,
    root: String,
    base_url: String,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_layout('/', "memory://", "http://localhost/storage")
    }

    /// Create a store with a custom native separator, root path and base URL.
    pub fn with_layout(separator: char, root: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
            separator,
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    /// Number of stored objects (test helper)
    pub async fn object_count(&self) -> usize {
        self.state.read().await.objects.len()
    }

    fn key(&self, key: &str) -> StorageResult<String> {
        normalize_key(key, self.separator)
    }

    fn is_directory(state: &State, key: &str, separator: char) -> bool {
        if key.is_empty() || state.directories.contains(key) {
            return true;
        }
        let prefix = child_prefix(key, separator);
        state.objects.keys().any(|k| k.starts_with(&prefix))
            || state.directories.iter().any(|d| d.starts_with(&prefix))
    }

    fn collect_children(&self, state: &State, dir_key: &str, want_dirs: bool) -> Vec<String> {
        let prefix = child_prefix(dir_key, self.separator);
        let mut children = BTreeSet::new();

        for key in state.objects.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once(self.separator) {
                Some((dir, _)) if want_dirs => {
                    children.insert(join_key(dir_key, dir, self.separator));
                }
                None if !want_dirs => {
                    children.insert(key.clone());
                }
                _ => {}
            }
        }

        if want_dirs {
            for dir in &state.directories {
                if let Some(rest) = dir.strip_prefix(&prefix) {
                    let first = rest.split(self.separator).next().unwrap_or(rest);
                    if !first.is_empty() {
                        children.insert(join_key(dir_key, first, self.separator));
                    }
                }
            }
        }

        children.into_iter().collect()
    }

    /// Register every ancestor of `key` as an explicit directory.
    fn register_parents(&self, state: &mut State, key: &str) {
        let mut current = String::new();
        let segments: Vec<&str> = key.split(self.separator).collect();
        for segment in &segments[..segments.len().saturating_sub(1)] {
            current = join_key(&current, segment, self.separator);
            state.directories.insert(current.clone());
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let key = self.key(key)?;
        let state = self.state.read().await;
        Ok(state.objects.contains_key(&key) || Self::is_directory(&state, &key, self.separator))
    }

    async fn delete(&self, key: &str) -> StorageResult<bool> {
        let key = self.key(key)?;
        let removed = self.state.write().await.objects.remove(&key).is_some();
        if removed {
            tracing::debug!(key = %key, "Memory storage delete successful");
        }
        Ok(removed)
    }

    async fn delete_directory(&self, key: &str) -> StorageResult<bool> {
        let key = self.key(key)?;
        if key.is_empty() {
            return Err(StorageError::InvalidKey(
                "Refusing to delete the storage root".to_string(),
            ));
        }
        let prefix = child_prefix(&key, self.separator);

        let mut state = self.state.write().await;
        let before = state.objects.len() + state.directories.len();
        state.objects.retain(|k, _| !k.starts_with(&prefix));
        state
            .directories
            .retain(|d| d != &key && !d.starts_with(&prefix));
        let removed = before != state.objects.len() + state.directories.len();

        tracing::debug!(key = %key, removed, "Memory storage directory delete");
        Ok(removed)
    }

    async fn files(&self, dir_key: &str) -> StorageResult<Vec<String>> {
        let dir_key = self.key(dir_key)?;
        let state = self.state.read().await;
        Ok(self.collect_children(&state, &dir_key, false))
    }

    async fn directories(&self, dir_key: &str) -> StorageResult<Vec<String>> {
        let dir_key = self.key(dir_key)?;
        let state = self.state.read().await;
        Ok(self.collect_children(&state, &dir_key, true))
    }

    async fn all_files(&self, dir_key: &str) -> StorageResult<Vec<String>> {
        let dir_key = self.key(dir_key)?;
        let prefix = child_prefix(&dir_key, self.separator);
        let state = self.state.read().await;
        Ok(state
            .objects
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .cloned()
            .collect())
    }

    async fn move_item(&self, from_key: &str, to_key: &str) -> StorageResult<bool> {
        let from_key = self.key(from_key)?;
        let to_key = self.key(to_key)?;
        let mut state = self.state.write().await;

        if let Some(object) = state.objects.remove(&from_key) {
            self.register_parents(&mut state, &to_key);
            state.objects.insert(to_key.clone(), object);
        } else if Self::is_directory(&state, &from_key, self.separator) && !from_key.is_empty() {
            let prefix = child_prefix(&from_key, self.separator);
            let target_prefix = child_prefix(&to_key, self.separator);

            let moved: Vec<String> = state
                .objects
                .keys()
                .filter(|k| k.starts_with(&prefix))
                .cloned()
                .collect();
            for key in moved {
                if let Some(object) = state.objects.remove(&key) {
                    let target = format!("{}{}", target_prefix, &key[prefix.len()..]);
                    state.objects.insert(target, object);
                }
            }

            let dirs: Vec<String> = state
                .directories
                .iter()
                .filter(|d| *d == &from_key || d.starts_with(&prefix))
                .cloned()
                .collect();
            for dir in dirs {
                state.directories.remove(&dir);
                let target = if dir == from_key {
                    to_key.clone()
                } else {
                    format!("{}{}", target_prefix, &dir[prefix.len()..])
                };
                state.directories.insert(target);
            }
            state.directories.insert(to_key.clone());
            self.register_parents(&mut state, &to_key);
        } else {
            return Err(StorageError::NotFound(from_key));
        }

        tracing::debug!(from_key = %from_key, to_key = %to_key, "Memory storage move successful");
        Ok(true)
    }

    async fn read(&self, key: &str) -> StorageResult<Vec<u8>> {
        let key = self.key(key)?;
        let state = self.state.read().await;
        state
            .objects
            .get(&key)
            .map(|object| object.data.clone())
            .ok_or(StorageError::NotFound(key))
    }

    async fn write(
        &self,
        dir_key: &str,
        name: &str,
        data: Vec<u8>,
        visibility: Visibility,
    ) -> StorageResult<String> {
        let dir_key = self.key(dir_key)?;
        let key = join_key(&dir_key, name, self.separator);
        self.put(&key, data, visibility).await?;
        Ok(key)
    }

    async fn put(&self, key: &str, data: Vec<u8>, _visibility: Visibility) -> StorageResult<()> {
        let key = self.key(key)?;
        if key.is_empty() {
            return Err(StorageError::InvalidKey("Empty key".to_string()));
        }

        let size = data.len();
        let mut state = self.state.write().await;
        self.register_parents(&mut state, &key);
        state.objects.insert(
            key.clone(),
            StoredObject {
                data,
                last_modified: Utc::now(),
            },
        );

        tracing::debug!(key = %key, size_bytes = size, "Memory storage write successful");
        Ok(())
    }

    async fn make_directory(&self, key: &str, options: DirectoryOptions) -> StorageResult<()> {
        let key = self.key(key)?;
        if key.is_empty() {
            return Ok(());
        }

        let mut state = self.state.write().await;
        if Self::is_directory(&state, &key, self.separator) && !options.force {
            return Err(StorageError::BackendError(format!(
                "Directory already exists: {}",
                key
            )));
        }
        if options.recursive {
            self.register_parents(&mut state, &key);
        }
        state.directories.insert(key);
        Ok(())
    }

    async fn set_visibility(&self, _key: &str, _visibility: Visibility) -> StorageResult<()> {
        Ok(())
    }

    async fn metadata(&self, key: &str) -> StorageResult<ObjectMetadata> {
        let key = self.key(key)?;
        let state = self.state.read().await;
        state
            .objects
            .get(&key)
            .map(|object| ObjectMetadata {
                size: object.data.len() as u64,
                last_modified: object.last_modified,
            })
            .ok_or(StorageError::NotFound(key))
    }

    fn url(&self, key: &str) -> String {
        public_url(&self.base_url, key, self.separator)
    }

    fn root_path(&self) -> String {
        self.root.clone()
    }

    fn separator(&self) -> char {
        self.separator
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
