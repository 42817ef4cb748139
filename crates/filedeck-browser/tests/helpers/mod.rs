//! Test helpers: build a FileBrowser over an in-memory backend.
//!
//! Run from workspace root: `cargo test -p filedeck-browser`.

#![allow(dead_code)]

pub mod fixtures;
pub mod storage;

use async_trait::async_trait;
use filedeck_browser::{BrowserContext, FileBrowser};
use filedeck_core::{BrowserEvent, BrowserEventListener, FileManagerConfig, StorageBackend};
use filedeck_processing::ImageTransformer;
use filedeck_storage::{MemoryStorage, Storage, Visibility};
use std::sync::{Arc, Mutex};

pub const USER: &str = "alice";

/// Browser plus handles on its collaborators.
pub struct TestBrowser {
    pub browser: FileBrowser,
    pub storage: Arc<dyn Storage>,
    pub config: Arc<FileManagerConfig>,
    pub events: Arc<RecordingListener>,
}

impl TestBrowser {
    /// Seed a file under its backend key.
    pub async fn seed(&self, key: &str, data: &[u8]) {
        self.storage
            .put(key, data.to_vec(), Visibility::Public)
            .await
            .expect("Failed to seed storage");
    }

    pub async fn exists(&self, key: &str) -> bool {
        self.storage.exists(key).await.expect("exists failed")
    }

    /// Another browser over the same backend, in another working directory.
    pub fn in_working_dir(&self, working_dir: &str) -> FileBrowser {
        let context = self
            .browser
            .resolver()
            .context()
            .clone()
            .in_working_dir(working_dir);
        FileBrowser::new(
            self.config.clone(),
            self.storage.clone(),
            Arc::new(ImageTransformer::new()),
            context,
        )
    }
}

/// Memory-backed config with everything else at its defaults.
pub fn test_config() -> FileManagerConfig {
    FileManagerConfig {
        storage_backend: StorageBackend::Memory,
        ..FileManagerConfig::default()
    }
}

pub fn setup_browser() -> TestBrowser {
    setup_browser_with(test_config(), Arc::new(MemoryStorage::new()), Some("image"))
}

pub fn setup_browser_with(
    config: FileManagerConfig,
    storage: Arc<dyn Storage>,
    requested_type: Option<&str>,
) -> TestBrowser {
    let config = Arc::new(config);
    let context = BrowserContext::new(&config, requested_type, USER);
    let events = Arc::new(RecordingListener::default());
    let browser = FileBrowser::new(
        config.clone(),
        storage.clone(),
        Arc::new(ImageTransformer::new()),
        context,
    )
    .with_listener(events.clone());

    TestBrowser {
        browser,
        storage,
        config,
        events,
    }
}

/// Listener keeping every event name in order.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<BrowserEvent>>,
}

impl RecordingListener {
    pub fn names(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .expect("events lock poisoned")
            .iter()
            .map(|e| e.name())
            .collect()
    }
}

#[async_trait]
impl BrowserEventListener for RecordingListener {
    async fn on_event(&self, event: &BrowserEvent) -> Result<(), String> {
        self.events
            .lock()
            .expect("events lock poisoned")
            .push(event.clone());
        Ok(())
    }
}

/// Listener that always fails.
pub struct FailingListener;

#[async_trait]
impl BrowserEventListener for FailingListener {
    async fn on_event(&self, _event: &BrowserEvent) -> Result<(), String> {
        Err("listener unavailable".to_string())
    }
}
