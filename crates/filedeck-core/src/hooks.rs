//! Hooks for event dispatch
//!
//! The browser announces what it is about to do and what it has done through
//! [`BrowserEventListener`]. Dispatch itself (queues, notifications, audit
//! logs) lives outside this workspace; the default listener does nothing.

use async_trait::async_trait;

/// Lifecycle events. Every path is the backend absolute path of the item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserEvent {
    FileUploading { path: String },
    FileUploaded { path: String },
    ImageUploaded { path: String },
    FolderCreating { path: String },
    FolderCreated { path: String },
    Renaming { old_path: String, new_path: String },
    Renamed { old_path: String, new_path: String },
    Deleting { path: String },
    Deleted { path: String },
    ImageCropping { path: String },
    ImageCropped { path: String },
    ImageResizing { path: String },
    ImageResized { path: String },
    Moved { old_path: String, new_path: String },
}

impl BrowserEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BrowserEvent::FileUploading { .. } => "file_uploading",
            BrowserEvent::FileUploaded { .. } => "file_uploaded",
            BrowserEvent::ImageUploaded { .. } => "image_uploaded",
            BrowserEvent::FolderCreating { .. } => "folder_creating",
            BrowserEvent::FolderCreated { .. } => "folder_created",
            BrowserEvent::Renaming { .. } => "renaming",
            BrowserEvent::Renamed { .. } => "renamed",
            BrowserEvent::Deleting { .. } => "deleting",
            BrowserEvent::Deleted { .. } => "deleted",
            BrowserEvent::ImageCropping { .. } => "image_cropping",
            BrowserEvent::ImageCropped { .. } => "image_cropped",
            BrowserEvent::ImageResizing { .. } => "image_resizing",
            BrowserEvent::ImageResized { .. } => "image_resized",
            BrowserEvent::Moved { .. } => "moved",
        }
    }
}

/// Receiver for browser lifecycle events
///
/// Errors are reported back as strings; the browser logs them and carries on.
#[async_trait]
pub trait BrowserEventListener: Send + Sync {
    async fn on_event(&self, event: &BrowserEvent) -> Result<(), String>;
}

/// No-op implementation for when nobody listens
pub struct NoOpEventListener;

#[async_trait]
impl BrowserEventListener for NoOpEventListener {
    async fn on_event(&self, _event: &BrowserEvent) -> Result<(), String> {
        Ok(())
    }
}
