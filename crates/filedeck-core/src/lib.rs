//! Filedeck Core Library
//!
//! This crate provides the configuration snapshot, error taxonomy, and the
//! value types (item identities, upload candidates, listing entries) shared by
//! every Filedeck component.

pub mod config;
pub mod constants;
pub mod error;
pub mod hooks;
pub mod models;
pub mod pathinfo;
pub mod storage_types;

// Re-export commonly used types
pub use config::{CategoryConfig, FileManagerConfig, FolderType};
pub use error::{AppError, ErrorMetadata, InvalidNameReason, ItemKind, LogLevel};
pub use hooks::{BrowserEvent, BrowserEventListener, NoOpEventListener};
pub use models::{
    human_filesize, DisplayMode, FolderNode, ItemIdentity, ItemInfo, ItemListing, Paginator,
    PathRepresentation, ResizePreview, SortKey, TransferStatus, UploadCandidate,
};
pub use pathinfo::{utf8_pathinfo, PathPart};
pub use storage_types::StorageBackend;
