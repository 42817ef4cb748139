//! Filedeck Storage Library
//!
//! This crate provides the storage capability consumed by the file browser and
//! its implementations for the local filesystem, S3-compatible object stores
//! and an in-process memory store.
//!
//! # Storage key format
//!
//! Keys are relative to the backend root and written with the backend's native
//! separator ([`Storage::separator`]). A trailing separator is accepted for
//! directories. Keys must not contain a `..` segment or start with a separator.
//! Key checks are centralized in the `keys` module so all backends agree.
//!
//! Hierarchical backends have real directories. Flat backends (S3, memory)
//! simulate them from key prefixes plus explicit marker entries.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-memory")]
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use filedeck_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-memory")]
pub use memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{
    DirectoryOptions, ObjectMetadata, Storage, StorageError, StorageResult, Visibility,
};
