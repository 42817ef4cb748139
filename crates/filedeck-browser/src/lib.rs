//! File browser core
//!
//! Turns logical item references into backend keys, infers directories from
//! parent listings, allocates collision-free names, gates uploads through an
//! ordered validation chain and keeps the shadow thumbnail folder in step with
//! its sources. [`FileBrowser`] ties the pieces into user-facing operations.

pub mod context;
pub mod directory;
pub mod error;
pub mod naming;
pub mod path;
pub mod service;
pub mod thumbnail;
pub mod validator;

pub use context::BrowserContext;
pub use directory::DirectoryClassifier;
pub use error::StorageResultExt;
pub use naming::NameAllocator;
pub use path::PathResolver;
pub use service::FileBrowser;
pub use thumbnail::ThumbnailCoordinator;
pub use validator::{UploadValidator, ValidationStep, VALIDATION_CHAIN};
