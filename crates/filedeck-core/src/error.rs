//! Error types module
//!
//! Every failure a file browser operation can report is an [`AppError`]. Each
//! variant is a distinct, user-addressable kind: callers key their messages on
//! [`ErrorMetadata::error_code`] and never collapse validation failures into a
//! generic error.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::models::TransferStatus;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "DUPLICATE_NAME")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// What kind of item a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    File,
    Folder,
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ItemKind::File => write!(f, "file"),
            ItemKind::Folder => write!(f, "folder"),
        }
    }
}

/// Why a name was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidNameReason {
    Empty,
    NotAlphanumeric,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("File exceeds the platform upload size limit")]
    TransferSizeExceeded,

    #[error("File failed to upload: {0}")]
    TransferFailed(TransferStatus),

    #[error("A file named {0} already exists")]
    DuplicateName(String),

    #[error("Executable MIME type rejected: {0}")]
    ExecutableMimeType(String),

    #[error("Executable extension rejected: {0}")]
    ExecutableExtension(String),

    #[error("MIME type not allowed: {0}")]
    InvalidMimeType(String),

    #[error("Extension not allowed: {0}")]
    InvalidExtension(String),

    #[error("File size {size_kb} kB exceeds the configured maximum of {max_kb} kB")]
    SizeExceedsConfiguredMaximum { size_kb: f64, max_kb: u64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Directory is not empty: {0}")]
    DirectoryNotEmpty(String),

    #[error("Invalid {kind} name {name:?}: {reason:?}")]
    InvalidName {
        kind: ItemKind,
        name: String,
        reason: InvalidNameReason,
    },

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Cannot move {0} into itself")]
    InvalidMoveTarget(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Storage {operation} failed for {key:?}: {message}")]
    Storage {
        operation: String,
        key: String,
        message: String,
    },

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Static metadata for each variant: (http_status, error_code, recoverable, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        AppError::TransferSizeExceeded => (413, "TRANSFER_SIZE_EXCEEDED", false, LogLevel::Debug),
        AppError::TransferFailed(_) => (400, "TRANSFER_FAILED", true, LogLevel::Warn),
        AppError::DuplicateName(_) => (409, "DUPLICATE_NAME", false, LogLevel::Debug),
        AppError::ExecutableMimeType(_) => (415, "EXECUTABLE_MIME_TYPE", false, LogLevel::Warn),
        AppError::ExecutableExtension(_) => (415, "EXECUTABLE_EXTENSION", false, LogLevel::Warn),
        AppError::InvalidMimeType(_) => (415, "INVALID_MIME_TYPE", false, LogLevel::Debug),
        AppError::InvalidExtension(_) => (415, "INVALID_EXTENSION", false, LogLevel::Debug),
        AppError::SizeExceedsConfiguredMaximum { .. } => {
            (413, "SIZE_EXCEEDS_CONFIGURED_MAXIMUM", false, LogLevel::Debug)
        }
        AppError::NotFound(_) => (404, "NOT_FOUND", false, LogLevel::Debug),
        AppError::DirectoryNotEmpty(_) => (409, "DIRECTORY_NOT_EMPTY", false, LogLevel::Debug),
        AppError::InvalidName { .. } => (400, "INVALID_NAME", false, LogLevel::Debug),
        AppError::AlreadyExists(_) => (409, "ALREADY_EXISTS", false, LogLevel::Debug),
        AppError::InvalidMoveTarget(_) => (409, "INVALID_MOVE_TARGET", false, LogLevel::Debug),
        AppError::UploadFailed(_) => (500, "UPLOAD_FAILED", true, LogLevel::Error),
        AppError::Storage { .. } => (500, "STORAGE_ERROR", true, LogLevel::Error),
        AppError::ImageProcessing(_) => (400, "IMAGE_PROCESSING_ERROR", false, LogLevel::Warn),
        AppError::Internal(_) => (500, "INTERNAL_ERROR", true, LogLevel::Error),
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::TransferSizeExceeded => {
                "File size exceeds the server's upload limit".to_string()
            }
            AppError::TransferFailed(status) => format!("File failed to upload ({})", status),
            AppError::DuplicateName(_) => "A file with this name already exists".to_string(),
            AppError::ExecutableMimeType(_) | AppError::ExecutableExtension(_) => {
                "Executable files are not allowed".to_string()
            }
            AppError::InvalidMimeType(mime) => format!("Unexpected MIME type: {}", mime),
            AppError::InvalidExtension(_) => "Invalid file extension".to_string(),
            AppError::SizeExceedsConfiguredMaximum { size_kb, max_kb } => format!(
                "File size ({:.0} kB) exceeds the maximum of {} kB",
                size_kb, max_kb
            ),
            AppError::NotFound(name) => format!("{} was not found", name),
            AppError::DirectoryNotEmpty(_) => {
                "You cannot delete a folder that is not empty".to_string()
            }
            AppError::InvalidName { kind, reason, .. } => match reason {
                InvalidNameReason::Empty => format!("The {} name cannot be empty", kind),
                InvalidNameReason::NotAlphanumeric => {
                    format!("Only alphanumeric {} names are allowed", kind)
                }
            },
            AppError::AlreadyExists(name) => format!("{} already exists", name),
            AppError::InvalidMoveTarget(name) => {
                format!("{} cannot be moved into itself or one of its folders", name)
            }
            AppError::UploadFailed(_) => "The file could not be stored".to_string(),
            AppError::Storage { .. } => "Failed to access storage".to_string(),
            AppError::ImageProcessing(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}
