//! Conversion of collaborator failures into [`AppError`].

use filedeck_core::AppError;
use filedeck_storage::{StorageError, StorageResult};

/// Attach operation and key context to a backend result.
///
/// A missing object becomes [`AppError::NotFound`]; every other backend
/// failure becomes [`AppError::Storage`] and is never retried.
pub trait StorageResultExt<T> {
    fn context(self, operation: &str, key: &str) -> Result<T, AppError>;
}

impl<T> StorageResultExt<T> for StorageResult<T> {
    fn context(self, operation: &str, key: &str) -> Result<T, AppError> {
        self.map_err(|err| match err {
            StorageError::NotFound(missing) => AppError::NotFound(missing),
            other => {
                tracing::error!(
                    operation = %operation,
                    key = %key,
                    error = %other,
                    "Storage operation failed"
                );
                AppError::Storage {
                    operation: operation.to_string(),
                    key: key.to_string(),
                    message: other.to_string(),
                }
            }
        })
    }
}

pub(crate) fn codec_error(err: anyhow::Error) -> AppError {
    AppError::ImageProcessing(err.to_string())
}
