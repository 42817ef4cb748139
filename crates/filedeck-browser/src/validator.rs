//! Upload validation chain
//!
//! Checks run in the order of [`VALIDATION_CHAIN`] and the first failure
//! stops the chain. Later steps rely on earlier ones: the MIME and extension
//! checks assume the transfer itself succeeded. No step mutates anything.

use std::sync::Arc;

use filedeck_core::{AppError, FileManagerConfig, ItemIdentity, TransferStatus, UploadCandidate};
use regex::Regex;

use crate::error::StorageResultExt;
use crate::path::PathResolver;

const EXECUTABLE_EXTENSIONS: &[&str] = &["php", "html"];
const EXECUTABLE_EXTENSION_PREFIX: &str = "php";
const MARKUP_VARIANT_PATTERN: &str = "[a-z]html";
const NON_ALPHANUMERIC_PATTERN: &str = "[^a-zA-Z0-9]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStep {
    TransferSize,
    TransferStatus,
    DuplicateName,
    ExecutableMimeType,
    ExecutableExtension,
    MimeAllowlist,
    Extension,
    ConfiguredSize,
}

impl ValidationStep {
    /// Steps that only inspect the transfer and never reach storage.
    pub fn is_transfer_step(self) -> bool {
        matches!(self, ValidationStep::TransferSize | ValidationStep::TransferStatus)
    }
}

pub const VALIDATION_CHAIN: [ValidationStep; 8] = [
    ValidationStep::TransferSize,
    ValidationStep::TransferStatus,
    ValidationStep::DuplicateName,
    ValidationStep::ExecutableMimeType,
    ValidationStep::ExecutableExtension,
    ValidationStep::MimeAllowlist,
    ValidationStep::Extension,
    ValidationStep::ConfiguredSize,
];

#[derive(Clone)]
pub struct UploadValidator {
    config: Arc<FileManagerConfig>,
    resolver: PathResolver,
}

impl UploadValidator {
    pub fn new(config: Arc<FileManagerConfig>, resolver: PathResolver) -> Self {
        Self { config, resolver }
    }

    /// Run the whole chain for a candidate about to be stored at `destination`.
    pub async fn validate(
        &self,
        candidate: &UploadCandidate,
        destination: &ItemIdentity,
    ) -> Result<(), AppError> {
        for step in VALIDATION_CHAIN {
            self.run(step, candidate, destination).await?;
        }
        Ok(())
    }

    /// Run only the transfer steps, before a destination name exists.
    pub async fn validate_transfer(&self, candidate: &UploadCandidate) -> Result<(), AppError> {
        let unnamed = ItemIdentity::new();
        for step in VALIDATION_CHAIN.into_iter().filter(|s| s.is_transfer_step()) {
            self.run(step, candidate, &unnamed).await?;
        }
        Ok(())
    }

    async fn run(
        &self,
        step: ValidationStep,
        candidate: &UploadCandidate,
        destination: &ItemIdentity,
    ) -> Result<(), AppError> {
        self.check(step, candidate, destination).await.map_err(|e| {
            tracing::debug!(
                step = ?step,
                name = %candidate.original_name,
                mime_type = %candidate.mime_type,
                error = %e,
                "Upload rejected"
            );
            e
        })
    }

    /// Run a single step.
    pub async fn check(
        &self,
        step: ValidationStep,
        candidate: &UploadCandidate,
        destination: &ItemIdentity,
    ) -> Result<(), AppError> {
        match step {
            ValidationStep::TransferSize => {
                if candidate.transfer_status == TransferStatus::IniSizeExceeded {
                    return Err(AppError::TransferSizeExceeded);
                }
            }
            ValidationStep::TransferStatus => {
                if candidate.transfer_status != TransferStatus::Ok {
                    return Err(AppError::TransferFailed(candidate.transfer_status));
                }
            }
            ValidationStep::DuplicateName => {
                if !self.config.over_write_on_duplicate {
                    let key = self.resolver.backend_key(destination);
                    let exists = self
                        .resolver
                        .storage()
                        .exists(&key)
                        .await
                        .context("exists", &key)?;
                    if exists {
                        return Err(AppError::DuplicateName(destination.name().to_string()));
                    }
                }
            }
            ValidationStep::ExecutableMimeType => {
                if self
                    .config
                    .disallowed_mimetypes
                    .iter()
                    .any(|mime| mime == &candidate.mime_type)
                {
                    return Err(AppError::ExecutableMimeType(candidate.mime_type.clone()));
                }
            }
            ValidationStep::ExecutableExtension => {
                if is_executable_extension(&candidate.extension)? {
                    return Err(AppError::ExecutableExtension(candidate.extension.clone()));
                }
            }
            ValidationStep::MimeAllowlist => {
                if self.config.should_validate_mime {
                    let allowed = self
                        .config
                        .category(self.resolver.context().category())
                        .map(|c| c.valid_mime.iter().any(|m| m == &candidate.mime_type))
                        .unwrap_or(false);
                    if !allowed {
                        return Err(AppError::InvalidMimeType(candidate.mime_type.clone()));
                    }
                }
            }
            ValidationStep::Extension => {
                let extension = &candidate.extension;
                let denied = self
                    .config
                    .disallowed_extensions
                    .iter()
                    .any(|e| e.eq_ignore_ascii_case(extension));
                if denied || compile(NON_ALPHANUMERIC_PATTERN)?.is_match(extension) {
                    return Err(AppError::InvalidExtension(extension.clone()));
                }
            }
            ValidationStep::ConfiguredSize => {
                if self.config.should_validate_size {
                    let size_kb = candidate.size_bytes as f64 / 1000.0;
                    let max_kb = self
                        .config
                        .category(self.resolver.context().category())
                        .map(|c| c.max_size)
                        .unwrap_or(0);
                    if size_kb > max_kb as f64 {
                        return Err(AppError::SizeExceedsConfiguredMaximum { size_kb, max_kb });
                    }
                }
            }
        }
        Ok(())
    }
}

fn compile(pattern: &str) -> Result<Regex, AppError> {
    Regex::new(pattern)
        .map_err(|e| AppError::Internal(format!("Invalid validation pattern {}: {}", pattern, e)))
}

/// `php`/`html` exactly, anything starting with `php`, or a letter directly
/// followed by `html` anywhere in the lower-cased extension.
pub fn is_executable_extension(extension: &str) -> Result<bool, AppError> {
    let extension = extension.to_lowercase();
    Ok(EXECUTABLE_EXTENSIONS.contains(&extension.as_str())
        || extension.starts_with(EXECUTABLE_EXTENSION_PREFIX)
        || compile(MARKUP_VARIANT_PATTERN)?.is_match(&extension))
}
