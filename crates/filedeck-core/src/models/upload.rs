use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::pathinfo::{utf8_pathinfo, PathPart};

/// Outcome of the raw transfer, reported by whoever received the upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Ok,
    /// Platform-level upload ceiling exceeded before the payload arrived.
    IniSizeExceeded,
    FormSizeExceeded,
    Partial,
    NoFile,
    NoTmpDir,
    CantWrite,
    /// Interrupted by a server-side extension or filter.
    Extension,
}

impl Display for TransferStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let text = match self {
            TransferStatus::Ok => "ok",
            TransferStatus::IniSizeExceeded => "upload size limit exceeded",
            TransferStatus::FormSizeExceeded => "form size limit exceeded",
            TransferStatus::Partial => "partially uploaded",
            TransferStatus::NoFile => "no file was uploaded",
            TransferStatus::NoTmpDir => "missing temporary folder",
            TransferStatus::CantWrite => "failed to write to disk",
            TransferStatus::Extension => "stopped by an extension",
        };
        write!(f, "{}", text)
    }
}

/// An incoming file as seen by the validation chain.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadCandidate {
    pub original_name: String,
    pub extension: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub transfer_status: TransferStatus,
}

impl UploadCandidate {
    /// Build a candidate from the client-supplied name. The extension is
    /// taken from the name through the UTF-8 safe path-info split.
    pub fn new(original_name: impl Into<String>, mime_type: impl Into<String>, size_bytes: u64) -> Self {
        let original_name = original_name.into();
        let extension = utf8_pathinfo(&original_name, PathPart::Extension);
        Self {
            original_name,
            extension,
            mime_type: mime_type.into(),
            size_bytes,
            transfer_status: TransferStatus::Ok,
        }
    }

    pub fn with_transfer_status(mut self, status: TransferStatus) -> Self {
        self.transfer_status = status;
        self
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_extension_from_name() {
        let candidate = UploadCandidate::new("holiday/Страна.JPG", "image/jpeg", 10);
        assert_eq!(candidate.extension, "JPG");
        assert_eq!(candidate.transfer_status, TransferStatus::Ok);
        assert!(candidate.is_image());

        let bare = UploadCandidate::new("Makefile", "text/x-makefile", 1);
        assert_eq!(bare.extension, "");
        assert!(!bare.is_image());
    }
}
