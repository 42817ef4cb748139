//! UTF-8 safe path-info splitting.
//!
//! Splitting a bare file name whose first character is multi-byte must not
//! corrupt that character, so every segment is padded with a throwaway ASCII
//! sentinel before the split and the sentinel is stripped afterwards.

use crate::constants::DS;

const SENTINEL: char = 'a';

/// Part of a path returned by [`utf8_pathinfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPart {
    /// Last segment, extension included (`photo.jpg`).
    Basename,
    /// Last segment without its extension (`photo`).
    Filename,
    /// Text after the last dot of the last segment (`jpg`), empty when absent.
    Extension,
}

/// Split `path` and return the requested part.
pub fn utf8_pathinfo(path: &str, part: PathPart) -> String {
    let padded = if path.contains(DS) {
        path.replace(DS, &format!("{}{}", DS, SENTINEL))
    } else {
        format!("{}{}", SENTINEL, path)
    };

    let (basename, filename, extension) = split_padded(&padded);

    match part {
        PathPart::Basename => strip_sentinel(basename),
        PathPart::Filename => strip_sentinel(filename),
        // The sentinel sits in front of the segment, never inside the extension.
        PathPart::Extension => extension.to_string(),
    }
}

fn split_padded(padded: &str) -> (&str, &str, &str) {
    let basename = padded.rsplit(DS).next().unwrap_or(padded);
    match basename.rfind('.') {
        Some(idx) => (basename, &basename[..idx], &basename[idx + 1..]),
        None => (basename, basename, ""),
    }
}

fn strip_sentinel(value: &str) -> String {
    value.strip_prefix(SENTINEL).unwrap_or(value).to_string()
}
