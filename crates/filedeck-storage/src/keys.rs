//! Shared key handling for storage backends.

use crate::traits::{StorageError, StorageResult};

/// Validate a key and strip its trailing separators.
///
/// The empty key denotes the backend root.
pub fn normalize_key(key: &str, separator: char) -> StorageResult<String> {
    if key.starts_with(separator) {
        return Err(StorageError::InvalidKey(format!(
            "Storage key must be relative: {}",
            key
        )));
    }

    if key.split(separator).any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(format!(
            "Storage key contains a parent segment: {}",
            key
        )));
    }

    Ok(key.trim_end_matches(separator).to_string())
}

/// Join a directory key and a child name.
pub fn join_key(dir_key: &str, name: &str, separator: char) -> String {
    if dir_key.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", dir_key, separator, name)
    }
}

/// Prefix that every key strictly below `dir_key` starts with.
pub fn child_prefix(dir_key: &str, separator: char) -> String {
    if dir_key.is_empty() {
        String::new()
    } else {
        format!("{}{}", dir_key, separator)
    }
}

/// Last segment of a key.
pub fn key_name(key: &str, separator: char) -> &str {
    key.rsplit(separator).next().unwrap_or(key)
}

/// Public URL for a key: base URL followed by the percent-encoded segments.
pub fn public_url(base_url: &str, key: &str, separator: char) -> String {
    let encoded: Vec<String> = key
        .split(separator)
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("{}/{}", base_url.trim_end_matches('/'), encoded.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("files/alice/", '/').unwrap(), "files/alice");
        assert_eq!(normalize_key("", '/').unwrap(), "");
        assert_eq!(normalize_key("a..b/c", '/').unwrap(), "a..b/c");
        assert!(matches!(
            normalize_key("files/../etc", '/'),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            normalize_key("/etc/passwd", '/'),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(normalize_key("files\\..\\x", '\\').is_err());
    }

    #[test]
    fn test_join_and_prefix() {
        assert_eq!(join_key("", "a.jpg", '/'), "a.jpg");
        assert_eq!(join_key("files", "a.jpg", '\\'), "files\\a.jpg");
        assert_eq!(child_prefix("", '/'), "");
        assert_eq!(child_prefix("files", '/'), "files/");
        assert_eq!(key_name("files/alice/a.jpg", '/'), "a.jpg");
    }

    #[test]
    fn test_public_url_encodes_segments() {
        assert_eq!(
            public_url("http://localhost/storage/", "photos/alice/my pic.jpg", '/'),
            "http://localhost/storage/photos/alice/my%20pic.jpg"
        );
        assert_eq!(
            public_url("http://h", "a\\b.png", '\\'),
            "http://h/a/b.png"
        );
    }
}
