/// Logical reference to a file or folder.
///
/// Identities are plain values: every builder method returns a new identity
/// and leaves the receiver untouched, so a representation resolved earlier in
/// a request never changes under the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ItemIdentity {
    working_dir: Option<String>,
    name: String,
    is_thumbnail: bool,
}

impl ItemIdentity {
    /// Identity of the request's current working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit working directory (`/alice/sub`). `None` falls back to the
    /// request default, then the root folder.
    pub fn working_dir(&self) -> Option<&str> {
        self.working_dir.as_deref()
    }

    /// Item name, empty when the identity denotes the directory itself.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_thumbnail(&self) -> bool {
        self.is_thumbnail
    }

    pub fn in_directory(&self, working_dir: impl Into<String>) -> Self {
        Self {
            working_dir: Some(working_dir.into()),
            ..self.clone()
        }
    }

    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn without_name(&self) -> Self {
        self.with_name(String::new())
    }

    pub fn as_thumbnail(&self) -> Self {
        Self {
            is_thumbnail: true,
            ..self.clone()
        }
    }

    pub fn as_source(&self) -> Self {
        Self {
            is_thumbnail: false,
            ..self.clone()
        }
    }
}

/// Every representation of one identity, computed eagerly in dependency order:
/// `working_dir_path` then `url_key` then `backend_key` then `absolute_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRepresentation {
    /// Logical forward-slash path (`/alice/thumbs/a.jpg`).
    pub working_dir_path: String,
    /// Category-prefixed key, backend agnostic (`photos/alice/a.jpg`).
    pub url_key: String,
    /// `url_key` in the backend's native separator.
    pub backend_key: String,
    /// Backend root followed by `backend_key`.
    pub absolute_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_return_new_values() {
        let dir = ItemIdentity::new().in_directory("/alice");
        let file = dir.with_name("a.jpg");
        let thumb = file.as_thumbnail();

        assert_eq!(dir.name(), "");
        assert_eq!(file.name(), "a.jpg");
        assert!(!file.is_thumbnail());
        assert!(thumb.is_thumbnail());
        assert_eq!(thumb.working_dir(), Some("/alice"));
        assert_eq!(thumb.as_source(), file);
        assert_eq!(file.without_name(), dir);
    }

    #[test]
    fn test_default_has_no_working_dir() {
        assert_eq!(ItemIdentity::new().working_dir(), None);
    }
}
