//! Per-request browsing context.

use filedeck_core::{DisplayMode, FileManagerConfig};

/// What one request is looking at: the resolved category, the caller's user
/// slug and, optionally, the working directory and display mode it asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserContext {
    category: String,
    user_slug: String,
    working_dir: Option<String>,
    show_list: Option<DisplayMode>,
}

impl BrowserContext {
    /// Resolve the requested `type` against the configured categories.
    pub fn new(
        config: &FileManagerConfig,
        requested_type: Option<&str>,
        user_slug: impl Into<String>,
    ) -> Self {
        Self {
            category: config.category_key_for(requested_type),
            user_slug: user_slug.into(),
            working_dir: None,
            show_list: None,
        }
    }

    /// Use `working_dir` as the request default. Empty input is ignored.
    pub fn in_working_dir(mut self, working_dir: impl Into<String>) -> Self {
        let working_dir = working_dir.into();
        self.working_dir = if working_dir.is_empty() {
            None
        } else {
            Some(working_dir)
        };
        self
    }

    pub fn with_display(mut self, mode: DisplayMode) -> Self {
        self.show_list = Some(mode);
        self
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn user_slug(&self) -> &str {
        &self.user_slug
    }

    pub fn working_dir(&self) -> Option<&str> {
        self.working_dir.as_deref()
    }

    pub fn display_override(&self) -> Option<DisplayMode> {
        self.show_list
    }
}
