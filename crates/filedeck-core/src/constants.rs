//! Shared constants.

/// Logical path separator. Working directories and URL keys always use it,
/// whatever the backend's native separator is.
pub const DS: char = '/';

/// Category folder name meaning "store directly under the backend root".
pub const NO_SUBFOLDER: &str = ".";

/// Category used when the request does not name a configured one.
pub const DEFAULT_CATEGORY: &str = "file";

pub const DEFAULT_THUMB_FOLDER_NAME: &str = "thumbs";
pub const DEFAULT_SHARED_FOLDER_NAME: &str = "shares";
pub const DEFAULT_THUMB_WIDTH: u32 = 200;
pub const DEFAULT_THUMB_HEIGHT: u32 = 200;
pub const DEFAULT_ITEMS_PER_PAGE: usize = 30;

/// MIME types never thumbnailed: animated or vector formats where a cover crop is wrong.
pub const THUMBNAIL_EXCLUDED_MIME_TYPES: &[&str] = &["image/gif", "image/svg+xml"];

/// Default executable MIME denylist.
pub const DEFAULT_DISALLOWED_MIME_TYPES: &[&str] = &["text/x-php", "text/html", "text/plain"];

/// Mode requested for new directories.
pub const DIRECTORY_MODE: u32 = 0o777;

/// Display size limits used by the resize preview.
pub const RESIZE_PREVIEW_MAX_WIDTH: f64 = 600.0;
pub const RESIZE_PREVIEW_MAX_HEIGHT: f64 = 400.0;
