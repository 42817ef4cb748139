//! Configuration module
//!
//! A [`FileManagerConfig`] is an immutable snapshot built once (usually with
//! [`FileManagerConfig::from_env`]) and handed to every component behind an
//! `Arc`. Nothing in the browser reads the environment after that.

use std::collections::BTreeMap;
use std::env;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CATEGORY, DEFAULT_DISALLOWED_MIME_TYPES, DEFAULT_ITEMS_PER_PAGE,
    DEFAULT_SHARED_FOLDER_NAME, DEFAULT_THUMB_FOLDER_NAME, DEFAULT_THUMB_HEIGHT,
    DEFAULT_THUMB_WIDTH, DS,
};
use crate::models::DisplayMode;
use crate::storage_types::StorageBackend;

const DEFAULT_MAX_SIZE_KB: u64 = 50_000;

/// One configured category ("files", "photos", ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub folder_name: String,
    #[serde(default)]
    pub valid_mime: Vec<String>,
    #[serde(default)]
    pub thumb: bool,
    #[serde(default)]
    pub thumb_width: Option<u32>,
    #[serde(default)]
    pub thumb_height: Option<u32>,
    /// Maximum upload size in kilobytes.
    #[serde(default = "default_max_size")]
    pub max_size: u64,
    #[serde(default)]
    pub startup_view: DisplayMode,
    #[serde(default)]
    pub allow_private_folder: Option<bool>,
    #[serde(default)]
    pub allow_shared_folder: Option<bool>,
}

fn default_max_size() -> u64 {
    DEFAULT_MAX_SIZE_KB
}

/// Root folder flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderType {
    User,
    Share,
}

impl FolderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FolderType::User => "user",
            FolderType::Share => "share",
        }
    }
}

#[derive(Clone, Debug)]
pub struct FileManagerConfig {
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // S3-compatible providers (MinIO, ...)
    pub aws_region: Option<String>,
    // Root folders
    pub allow_private_folder: bool,
    pub allow_shared_folder: bool,
    pub shared_folder_name: String,
    // Thumbnails
    pub thumb_folder_name: String,
    pub should_create_thumbnails: bool,
    pub thumb_img_width: u32,
    pub thumb_img_height: u32,
    // Naming
    pub alphanumeric_filename: bool,
    pub alphanumeric_directory: bool,
    pub rename_file: bool,
    pub rename_duplicates: bool,
    pub over_write_on_duplicate: bool,
    // Upload validation
    pub disallowed_mimetypes: Vec<String>,
    pub disallowed_extensions: Vec<String>,
    pub should_validate_mime: bool,
    pub should_validate_size: bool,
    pub items_per_page: usize,
    pub categories: BTreeMap<String, CategoryConfig>,
}

impl Default for FileManagerConfig {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::Local,
            local_storage_path: None,
            local_storage_base_url: None,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            allow_private_folder: true,
            allow_shared_folder: true,
            shared_folder_name: DEFAULT_SHARED_FOLDER_NAME.to_string(),
            thumb_folder_name: DEFAULT_THUMB_FOLDER_NAME.to_string(),
            should_create_thumbnails: true,
            thumb_img_width: DEFAULT_THUMB_WIDTH,
            thumb_img_height: DEFAULT_THUMB_HEIGHT,
            alphanumeric_filename: false,
            alphanumeric_directory: false,
            rename_file: false,
            rename_duplicates: false,
            over_write_on_duplicate: false,
            disallowed_mimetypes: DEFAULT_DISALLOWED_MIME_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            disallowed_extensions: Vec::new(),
            should_validate_mime: false,
            should_validate_size: false,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            categories: default_categories(),
        }
    }
}

fn default_categories() -> BTreeMap<String, CategoryConfig> {
    let mut categories = BTreeMap::new();
    categories.insert(
        "file".to_string(),
        CategoryConfig {
            folder_name: "files".to_string(),
            valid_mime: vec![
                "image/jpeg".to_string(),
                "image/pjpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
                "application/pdf".to_string(),
            ],
            thumb: true,
            thumb_width: Some(80),
            thumb_height: Some(80),
            max_size: DEFAULT_MAX_SIZE_KB,
            startup_view: DisplayMode::List,
            allow_private_folder: None,
            allow_shared_folder: None,
        },
    );
    categories.insert(
        "image".to_string(),
        CategoryConfig {
            folder_name: "photos".to_string(),
            valid_mime: vec![
                "image/jpeg".to_string(),
                "image/pjpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
            ],
            thumb: true,
            thumb_width: Some(80),
            thumb_height: Some(80),
            max_size: DEFAULT_MAX_SIZE_KB,
            startup_view: DisplayMode::Grid,
            allow_private_folder: None,
            allow_shared_folder: None,
        },
    );
    categories
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or(default)
}

fn env_list(name: &str, default: &str) -> Vec<String> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl FileManagerConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = FileManagerConfig::default();

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse::<StorageBackend>()?,
            Err(_) => StorageBackend::Local,
        };

        let categories = match env::var("FOLDER_CATEGORIES") {
            Ok(json) => Self::parse_categories(&json)?,
            Err(_) => defaults.categories,
        };

        let config = FileManagerConfig {
            storage_backend,
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            allow_private_folder: env_flag("ALLOW_PRIVATE_FOLDER", true),
            allow_shared_folder: env_flag("ALLOW_SHARED_FOLDER", true),
            shared_folder_name: env::var("SHARED_FOLDER_NAME")
                .unwrap_or_else(|_| DEFAULT_SHARED_FOLDER_NAME.to_string()),
            thumb_folder_name: env::var("THUMB_FOLDER_NAME")
                .unwrap_or_else(|_| DEFAULT_THUMB_FOLDER_NAME.to_string()),
            should_create_thumbnails: env_flag("SHOULD_CREATE_THUMBNAILS", true),
            thumb_img_width: env::var("THUMB_IMG_WIDTH")
                .unwrap_or_else(|_| DEFAULT_THUMB_WIDTH.to_string())
                .parse()
                .unwrap_or(DEFAULT_THUMB_WIDTH),
            thumb_img_height: env::var("THUMB_IMG_HEIGHT")
                .unwrap_or_else(|_| DEFAULT_THUMB_HEIGHT.to_string())
                .parse()
                .unwrap_or(DEFAULT_THUMB_HEIGHT),
            alphanumeric_filename: env_flag("ALPHANUMERIC_FILENAME", false),
            alphanumeric_directory: env_flag("ALPHANUMERIC_DIRECTORY", false),
            rename_file: env_flag("RENAME_FILE", false),
            rename_duplicates: env_flag("RENAME_DUPLICATES", false),
            over_write_on_duplicate: env_flag("OVER_WRITE_ON_DUPLICATE", false),
            disallowed_mimetypes: env_list(
                "DISALLOWED_MIMETYPES",
                &DEFAULT_DISALLOWED_MIME_TYPES.join(","),
            ),
            disallowed_extensions: env_list("DISALLOWED_EXTENSIONS", ""),
            should_validate_mime: env_flag("SHOULD_VALIDATE_MIME", false),
            should_validate_size: env_flag("SHOULD_VALIDATE_SIZE", false),
            items_per_page: env::var("ITEMS_PER_PAGE")
                .unwrap_or_else(|_| DEFAULT_ITEMS_PER_PAGE.to_string())
                .parse()
                .unwrap_or(DEFAULT_ITEMS_PER_PAGE),
            categories,
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse the `FOLDER_CATEGORIES` JSON map.
    pub fn parse_categories(json: &str) -> Result<BTreeMap<String, CategoryConfig>, anyhow::Error> {
        let categories: BTreeMap<String, CategoryConfig> = serde_json::from_str(json)
            .map_err(|e| anyhow::anyhow!("FOLDER_CATEGORIES must be a JSON object: {}", e))?;
        Ok(categories)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.categories.is_empty() {
            return Err(anyhow::anyhow!("At least one folder category must be configured"));
        }

        if !self.categories.contains_key(DEFAULT_CATEGORY) {
            return Err(anyhow::anyhow!(
                "The '{}' folder category must be configured",
                DEFAULT_CATEGORY
            ));
        }

        for (key, category) in &self.categories {
            if category.folder_name.trim().is_empty() {
                return Err(anyhow::anyhow!("Category '{}' has an empty folder_name", key));
            }
        }

        if self.thumb_folder_name.is_empty() || self.thumb_folder_name.contains(DS) {
            return Err(anyhow::anyhow!(
                "THUMB_FOLDER_NAME must be a single non-empty path segment"
            ));
        }

        if self.thumb_img_width == 0 || self.thumb_img_height == 0 {
            return Err(anyhow::anyhow!("THUMB_IMG_WIDTH and THUMB_IMG_HEIGHT must be positive"));
        }

        if self.items_per_page == 0 {
            return Err(anyhow::anyhow!("ITEMS_PER_PAGE must be positive"));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
            StorageBackend::Memory => {}
        }

        Ok(())
    }

    /// Resolve a requested `type` input to a configured category key.
    ///
    /// The input is singularised and its first letter lower-cased; anything
    /// that does not name a configured category falls back to `file`.
    pub fn category_key_for(&self, requested: Option<&str>) -> String {
        let requested = requested.unwrap_or("");
        let singular = requested.strip_suffix('s').unwrap_or(requested);
        let mut chars = singular.chars();
        let key = match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect::<String>(),
            None => String::new(),
        };

        if self.categories.contains_key(&key) {
            key
        } else {
            DEFAULT_CATEGORY.to_string()
        }
    }

    pub fn category(&self, key: &str) -> Option<&CategoryConfig> {
        self.categories.get(key)
    }

    /// Category prefix used in URL keys, `files` when the category is unknown.
    pub fn category_folder_name(&self, key: &str) -> &str {
        self.category(key)
            .map(|c| c.folder_name.as_str())
            .unwrap_or("files")
    }

    /// Whether per-user folders are enabled for this category.
    pub fn allow_multi_user(&self, category_key: &str) -> bool {
        self.category(category_key)
            .and_then(|c| c.allow_private_folder)
            .unwrap_or(self.allow_private_folder)
    }

    /// Whether the shared folder is enabled. It can only be turned off while
    /// private folders are on.
    pub fn allow_share_folder(&self, category_key: &str) -> bool {
        if !self.allow_multi_user(category_key) {
            return true;
        }

        self.category(category_key)
            .and_then(|c| c.allow_shared_folder)
            .unwrap_or(self.allow_shared_folder)
    }

    pub fn allow_folder_type(&self, category_key: &str, folder_type: FolderType) -> bool {
        match folder_type {
            FolderType::User => self.allow_multi_user(category_key),
            FolderType::Share => self.allow_share_folder(category_key),
        }
    }

    pub fn default_folder_type(&self, category_key: &str) -> FolderType {
        if self.allow_folder_type(category_key, FolderType::User) {
            FolderType::User
        } else {
            FolderType::Share
        }
    }

    /// Logical root folder (`/<slug>` or `/<shared folder>`).
    pub fn root_folder(&self, folder_type: FolderType, user_slug: &str) -> String {
        let folder = match folder_type {
            FolderType::User => user_slug,
            FolderType::Share => self.shared_folder_name.as_str(),
        };
        format!("{}{}", DS, folder)
    }

    /// Thumbnail dimensions for a category: its own size when it opts into
    /// category thumbnails, else the global size.
    pub fn thumb_dimensions(&self, category_key: &str) -> (u32, u32) {
        match self.category(category_key) {
            Some(category) if category.thumb => (
                category.thumb_width.unwrap_or(self.thumb_img_width),
                category.thumb_height.unwrap_or(self.thumb_img_height),
            ),
            _ => (self.thumb_img_width, self.thumb_img_height),
        }
    }
}
