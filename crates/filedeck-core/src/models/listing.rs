use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the client should render a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Grid,
    List,
}

impl FromStr for DisplayMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grid" => Ok(DisplayMode::Grid),
            "list" => Ok(DisplayMode::List),
            _ => Err(anyhow::anyhow!("Invalid display mode: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Time,
}

impl FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" | "alphabetic" => Ok(SortKey::Name),
            "time" => Ok(SortKey::Time),
            _ => Err(anyhow::anyhow!("Invalid sort key: {}", s)),
        }
    }
}

/// One entry of a folder listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub name: String,
    /// Working directory for folders, public URL for files.
    pub url: String,
    /// Last modification (RFC 3339), files only.
    pub time: Option<String>,
    /// Human readable size, files only.
    pub size: Option<String>,
    pub icon: String,
    pub is_file: bool,
    pub is_image: bool,
    pub mime_type: Option<String>,
    pub thumb_url: Option<String>,
    #[serde(skip)]
    pub modified_unix: i64,
}

/// A root folder and its direct children, used for the folder tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    pub name: String,
    pub url: String,
    pub children: Vec<FolderNode>,
    pub has_next: bool,
}

/// One page of a folder listing: folders first, then files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemListing {
    pub items: Vec<ItemInfo>,
    pub paginator: Paginator,
    pub display: DisplayMode,
    pub working_dir: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginator {
    pub current_page: usize,
    pub total: usize,
    pub per_page: usize,
}

/// Sizes shown by the resize dialog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResizePreview {
    pub original_width: u32,
    pub original_height: u32,
    /// Display width after scaling into the preview box.
    pub width: f64,
    pub height: f64,
    pub ratio: f64,
    pub scaled: bool,
}

const SIZE_UNITS: [&str; 9] = ["B", "kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Format a byte count as `1.46 kB`.
///
/// The unit is chosen from the number of decimal digits (one step per three
/// digits) while the value is divided by powers of 1024.
pub fn human_filesize(bytes: u64) -> String {
    let digits = bytes.to_string().len();
    let factor = ((digits - 1) / 3).min(SIZE_UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(factor as i32);
    format!("{:.2} {}", value, SIZE_UNITS[factor])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_filesize() {
        assert_eq!(human_filesize(0), "0.00 B");
        assert_eq!(human_filesize(999), "999.00 B");
        assert_eq!(human_filesize(1500), "1.46 kB");
        assert_eq!(human_filesize(1_048_576), "1.00 MB");
    }

    #[test]
    fn test_parse_modes() {
        assert_eq!("list".parse::<DisplayMode>().unwrap(), DisplayMode::List);
        assert!("table".parse::<DisplayMode>().is_err());
        assert_eq!("time".parse::<SortKey>().unwrap(), SortKey::Time);
        assert_eq!(SortKey::default(), SortKey::Name);
    }
}
