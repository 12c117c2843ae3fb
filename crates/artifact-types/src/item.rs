//! Provider-independent item model
//!
//! An [`ArtifactItem`] describes one transferable unit. Paths are
//! provider-relative and normalized to forward slashes at construction, so
//! `"dir\\b.txt"`, `"./dir/b.txt"` and `"/dir/b.txt"` all name the same item.

use std::collections::BTreeMap;
use std::fmt;

/// Provider-specific extras attached to an item (content hash, final URL, ...)
pub type ItemMetadata = BTreeMap<String, String>;

/// Metadata key a destination uses to report where an item ended up
pub const DESTINATION_URL_KEY: &str = "destinationUrl";

/// Kind of transferable unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemType {
    /// Regular file with content
    File,
    /// Folder; carries no content
    Folder,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::File => write!(f, "File"),
            ItemType::Folder => write!(f, "Folder"),
        }
    }
}

/// A single file or folder produced by a source listing
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArtifactItem {
    #[cfg_attr(feature = "serde", serde(deserialize_with = "deserialize_path"))]
    path: String,
    item_type: ItemType,
    size: u64,
    /// Open string map of provider-specific extras
    pub metadata: ItemMetadata,
}

impl ArtifactItem {
    /// Create a file item
    pub fn file<P: AsRef<str>>(path: P, size: u64) -> Self {
        Self {
            path: normalize_path(path.as_ref()),
            item_type: ItemType::File,
            size,
            metadata: ItemMetadata::new(),
        }
    }

    /// Create a folder item (size is always 0)
    pub fn folder<P: AsRef<str>>(path: P) -> Self {
        Self {
            path: normalize_path(path.as_ref()),
            item_type: ItemType::Folder,
            size: 0,
            metadata: ItemMetadata::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Normalized provider-relative path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Item type
    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// Listed size in bytes (0 for folders)
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Check if this item is a file
    pub fn is_file(&self) -> bool {
        self.item_type == ItemType::File
    }

    /// Check if this item is a folder
    pub fn is_folder(&self) -> bool {
        self.item_type == ItemType::Folder
    }

    /// Last path segment
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Path of the containing folder, `None` for top-level items
    pub fn parent(&self) -> Option<&str> {
        self.path.rfind('/').map(|idx| &self.path[..idx])
    }

    /// Paths of every containing folder, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = &str> {
        let path = self.path.as_str();
        path.match_indices('/').rev().map(move |(idx, _)| &path[..idx])
    }
}

impl fmt::Display for ArtifactItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.item_type {
            ItemType::File => write!(f, "{} ({} bytes)", self.path, self.size),
            ItemType::Folder => write!(f, "{}/", self.path),
        }
    }
}

/// Normalize a provider-relative path to forward-slash form without leading
/// or trailing separators and without empty or `.` segments.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(feature = "serde")]
fn deserialize_path<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let path = <String as serde::Deserialize>::deserialize(deserializer)?;
    Ok(normalize_path(&path))
}
