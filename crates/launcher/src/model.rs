//! Core data types shared by the loader, the coordinator and the catalog.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Source type used when an `<file>` element carries no `type` attribute.
pub const DEFAULT_MIME_TYPE: &str = "xml";

/// Generation token invalidating stale asynchronous results after a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Epoch(Uuid);

impl Epoch {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for Epoch {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one source to load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportDescriptor {
    pub path: PathBuf,
    pub mime_type: String,
}

impl ImportDescriptor {
    pub fn new(path: impl Into<PathBuf>, mime_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mime_type: mime_type.into(),
        }
    }

    /// A descriptor for an XML source.
    pub fn xml(path: impl Into<PathBuf>) -> Self {
        Self::new(path, DEFAULT_MIME_TYPE)
    }
}

/// 1-based position of an element within its source document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
}

/// An RGB colour parsed from `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    /// Parses `#rrggbb` (case-insensitive hex digits).
    pub fn parse(raw: &str) -> Option<Self> {
        let hex = raw.trim().strip_prefix('#')?;
        if hex.len() != 6 || !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self {
            red: channel(0..2)?,
            green: channel(2..4)?,
            blue: channel(4..6)?,
        })
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

/// Presentation brush of an item or group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Style {
    #[default]
    None,
    Color(Rgb),
}

impl Style {
    pub fn is_none(&self) -> bool {
        matches!(self, Style::None)
    }
}

/// A launchable link. Owned by exactly one [`ItemGroup`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub link: String,
    pub tags: Vec<String>,
    pub style: Style,
    pub position: SourcePosition,
}

impl Item {
    /// Adds a tag unless the item already carries it.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }
}

/// A tagged, styled collection of items; the unit of tag/style inheritance.
///
/// `parent` indexes the enclosing group within the same source's group list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemGroup {
    pub parent: Option<usize>,
    pub tags: Vec<String>,
    pub style: Style,
    pub items: Vec<Item>,
}

/// The result of one successful load.
///
/// `groups[0]` is always the implicit global group holding top-level items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub file: PathBuf,
    pub groups: Vec<ItemGroup>,
    pub imports: Vec<ImportDescriptor>,
}

impl Source {
    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|group| group.items.len()).sum()
    }
}
