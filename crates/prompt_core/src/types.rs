//! Prompt Library Types
//!
//! Defines the core data structures for the library:
//! - Folder / Prompt: the two item kinds held by a forest
//! - VersionRecord: an archived snapshot of superseded prompt content
//! - ItemRecord / ItemNode: flat and nested views used for storage and rendering

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{require_non_empty, CoreResult};

/// Unique identifier for a folder or prompt
pub type ItemId = String;

/// Identifier of the user owning a forest
pub type UserId = String;

/// Literal used for the top level of a forest, both on the wire and in CLI input
pub const ROOT_SENTINEL: &str = "root";

/// Location of an item: the top level, or inside a folder
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum ParentRef {
    #[default]
    Root,
    Folder(ItemId),
}

impl ParentRef {
    pub fn folder(id: impl Into<String>) -> Self {
        Self::Folder(id.into())
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }

    pub fn folder_id(&self) -> Option<&str> {
        match self {
            Self::Root => None,
            Self::Folder(id) => Some(id),
        }
    }
}

impl From<String> for ParentRef {
    fn from(value: String) -> Self {
        if value == ROOT_SENTINEL || value.is_empty() {
            Self::Root
        } else {
            Self::Folder(value)
        }
    }
}

impl From<&str> for ParentRef {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ParentRef> for String {
    fn from(value: ParentRef) -> Self {
        match value {
            ParentRef::Root => ROOT_SENTINEL.to_string(),
            ParentRef::Folder(id) => id,
        }
    }
}

impl std::fmt::Display for ParentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Root => f.write_str(ROOT_SENTINEL),
            Self::Folder(id) => f.write_str(id),
        }
    }
}

/// Immutable snapshot of content that was superseded by an edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// The number the content held before it was replaced
    pub version_number: u32,

    pub content: String,

    /// When the content was superseded
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub parent_id: ParentRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Create a folder with a fresh id
    pub fn new(name: impl Into<String>, parent_id: ParentRef) -> CoreResult<Self> {
        let name = name.into();
        require_non_empty("Folder name", &name)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name,
            parent_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Use a caller-chosen id instead of a generated one
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub parent_id: ParentRef,

    /// Current text
    pub content: String,

    /// Starts at 1 and grows by one per content-changing edit
    pub version_number: u32,

    /// Archived versions, newest first
    #[serde(default)]
    pub history: Vec<VersionRecord>,

    #[serde(default)]
    pub is_favorite: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prompt {
    /// Create a prompt at version 1 with a fresh id
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
        parent_id: ParentRef,
    ) -> CoreResult<Self> {
        let name = name.into();
        let content = content.into();
        require_non_empty("Prompt name", &name)?;
        require_non_empty("Prompt content", &content)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name,
            parent_id,
            content,
            version_number: 1,
            history: Vec::new(),
            is_favorite: false,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = is_favorite;
        self
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Check `version_number == 1 + history.len()` with history numbered
    /// `version_number - 1` down to 1
    pub fn is_consistent(&self) -> bool {
        if self.version_number as usize != self.history.len() + 1 {
            return false;
        }
        self.history
            .iter()
            .zip((1..self.version_number).rev())
            .all(|(record, expected)| record.version_number == expected)
    }
}

/// A node of the forest: either a folder or a prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Item {
    Folder(Folder),
    Prompt(Prompt),
}

impl Item {
    pub fn id(&self) -> &str {
        match self {
            Self::Folder(folder) => &folder.id,
            Self::Prompt(prompt) => &prompt.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Folder(folder) => &folder.name,
            Self::Prompt(prompt) => &prompt.name,
        }
    }

    pub fn parent_id(&self) -> &ParentRef {
        match self {
            Self::Folder(folder) => &folder.parent_id,
            Self::Prompt(prompt) => &prompt.parent_id,
        }
    }

    pub(crate) fn set_parent_id(&mut self, parent_id: ParentRef) {
        match self {
            Self::Folder(folder) => folder.parent_id = parent_id,
            Self::Prompt(prompt) => prompt.parent_id = parent_id,
        }
    }

    pub(crate) fn set_name(&mut self, name: String) {
        match self {
            Self::Folder(folder) => {
                folder.name = name;
                folder.touch();
            }
            Self::Prompt(prompt) => {
                prompt.name = name;
                prompt.touch();
            }
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder(_))
    }

    pub fn as_prompt(&self) -> Option<&Prompt> {
        match self {
            Self::Prompt(prompt) => Some(prompt),
            Self::Folder(_) => None,
        }
    }

}

impl From<Folder> for Item {
    fn from(folder: Folder) -> Self {
        Self::Folder(folder)
    }
}

impl From<Prompt> for Item {
    fn from(prompt: Prompt) -> Self {
        Self::Prompt(prompt)
    }
}

/// Flat, per-user row used by persistence layers
///
/// A sequence of records in pre-order reconstructs the forest: children are
/// joined to folders by `parent_id` and keep the order they appear in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub user_id: UserId,
    pub item: Item,
}

/// Nested view of a forest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemNode {
    Folder {
        folder: Folder,
        #[serde(default)]
        children: Vec<ItemNode>,
    },
    Prompt(Prompt),
}

impl ItemNode {
    pub fn id(&self) -> &str {
        match self {
            Self::Folder { folder, .. } => &folder.id,
            Self::Prompt(prompt) => &prompt.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Folder { folder, .. } => &folder.name,
            Self::Prompt(prompt) => &prompt.name,
        }
    }

    /// Number of prompts in this node and everything below it
    pub fn prompt_count(&self) -> usize {
        match self {
            Self::Prompt(_) => 1,
            Self::Folder { children, .. } => children.iter().map(ItemNode::prompt_count).sum(),
        }
    }
}
