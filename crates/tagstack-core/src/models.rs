//! Core data models for tagstack.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

// =============================================================================
// OWNER
// =============================================================================

/// Identifier of the tenant every tag and bookmark is scoped to.
///
/// Supplied by the transport/auth layer; the core never authenticates, it
/// only filters by the identifier it is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(Uuid);

impl OwnerId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a fresh owner id (tests, fixtures).
    pub fn random() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Reject the nil UUID, which stands in for a missing owner.
    pub fn require(self) -> Result<Self> {
        if self.0.is_nil() {
            return Err(Error::InvalidInput("owner id is required".to_string()));
        }
        Ok(self)
    }
}

impl From<Uuid> for OwnerId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// TAGS
// =============================================================================

/// A named category in an owner's tag forest.
///
/// The parent is a weak reference by id; children are derived from the
/// parent links (see [`crate::TagForest`]) and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub owner_id: OwnerId,
    /// Lowercase, trimmed name
    pub name: String,
    /// Parent tag ID (None = forest root)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    pub created_at_utc: DateTime<Utc>,
}

impl Tag {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Request for creating a tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

/// Request for renaming and/or reparenting a tag.
///
/// `parent_id: None` detaches the tag to the forest root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTagRequest {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

/// A node in a rendered tag tree.
///
/// Used both for full subtrees and for the pruned path trees attached to a
/// bookmark. Children are ordered by name, then id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagNode {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub children: Vec<TagNode>,
}

impl TagNode {
    pub fn leaf(tag: &Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name.clone(),
            children: Vec::new(),
        }
    }

    /// Number of nodes in this tree, including the root.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Names along each root-to-leaf branch, e.g. `["tech/rust/async"]`.
    pub fn branch_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack = vec![(self, self.name.clone())];
        while let Some((node, prefix)) = stack.pop() {
            if node.children.is_empty() {
                out.push(prefix);
                continue;
            }
            for child in node.children.iter().rev() {
                stack.push((child, format!("{}/{}", prefix, child.name)));
            }
        }
        out
    }
}

// Deep chains would otherwise drop one stack frame per level.
impl Drop for TagNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

/// Pruned tree from a root tag down to the tags attached to one bookmark.
pub type PathTree = TagNode;

// =============================================================================
// BOOKMARKS
// =============================================================================

/// A saved URL owned by one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
    /// Tags directly attached to this bookmark
    #[serde(default)]
    pub tag_ids: BTreeSet<Uuid>,
}

impl Bookmark {
    pub fn is_tagged(&self) -> bool {
        !self.tag_ids.is_empty()
    }
}

/// Request for creating a bookmark.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateBookmarkRequest {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Request for updating a bookmark.
///
/// A non-empty `tag_ids` replaces the association set; an absent or empty
/// one leaves the existing associations untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBookmarkRequest {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tag_ids: Option<Vec<Uuid>>,
}

impl UpdateBookmarkRequest {
    /// Tag ids that should replace the current set, if any.
    pub fn replacement_tags(&self) -> Option<&[Uuid]> {
        match self.tag_ids.as_deref() {
            Some(ids) if !ids.is_empty() => Some(ids),
            _ => None,
        }
    }
}

/// A bookmark together with its rendered tag hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkView {
    #[serde(flatten)]
    pub bookmark: Bookmark,
    pub tags: Vec<PathTree>,
}
