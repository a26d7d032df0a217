//! Core traits for tagstack storage.
//!
//! These traits define the interfaces that concrete stores must satisfy,
//! enabling pluggable backends (PostgreSQL, in-memory) and testability.
//!
//! Every method takes the caller's [`OwnerId`] explicitly. Implementations
//! must reject a missing owner, filter every read by owner, and finish all
//! ownership checks before their first write.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::forest::TagForest;
use crate::models::*;

// =============================================================================
// TAG REPOSITORY TRAITS
// =============================================================================

/// Repository for an owner's tag forest.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Create a tag, optionally under an existing parent of the same owner.
    ///
    /// Fails with `InvalidParent` if the parent is absent or foreign.
    async fn create(&self, owner: OwnerId, req: CreateTagRequest) -> Result<Tag>;

    /// Fetch one tag.
    async fn get(&self, owner: OwnerId, id: Uuid) -> Result<Tag>;

    /// List every tag of the owner, ordered by name.
    async fn list(&self, owner: OwnerId) -> Result<Vec<Tag>>;

    /// Case-insensitive substring search over tag names.
    async fn search_by_name(&self, owner: OwnerId, fragment: &str) -> Result<Vec<Tag>>;

    /// Rename and reparent a tag in one step.
    ///
    /// Fails with `NotFound`, `SelfParent`, `InvalidParent` or
    /// `HierarchyCycle`; nothing is written on failure.
    async fn update(&self, owner: OwnerId, id: Uuid, req: UpdateTagRequest) -> Result<Tag>;

    /// Delete a tag together with its whole subtree.
    ///
    /// Bookmark associations of the removed tags go with them. Returns the
    /// number of tags removed.
    async fn delete(&self, owner: OwnerId, id: Uuid) -> Result<u64>;

    /// Snapshot of the owner's forest.
    async fn forest(&self, owner: OwnerId) -> Result<TagForest> {
        Ok(TagForest::new(self.list(owner).await?))
    }

    /// Direct children of a tag.
    async fn children(&self, owner: OwnerId, id: Uuid) -> Result<Vec<Tag>> {
        let forest = self.forest(owner).await?;
        if !forest.contains(id) {
            return Err(Error::tag_missing(id));
        }
        Ok(forest.children_of(id).cloned().collect())
    }

    /// Full nested subtree under a tag.
    async fn subtree(&self, owner: OwnerId, id: Uuid) -> Result<TagNode> {
        self.forest(owner)
            .await?
            .subtree(id)
            .ok_or_else(|| Error::tag_missing(id))
    }
}

// =============================================================================
// BOOKMARK REPOSITORY TRAITS
// =============================================================================

/// Repository for bookmarks and their tag associations.
#[async_trait]
pub trait BookmarkRepository: Send + Sync {
    /// Create a bookmark with an optional initial tag set.
    ///
    /// Fails with `InvalidInput` on a blank url and `TagNotFound` if any tag
    /// is not owned by `owner`; nothing is persisted on failure.
    async fn create(&self, owner: OwnerId, req: CreateBookmarkRequest) -> Result<Bookmark>;

    /// Fetch one bookmark.
    async fn get(&self, owner: OwnerId, id: Uuid) -> Result<Bookmark>;

    /// List every bookmark of the owner, newest first.
    async fn list(&self, owner: OwnerId) -> Result<Vec<Bookmark>>;

    /// Case-insensitive substring search over titles.
    async fn search_by_title(&self, owner: OwnerId, fragment: &str) -> Result<Vec<Bookmark>>;

    /// Case-insensitive substring search over urls.
    async fn search_by_url_part(&self, owner: OwnerId, fragment: &str) -> Result<Vec<Bookmark>>;

    /// Bookmarks directly carrying a tag.
    ///
    /// Fails with `TagNotFound` if the tag is not owned by `owner`.
    async fn search_by_tag(&self, owner: OwnerId, tag_id: Uuid) -> Result<Vec<Bookmark>>;

    /// Update fields; a non-empty `tag_ids` replaces the associations.
    async fn update(
        &self,
        owner: OwnerId,
        id: Uuid,
        req: UpdateBookmarkRequest,
    ) -> Result<Bookmark>;

    /// Delete by id. Fails with `NotFound` if absent.
    async fn delete_by_id(&self, owner: OwnerId, id: Uuid) -> Result<()>;

    /// Delete every bookmark with exactly this url.
    ///
    /// Succeeds when nothing matches; returns the number removed.
    async fn delete_by_url(&self, owner: OwnerId, url: &str) -> Result<u64>;
}
