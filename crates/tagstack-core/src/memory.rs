//! In-memory store for tests and database-free embedding.
//!
//! Implements [`TagRepository`] and [`BookmarkRepository`] over one shared
//! state. Each operation takes the state lock once, validates everything,
//! and only then mutates, so multi-record writes are all-or-nothing and
//! readers never observe a half-applied change.
//!
//! ## Usage
//!
//! ```rust
//! use tagstack_core::memory::InMemoryStore;
//! use tagstack_core::{CreateTagRequest, OwnerId, TagRepository};
//!
//! # tokio_test_block_on(async {
//! let store = InMemoryStore::new();
//! let owner = OwnerId::random();
//! let tag = store
//!     .tags
//!     .create(owner, CreateTagRequest { name: "News".into(), parent_id: None })
//!     .await
//!     .unwrap();
//! assert_eq!(tag.name, "news");
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::forest::TagForest;
use crate::models::*;
use crate::traits::{BookmarkRepository, TagRepository};
use crate::validation::{
    contains_ignore_case, dedupe_ids, normalize_tag_name, require_fragment, require_url,
};

#[derive(Debug, Default)]
struct MemoryState {
    tags: HashMap<Uuid, Tag>,
    bookmarks: HashMap<Uuid, Bookmark>,
}

impl MemoryState {
    fn owned_tag(&self, owner: OwnerId, id: Uuid) -> Option<&Tag> {
        self.tags.get(&id).filter(|t| t.owner_id == owner)
    }

    fn owned_bookmark(&self, owner: OwnerId, id: Uuid) -> Option<&Bookmark> {
        self.bookmarks.get(&id).filter(|b| b.owner_id == owner)
    }

    fn owner_forest(&self, owner: OwnerId) -> TagForest {
        TagForest::new(
            self.tags
                .values()
                .filter(|t| t.owner_id == owner)
                .cloned(),
        )
    }

    /// Resolve a requested tag set, failing on the first id the owner lacks.
    fn owned_tag_set(&self, owner: OwnerId, ids: &[Uuid]) -> Result<BTreeSet<Uuid>> {
        dedupe_ids(ids)
            .into_iter()
            .map(|id| match self.owned_tag(owner, id) {
                Some(_) => Ok(id),
                None => Err(Error::TagNotFound(id)),
            })
            .collect()
    }

    fn bookmarks_where<F>(&self, owner: OwnerId, pred: F) -> Vec<Bookmark>
    where
        F: Fn(&Bookmark) -> bool,
    {
        let mut found: Vec<Bookmark> = self
            .bookmarks
            .values()
            .filter(|b| b.owner_id == owner && pred(b))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.created_at_utc
                .cmp(&a.created_at_utc)
                .then(b.id.cmp(&a.id))
        });
        found
    }

    fn tags_where<F>(&self, owner: OwnerId, pred: F) -> Vec<Tag>
    where
        F: Fn(&Tag) -> bool,
    {
        let mut found: Vec<Tag> = self
            .tags
            .values()
            .filter(|t| t.owner_id == owner && pred(t))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        found
    }
}

/// Tag and bookmark repositories sharing one in-memory state.
#[derive(Clone)]
pub struct InMemoryStore {
    pub tags: MemoryTagRepository,
    pub bookmarks: MemoryBookmarkRepository,
}

impl InMemoryStore {
    pub fn new() -> Self {
        let state = Arc::new(RwLock::new(MemoryState::default()));
        Self {
            tags: MemoryTagRepository {
                state: state.clone(),
            },
            bookmarks: MemoryBookmarkRepository { state },
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory implementation of TagRepository.
#[derive(Clone)]
pub struct MemoryTagRepository {
    state: Arc<RwLock<MemoryState>>,
}

/// In-memory implementation of BookmarkRepository.
#[derive(Clone)]
pub struct MemoryBookmarkRepository {
    state: Arc<RwLock<MemoryState>>,
}

#[async_trait]
impl TagRepository for MemoryTagRepository {
    async fn create(&self, owner: OwnerId, req: CreateTagRequest) -> Result<Tag> {
        let owner = owner.require()?;
        let name = normalize_tag_name(&req.name)?;

        let mut state = self.state.write().await;
        if let Some(parent_id) = req.parent_id {
            if state.owned_tag(owner, parent_id).is_none() {
                debug!(
                    subsystem = "memory",
                    component = "tags",
                    op = "create",
                    owner_id = %owner,
                    parent_id = %parent_id,
                    "Rejected tag with unknown parent"
                );
                return Err(Error::InvalidParent(parent_id));
            }
        }

        let tag = Tag {
            id: Uuid::now_v7(),
            owner_id: owner,
            name,
            parent_id: req.parent_id,
            created_at_utc: Utc::now(),
        };
        state.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn get(&self, owner: OwnerId, id: Uuid) -> Result<Tag> {
        let owner = owner.require()?;
        let state = self.state.read().await;
        state
            .owned_tag(owner, id)
            .cloned()
            .ok_or_else(|| Error::tag_missing(id))
    }

    async fn list(&self, owner: OwnerId) -> Result<Vec<Tag>> {
        let owner = owner.require()?;
        Ok(self.state.read().await.tags_where(owner, |_| true))
    }

    async fn search_by_name(&self, owner: OwnerId, fragment: &str) -> Result<Vec<Tag>> {
        let owner = owner.require()?;
        let fragment = require_fragment("name", fragment)?;
        Ok(self
            .state
            .read()
            .await
            .tags_where(owner, |t| contains_ignore_case(&t.name, fragment)))
    }

    async fn update(&self, owner: OwnerId, id: Uuid, req: UpdateTagRequest) -> Result<Tag> {
        let owner = owner.require()?;
        let name = normalize_tag_name(&req.name)?;

        let mut state = self.state.write().await;
        if state.owned_tag(owner, id).is_none() {
            return Err(Error::tag_missing(id));
        }
        state.owner_forest(owner).validate_reparent(id, req.parent_id)?;

        let tag = state
            .tags
            .get_mut(&id)
            .ok_or_else(|| Error::tag_missing(id))?;
        tag.name = name;
        tag.parent_id = req.parent_id;
        Ok(tag.clone())
    }

    async fn delete(&self, owner: OwnerId, id: Uuid) -> Result<u64> {
        let owner = owner.require()?;

        let mut state = self.state.write().await;
        if state.owned_tag(owner, id).is_none() {
            return Err(Error::tag_missing(id));
        }

        let mut removed: HashSet<Uuid> = HashSet::from([id]);
        removed.extend(state.owner_forest(owner).descendants(id));

        state.tags.retain(|tag_id, _| !removed.contains(tag_id));
        for bookmark in state.bookmarks.values_mut() {
            if bookmark.owner_id == owner {
                bookmark.tag_ids.retain(|tag_id| !removed.contains(tag_id));
            }
        }

        info!(
            subsystem = "memory",
            component = "tags",
            op = "delete",
            owner_id = %owner,
            tag_id = %id,
            deleted_count = removed.len(),
            "Deleted tag subtree"
        );
        Ok(removed.len() as u64)
    }
}

#[async_trait]
impl BookmarkRepository for MemoryBookmarkRepository {
    async fn create(&self, owner: OwnerId, req: CreateBookmarkRequest) -> Result<Bookmark> {
        let owner = owner.require()?;
        let url = require_url(&req.url)?;

        let mut state = self.state.write().await;
        let tag_ids = state.owned_tag_set(owner, req.tag_ids.as_deref().unwrap_or_default())?;

        let now = Utc::now();
        let bookmark = Bookmark {
            id: Uuid::now_v7(),
            owner_id: owner,
            url,
            title: req.title,
            description: req.description,
            created_at_utc: now,
            updated_at_utc: now,
            tag_ids,
        };
        state.bookmarks.insert(bookmark.id, bookmark.clone());
        Ok(bookmark)
    }

    async fn get(&self, owner: OwnerId, id: Uuid) -> Result<Bookmark> {
        let owner = owner.require()?;
        let state = self.state.read().await;
        state
            .owned_bookmark(owner, id)
            .cloned()
            .ok_or_else(|| Error::bookmark_missing(id))
    }

    async fn list(&self, owner: OwnerId) -> Result<Vec<Bookmark>> {
        let owner = owner.require()?;
        Ok(self.state.read().await.bookmarks_where(owner, |_| true))
    }

    async fn search_by_title(&self, owner: OwnerId, fragment: &str) -> Result<Vec<Bookmark>> {
        let owner = owner.require()?;
        let fragment = require_fragment("title", fragment)?;
        Ok(self.state.read().await.bookmarks_where(owner, |b| {
            b.title
                .as_deref()
                .is_some_and(|title| contains_ignore_case(title, fragment))
        }))
    }

    async fn search_by_url_part(&self, owner: OwnerId, fragment: &str) -> Result<Vec<Bookmark>> {
        let owner = owner.require()?;
        let fragment = require_fragment("url part", fragment)?;
        Ok(self
            .state
            .read()
            .await
            .bookmarks_where(owner, |b| contains_ignore_case(&b.url, fragment)))
    }

    async fn search_by_tag(&self, owner: OwnerId, tag_id: Uuid) -> Result<Vec<Bookmark>> {
        let owner = owner.require()?;
        let state = self.state.read().await;
        if state.owned_tag(owner, tag_id).is_none() {
            return Err(Error::TagNotFound(tag_id));
        }
        Ok(state.bookmarks_where(owner, |b| b.tag_ids.contains(&tag_id)))
    }

    async fn update(
        &self,
        owner: OwnerId,
        id: Uuid,
        req: UpdateBookmarkRequest,
    ) -> Result<Bookmark> {
        let owner = owner.require()?;
        let url = require_url(&req.url)?;

        let mut state = self.state.write().await;
        if state.owned_bookmark(owner, id).is_none() {
            return Err(Error::bookmark_missing(id));
        }
        let replacement = req
            .replacement_tags()
            .map(|ids| state.owned_tag_set(owner, ids))
            .transpose()?;

        let bookmark = state
            .bookmarks
            .get_mut(&id)
            .ok_or_else(|| Error::bookmark_missing(id))?;
        bookmark.url = url;
        bookmark.title = req.title;
        bookmark.description = req.description;
        bookmark.updated_at_utc = Utc::now();
        if let Some(tag_ids) = replacement {
            bookmark.tag_ids = tag_ids;
        }
        Ok(bookmark.clone())
    }

    async fn delete_by_id(&self, owner: OwnerId, id: Uuid) -> Result<()> {
        let owner = owner.require()?;
        let mut state = self.state.write().await;
        if state.owned_bookmark(owner, id).is_none() {
            return Err(Error::bookmark_missing(id));
        }
        state.bookmarks.remove(&id);
        Ok(())
    }

    async fn delete_by_url(&self, owner: OwnerId, url: &str) -> Result<u64> {
        let owner = owner.require()?;
        let url = require_url(url)?;

        let mut state = self.state.write().await;
        let before = state.bookmarks.len();
        state
            .bookmarks
            .retain(|_, b| !(b.owner_id == owner && b.url == url));
        let removed = (before - state.bookmarks.len()) as u64;

        debug!(
            subsystem = "memory",
            component = "bookmarks",
            op = "delete_by_url",
            owner_id = %owner,
            deleted_count = removed,
            "Deleted bookmarks by url"
        );
        Ok(removed)
    }
}
