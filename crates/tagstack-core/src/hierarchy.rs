//! Bookmark tag hierarchy rendering.
//!
//! A bookmark stores a flat set of directly-attached tags. For display, each
//! attached tag is shown in context: one pruned tree per distinct forest
//! root, holding only the branches that lead from that root down to the
//! attached tags. Sibling subtrees off those branches and everything below
//! the deepest attached tag are dropped.
//!
//! When several attached tags share a root, their branches are merged into a
//! single tree for that root. A bookmark tagged with both `tech/lang` and
//! `tech/lang/rust` therefore renders as one tree `tech → lang → rust`.

use std::collections::{HashMap, HashSet};

use tracing::{trace, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::forest::TagForest;
use crate::models::{Bookmark, BookmarkView, OwnerId, PathTree};
use crate::traits::{BookmarkRepository, TagRepository};

/// Turns attached tag sets into pruned path trees against one forest snapshot.
pub struct HierarchyViewBuilder<'a> {
    forest: &'a TagForest,
}

impl<'a> HierarchyViewBuilder<'a> {
    pub fn new(forest: &'a TagForest) -> Self {
        Self { forest }
    }

    /// Render the path trees for a set of directly-attached tag ids.
    ///
    /// Duplicate ids are ignored. Ids not present in the forest are skipped
    /// with a warning. Trees are ordered by root name, then id.
    pub fn render<I>(&self, attached: I) -> Vec<PathTree>
    where
        I: IntoIterator<Item = Uuid>,
    {
        // root id -> every tag on a branch from that root to an attached tag
        let mut branches: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
        let mut seen = HashSet::new();

        for target in attached {
            if !seen.insert(target) {
                continue;
            }
            let Some(path) = self.forest.path_from_root(target) else {
                warn!(
                    subsystem = "hierarchy",
                    component = "view_builder",
                    tag_id = %target,
                    "Attached tag is not reachable in the owner's forest; skipping"
                );
                continue;
            };
            let Some(root) = path.first().copied() else {
                continue;
            };
            trace!(
                subsystem = "hierarchy",
                component = "view_builder",
                tag_id = %target,
                root_id = %root,
                depth = path.len(),
                "Resolved attached tag"
            );
            branches.entry(root).or_default().extend(path);
        }

        let mut trees: Vec<PathTree> = branches
            .iter()
            .filter_map(|(root, keep)| {
                self.forest
                    .assemble(*root, &|id| keep.contains(&id), &mut HashSet::new())
            })
            .collect();
        trees.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        trees
    }

    /// Pair a bookmark with its rendered hierarchy.
    pub fn view(&self, bookmark: Bookmark) -> BookmarkView {
        let tags = self.render(bookmark.tag_ids.iter().copied());
        BookmarkView { bookmark, tags }
    }
}

/// Render the path trees for one bookmark (RenderHierarchy).
///
/// Fails with `NotFound` if the bookmark is absent or owned by someone else.
pub async fn render_bookmark_hierarchy<T, B>(
    tags: &T,
    bookmarks: &B,
    owner: OwnerId,
    bookmark_id: Uuid,
) -> Result<Vec<PathTree>>
where
    T: TagRepository + ?Sized,
    B: BookmarkRepository + ?Sized,
{
    Ok(bookmark_view(tags, bookmarks, owner, bookmark_id).await?.tags)
}

/// Fetch one bookmark together with its rendered hierarchy.
pub async fn bookmark_view<T, B>(
    tags: &T,
    bookmarks: &B,
    owner: OwnerId,
    bookmark_id: Uuid,
) -> Result<BookmarkView>
where
    T: TagRepository + ?Sized,
    B: BookmarkRepository + ?Sized,
{
    let bookmark = bookmarks.get(owner, bookmark_id).await?;
    let forest = tags.forest(owner).await?;
    Ok(HierarchyViewBuilder::new(&forest).view(bookmark))
}

/// Render many bookmarks of one owner against a single forest snapshot.
pub async fn bookmark_views<T>(
    tags: &T,
    owner: OwnerId,
    bookmarks: Vec<Bookmark>,
) -> Result<Vec<BookmarkView>>
where
    T: TagRepository + ?Sized,
{
    if bookmarks.iter().all(|b| !b.is_tagged()) {
        return Ok(bookmarks
            .into_iter()
            .map(|bookmark| BookmarkView {
                bookmark,
                tags: Vec::new(),
            })
            .collect());
    }
    let forest = tags.forest(owner).await?;
    let builder = HierarchyViewBuilder::new(&forest);
    Ok(bookmarks.into_iter().map(|b| builder.view(b)).collect())
}
