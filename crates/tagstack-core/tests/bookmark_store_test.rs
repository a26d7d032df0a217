//! Bookmark store behavior against the in-memory backend.

use tagstack_core::memory::InMemoryStore;
use tagstack_core::{
    bookmark_view, bookmark_views, render_bookmark_hierarchy, Bookmark, BookmarkRepository,
    CreateBookmarkRequest, CreateTagRequest, Error, OwnerId, Tag, TagRepository,
    UpdateBookmarkRequest,
};
use uuid::Uuid;

async fn tag(store: &InMemoryStore, owner: OwnerId, name: &str, parent: Option<&Tag>) -> Tag {
    store
        .tags
        .create(
            owner,
            CreateTagRequest {
                name: name.to_string(),
                parent_id: parent.map(|p| p.id),
            },
        )
        .await
        .unwrap()
}

async fn bookmark(
    store: &InMemoryStore,
    owner: OwnerId,
    url: &str,
    title: Option<&str>,
    tags: &[&Tag],
) -> Bookmark {
    store
        .bookmarks
        .create(
            owner,
            CreateBookmarkRequest {
                url: url.to_string(),
                title: title.map(str::to_string),
                description: None,
                tag_ids: Some(tags.iter().map(|t| t.id).collect()),
            },
        )
        .await
        .unwrap()
}

// =============================================================================
// Create / get
// =============================================================================

#[tokio::test]
async fn test_create_and_get_bookmark() {
    let store = InMemoryStore::new();
    let owner = OwnerId::random();
    let news = tag(&store, owner, "news", None).await;

    let created = bookmark(&store, owner, " https://lwn.net ", Some("LWN"), &[&news]).await;
    assert_eq!(created.url, "https://lwn.net");
    assert!(created.tag_ids.contains(&news.id));

    let fetched = store.bookmarks.get(owner, created.id).await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_blank_url_is_rejected() {
    let store = InMemoryStore::new();
    let owner = OwnerId::random();
    for url in ["", "   "] {
        let err = store
            .bookmarks
            .create(
                owner,
                CreateBookmarkRequest {
                    url: url.to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
    assert!(store.bookmarks.list(owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_tag_rejects_whole_create() {
    let store = InMemoryStore::new();
    let owner = OwnerId::random();
    let news = tag(&store, owner, "news", None).await;
    let missing = Uuid::new_v4();

    let err = store
        .bookmarks
        .create(
            owner,
            CreateBookmarkRequest {
                url: "https://example.com".into(),
                tag_ids: Some(vec![news.id, missing]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::TagNotFound(id) if id == missing));
    assert!(store.bookmarks.list(owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_tag_ids_collapse() {
    let store = InMemoryStore::new();
    let owner = OwnerId::random();
    let news = tag(&store, owner, "news", None).await;

    let created = store
        .bookmarks
        .create(
            owner,
            CreateBookmarkRequest {
                url: "https://example.com".into(),
                tag_ids: Some(vec![news.id, news.id]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(created.tag_ids.len(), 1);
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn test_update_without_tags_keeps_associations() {
    let store = InMemoryStore::new();
    let owner = OwnerId::random();
    let news = tag(&store, owner, "news", None).await;
    let created = bookmark(&store, owner, "https://a.example", None, &[&news]).await;

    for tag_ids in [None, Some(vec![])] {
        let updated = store
            .bookmarks
            .update(
                owner,
                created.id,
                UpdateBookmarkRequest {
                    url: "https://b.example".into(),
                    title: Some("B".into()),
                    description: Some("second".into()),
                    tag_ids,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.url, "https://b.example");
        assert_eq!(updated.title.as_deref(), Some("B"));
        assert_eq!(updated.tag_ids, created.tag_ids);
        assert!(updated.updated_at_utc >= created.updated_at_utc);
    }
}

#[tokio::test]
async fn test_update_with_tags_replaces_associations() {
    let store = InMemoryStore::new();
    let owner = OwnerId::random();
    let news = tag(&store, owner, "news", None).await;
    let tech = tag(&store, owner, "tech", None).await;
    let created = bookmark(&store, owner, "https://a.example", None, &[&news]).await;

    let updated = store
        .bookmarks
        .update(
            owner,
            created.id,
            UpdateBookmarkRequest {
                url: created.url.clone(),
                tag_ids: Some(vec![tech.id]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.tag_ids.into_iter().collect::<Vec<_>>(), vec![tech.id]);
}

#[tokio::test]
async fn test_update_with_unknown_tag_changes_nothing() {
    let store = InMemoryStore::new();
    let owner = OwnerId::random();
    let news = tag(&store, owner, "news", None).await;
    let created = bookmark(&store, owner, "https://a.example", Some("A"), &[&news]).await;

    let err = store
        .bookmarks
        .update(
            owner,
            created.id,
            UpdateBookmarkRequest {
                url: "https://changed.example".into(),
                title: Some("changed".into()),
                tag_ids: Some(vec![Uuid::new_v4()]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TagNotFound(_)));

    let unchanged = store.bookmarks.get(owner, created.id).await.unwrap();
    assert_eq!(unchanged, created);
}

#[tokio::test]
async fn test_update_unknown_bookmark_is_not_found() {
    let store = InMemoryStore::new();
    let err = store
        .bookmarks
        .update(
            OwnerId::random(),
            Uuid::new_v4(),
            UpdateBookmarkRequest {
                url: "https://x.example".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_delete_by_id_then_missing() {
    let store = InMemoryStore::new();
    let owner = OwnerId::random();
    let created = bookmark(&store, owner, "https://a.example", None, &[]).await;

    store.bookmarks.delete_by_id(owner, created.id).await.unwrap();
    assert!(matches!(
        store.bookmarks.get(owner, created.id).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        store.bookmarks.delete_by_id(owner, created.id).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_delete_by_url_removes_all_matches_and_tolerates_none() {
    let store = InMemoryStore::new();
    let owner = OwnerId::random();
    bookmark(&store, owner, "https://dup.example", None, &[]).await;
    bookmark(&store, owner, "https://dup.example", None, &[]).await;
    let keep = bookmark(&store, owner, "https://keep.example", None, &[]).await;

    let removed = store
        .bookmarks
        .delete_by_url(owner, "https://dup.example")
        .await
        .unwrap();
    assert_eq!(removed, 2);

    let again = store
        .bookmarks
        .delete_by_url(owner, "https://dup.example")
        .await
        .unwrap();
    assert_eq!(again, 0);

    let left = store.bookmarks.list(owner).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].id, keep.id);
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn test_search_by_title_and_url_part() {
    let store = InMemoryStore::new();
    let owner = OwnerId::random();
    bookmark(&store, owner, "https://doc.rust-lang.org", Some("Rust Docs"), &[]).await;
    bookmark(&store, owner, "https://go.dev", Some("Go"), &[]).await;
    bookmark(&store, owner, "https://example.com/untitled", None, &[]).await;

    let by_title = store.bookmarks.search_by_title(owner, "rust").await.unwrap();
    assert_eq!(by_title.len(), 1);
    assert_eq!(by_title[0].title.as_deref(), Some("Rust Docs"));

    let by_url = store
        .bookmarks
        .search_by_url_part(owner, "GO.DEV")
        .await
        .unwrap();
    assert_eq!(by_url.len(), 1);

    let err = store.bookmarks.search_by_title(owner, "").await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_search_keeps_surrounding_whitespace() {
    let store = InMemoryStore::new();
    let owner = OwnerId::random();
    bookmark(&store, owner, "https://a.example", Some("technews"), &[]).await;
    bookmark(&store, owner, "https://b.example", Some("Tech News"), &[]).await;

    let found = store.bookmarks.search_by_title(owner, " news").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].url, "https://b.example");

    let err = store.bookmarks.search_by_title(owner, "   ").await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_search_by_tag_matches_direct_tags_only() {
    let store = InMemoryStore::new();
    let owner = OwnerId::random();
    let tech = tag(&store, owner, "tech", None).await;
    let rust = tag(&store, owner, "rust", Some(&tech)).await;
    let tagged = bookmark(&store, owner, "https://rust.example", None, &[&rust]).await;

    let found = store.bookmarks.search_by_tag(owner, rust.id).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, tagged.id);

    // Ancestors do not match implicitly.
    assert!(store
        .bookmarks
        .search_by_tag(owner, tech.id)
        .await
        .unwrap()
        .is_empty());

    let err = store
        .bookmarks
        .search_by_tag(owner, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TagNotFound(_)));
}

// =============================================================================
// Hierarchy rendering through the stores
// =============================================================================

#[tokio::test]
async fn test_render_hierarchy_for_untagged_bookmark_is_empty() {
    let store = InMemoryStore::new();
    let owner = OwnerId::random();
    let created = bookmark(&store, owner, "https://plain.example", None, &[]).await;

    let trees = render_bookmark_hierarchy(&store.tags, &store.bookmarks, owner, created.id)
        .await
        .unwrap();
    assert!(trees.is_empty());
}

#[tokio::test]
async fn test_render_hierarchy_merges_ancestor_and_descendant() {
    let store = InMemoryStore::new();
    let owner = OwnerId::random();
    let tech = tag(&store, owner, "tech", None).await;
    let lang = tag(&store, owner, "lang", Some(&tech)).await;
    let rust = tag(&store, owner, "rust", Some(&lang)).await;
    tag(&store, owner, "ops", Some(&tech)).await;
    let news = tag(&store, owner, "news", None).await;

    let created = bookmark(
        &store,
        owner,
        "https://rust.example",
        None,
        &[&lang, &rust, &news],
    )
    .await;

    let view = bookmark_view(&store.tags, &store.bookmarks, owner, created.id)
        .await
        .unwrap();
    let roots: Vec<&str> = view.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(roots, vec!["news", "tech"]);
    assert_eq!(view.tags[1].branch_paths(), vec!["tech/lang/rust"]);
}

#[tokio::test]
async fn test_render_hierarchy_follows_reparent() {
    let store = InMemoryStore::new();
    let owner = OwnerId::random();
    let tech = tag(&store, owner, "tech", None).await;
    let rust = tag(&store, owner, "rust", None).await;
    let created = bookmark(&store, owner, "https://rust.example", None, &[&rust]).await;

    store
        .tags
        .update(
            owner,
            rust.id,
            tagstack_core::UpdateTagRequest {
                name: rust.name.clone(),
                parent_id: Some(tech.id),
            },
        )
        .await
        .unwrap();

    let trees = render_bookmark_hierarchy(&store.tags, &store.bookmarks, owner, created.id)
        .await
        .unwrap();
    assert_eq!(trees.len(), 1);
    assert_eq!(trees[0].branch_paths(), vec!["tech/rust"]);
}

#[tokio::test]
async fn test_bookmark_views_render_each_bookmark() {
    let store = InMemoryStore::new();
    let owner = OwnerId::random();
    let news = tag(&store, owner, "news", None).await;
    bookmark(&store, owner, "https://a.example", None, &[&news]).await;
    bookmark(&store, owner, "https://b.example", None, &[]).await;

    let listed = store.bookmarks.list(owner).await.unwrap();
    let views = bookmark_views(&store.tags, owner, listed).await.unwrap();
    assert_eq!(views.len(), 2);

    let tagged = views
        .iter()
        .find(|v| v.bookmark.url == "https://a.example")
        .unwrap();
    assert_eq!(tagged.tags.len(), 1);
    assert_eq!(tagged.tags[0].id, news.id);

    let plain = views
        .iter()
        .find(|v| v.bookmark.url == "https://b.example")
        .unwrap();
    assert!(plain.tags.is_empty());
}

#[tokio::test]
async fn test_render_hierarchy_for_deep_tag_chain() {
    let store = InMemoryStore::new();
    let owner = OwnerId::random();

    let root = tag(&store, owner, "level0", None).await;
    let mut deepest = root.clone();
    for level in 1..10_000 {
        deepest = tag(&store, owner, &format!("level{}", level), Some(&deepest)).await;
    }
    let saved = bookmark(&store, owner, "https://deep.example", None, &[&deepest]).await;

    let trees = render_bookmark_hierarchy(&store.tags, &store.bookmarks, owner, saved.id)
        .await
        .unwrap();
    assert_eq!(trees.len(), 1);
    assert_eq!(trees[0].id, root.id);
    assert_eq!(trees[0].node_count(), 10_000);

    let subtree = store.tags.subtree(owner, root.id).await.unwrap();
    assert_eq!(subtree.node_count(), 10_000);
}
