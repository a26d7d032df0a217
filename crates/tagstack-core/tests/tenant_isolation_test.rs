//! Owner isolation: identical data under two owners never crosses over.

use tagstack_core::memory::InMemoryStore;
use tagstack_core::{
    render_bookmark_hierarchy, BookmarkRepository, CreateBookmarkRequest, CreateTagRequest,
    Error, OwnerId, TagRepository, UpdateBookmarkRequest, UpdateTagRequest,
};
use uuid::Uuid;

#[tokio::test]
async fn test_same_tag_name_under_two_owners() {
    let store = InMemoryStore::new();
    let alice = OwnerId::random();
    let bob = OwnerId::random();

    let a_news = store
        .tags
        .create(
            alice,
            CreateTagRequest {
                name: "news".into(),
                parent_id: None,
            },
        )
        .await
        .unwrap();
    let b_news = store
        .tags
        .create(
            bob,
            CreateTagRequest {
                name: "news".into(),
                parent_id: None,
            },
        )
        .await
        .unwrap();
    assert_ne!(a_news.id, b_news.id);

    let alice_tags = store.tags.list(alice).await.unwrap();
    assert_eq!(alice_tags.len(), 1);
    assert_eq!(alice_tags[0].id, a_news.id);

    let found = store.tags.search_by_name(bob, "news").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, b_news.id);
}

#[tokio::test]
async fn test_foreign_records_look_absent() {
    let store = InMemoryStore::new();
    let alice = OwnerId::random();
    let bob = OwnerId::random();

    let a_tag = store
        .tags
        .create(
            alice,
            CreateTagRequest {
                name: "private".into(),
                parent_id: None,
            },
        )
        .await
        .unwrap();
    let a_bookmark = store
        .bookmarks
        .create(
            alice,
            CreateBookmarkRequest {
                url: "https://alice.example".into(),
                tag_ids: Some(vec![a_tag.id]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // Reads report foreign records exactly like missing ones.
    assert!(matches!(
        store.tags.get(bob, a_tag.id).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        store.bookmarks.get(bob, a_bookmark.id).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        render_bookmark_hierarchy(&store.tags, &store.bookmarks, bob, a_bookmark.id).await,
        Err(Error::NotFound(_))
    ));
    assert!(store.bookmarks.list(bob).await.unwrap().is_empty());

    // Bob cannot attach, parent onto, or search by Alice's tag.
    let err = store
        .bookmarks
        .create(
            bob,
            CreateBookmarkRequest {
                url: "https://bob.example".into(),
                tag_ids: Some(vec![a_tag.id]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TagNotFound(id) if id == a_tag.id));

    let err = store
        .tags
        .create(
            bob,
            CreateTagRequest {
                name: "child".into(),
                parent_id: Some(a_tag.id),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidParent(_)));

    assert!(matches!(
        store.bookmarks.search_by_tag(bob, a_tag.id).await,
        Err(Error::TagNotFound(_))
    ));
}

#[tokio::test]
async fn test_foreign_mutations_are_rejected_and_leave_data_intact() {
    let store = InMemoryStore::new();
    let alice = OwnerId::random();
    let bob = OwnerId::random();

    let a_tag = store
        .tags
        .create(
            alice,
            CreateTagRequest {
                name: "keep".into(),
                parent_id: None,
            },
        )
        .await
        .unwrap();
    let a_bookmark = store
        .bookmarks
        .create(
            alice,
            CreateBookmarkRequest {
                url: "https://shared.example".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(matches!(
        store
            .tags
            .update(
                bob,
                a_tag.id,
                UpdateTagRequest {
                    name: "stolen".into(),
                    parent_id: None,
                },
            )
            .await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        store.tags.delete(bob, a_tag.id).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        store
            .bookmarks
            .update(
                bob,
                a_bookmark.id,
                UpdateBookmarkRequest {
                    url: "https://stolen.example".into(),
                    ..Default::default()
                },
            )
            .await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        store.bookmarks.delete_by_id(bob, a_bookmark.id).await,
        Err(Error::NotFound(_))
    ));

    // Same url under Bob's scope deletes nothing of Alice's.
    let removed = store
        .bookmarks
        .delete_by_url(bob, "https://shared.example")
        .await
        .unwrap();
    assert_eq!(removed, 0);

    assert_eq!(store.tags.get(alice, a_tag.id).await.unwrap().name, "keep");
    assert_eq!(
        store.bookmarks.get(alice, a_bookmark.id).await.unwrap().url,
        "https://shared.example"
    );
}

#[tokio::test]
async fn test_missing_owner_is_rejected_everywhere() {
    let store = InMemoryStore::new();
    let nobody = OwnerId::new(Uuid::nil());

    assert!(matches!(
        store.tags.list(nobody).await,
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        store.bookmarks.list(nobody).await,
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        store
            .bookmarks
            .delete_by_url(nobody, "https://x.example")
            .await,
        Err(Error::InvalidInput(_))
    ));
}
