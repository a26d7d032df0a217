//! Bookmark HTTP handlers.
//!
//! Bookmark responses embed the rendered tag hierarchy (`tags`) next to the
//! flat `tag_ids`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use tagstack_core::{
    bookmark_view, bookmark_views, render_bookmark_hierarchy, Bookmark, BookmarkView,
    CreateBookmarkRequest, OwnerId, PathTree, UpdateBookmarkRequest,
};

use super::OwnerQuery;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct TitleQuery {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct UrlPartQuery {
    pub url_part: String,
}

#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    pub url: String,
}

async fn render(
    state: &AppState,
    owner: OwnerId,
    bookmarks: Vec<Bookmark>,
) -> Result<Vec<BookmarkView>, ApiError> {
    Ok(bookmark_views(state.tags.as_ref(), owner, bookmarks).await?)
}

async fn render_one(
    state: &AppState,
    owner: OwnerId,
    bookmark: Bookmark,
) -> Result<BookmarkView, ApiError> {
    let id = bookmark.id;
    render(state, owner, vec![bookmark])
        .await?
        .pop()
        .ok_or_else(|| ApiError::from(tagstack_core::Error::bookmark_missing(id)))
}

pub async fn list_bookmarks(
    State(state): State<AppState>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<Vec<BookmarkView>>, ApiError> {
    let owner = owner.owner();
    let found = state.bookmarks.list(owner).await?;
    Ok(Json(render(&state, owner, found).await?))
}

pub async fn search_by_title(
    State(state): State<AppState>,
    Query(owner): Query<OwnerQuery>,
    Query(query): Query<TitleQuery>,
) -> Result<Json<Vec<BookmarkView>>, ApiError> {
    let owner = owner.owner();
    let found = state.bookmarks.search_by_title(owner, &query.title).await?;
    Ok(Json(render(&state, owner, found).await?))
}

pub async fn search_by_url_part(
    State(state): State<AppState>,
    Query(owner): Query<OwnerQuery>,
    Query(query): Query<UrlPartQuery>,
) -> Result<Json<Vec<BookmarkView>>, ApiError> {
    let owner = owner.owner();
    let found = state
        .bookmarks
        .search_by_url_part(owner, &query.url_part)
        .await?;
    Ok(Json(render(&state, owner, found).await?))
}

pub async fn search_by_tag(
    State(state): State<AppState>,
    Query(owner): Query<OwnerQuery>,
    Path(tag_id): Path<Uuid>,
) -> Result<Json<Vec<BookmarkView>>, ApiError> {
    let owner = owner.owner();
    let found = state.bookmarks.search_by_tag(owner, tag_id).await?;
    Ok(Json(render(&state, owner, found).await?))
}

/// # Returns
/// - 201 Created with the bookmark and its rendered hierarchy
/// - 400 Bad Request on a blank url or a tag the caller does not own
pub async fn create_bookmark(
    State(state): State<AppState>,
    Query(owner): Query<OwnerQuery>,
    Json(body): Json<CreateBookmarkRequest>,
) -> Result<(StatusCode, Json<BookmarkView>), ApiError> {
    let owner = owner.owner();
    let created = state.bookmarks.create(owner, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(render_one(&state, owner, created).await?),
    ))
}

pub async fn get_bookmark(
    State(state): State<AppState>,
    Query(owner): Query<OwnerQuery>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookmarkView>, ApiError> {
    let view = bookmark_view(
        state.tags.as_ref(),
        state.bookmarks.as_ref(),
        owner.owner(),
        id,
    )
    .await?;
    Ok(Json(view))
}

/// Path trees for one bookmark, without the bookmark fields.
pub async fn bookmark_hierarchy(
    State(state): State<AppState>,
    Query(owner): Query<OwnerQuery>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PathTree>>, ApiError> {
    let trees = render_bookmark_hierarchy(
        state.tags.as_ref(),
        state.bookmarks.as_ref(),
        owner.owner(),
        id,
    )
    .await?;
    Ok(Json(trees))
}

/// Replace url, title and description. A non-empty `tag_ids` replaces the
/// tag set; an absent or empty one keeps the current tags.
pub async fn update_bookmark(
    State(state): State<AppState>,
    Query(owner): Query<OwnerQuery>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateBookmarkRequest>,
) -> Result<Json<BookmarkView>, ApiError> {
    let owner = owner.owner();
    let updated = state.bookmarks.update(owner, id, body).await?;
    Ok(Json(render_one(&state, owner, updated).await?))
}

pub async fn delete_bookmark(
    State(state): State<AppState>,
    Query(owner): Query<OwnerQuery>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.bookmarks.delete_by_id(owner.owner(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Succeeds even when no bookmark has the url.
pub async fn delete_bookmarks_by_url(
    State(state): State<AppState>,
    Query(owner): Query<OwnerQuery>,
    Query(query): Query<UrlQuery>,
) -> Result<StatusCode, ApiError> {
    state.bookmarks.delete_by_url(owner.owner(), &query.url).await?;
    Ok(StatusCode::NO_CONTENT)
}
