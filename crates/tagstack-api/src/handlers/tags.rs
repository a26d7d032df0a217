//! Tag HTTP handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tagstack_core::{CreateTagRequest, Tag, TagNode, UpdateTagRequest};

use super::OwnerQuery;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct TagSearchQuery {
    pub name: String,
}

/// A tag together with its nested subtree.
#[derive(Debug, Serialize)]
pub struct TagDetail {
    #[serde(flatten)]
    pub tag: Tag,
    pub children: Vec<TagNode>,
}

pub async fn list_tags(
    State(state): State<AppState>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(state.tags.list(owner.owner()).await?))
}

pub async fn search_tags(
    State(state): State<AppState>,
    Query(owner): Query<OwnerQuery>,
    Query(query): Query<TagSearchQuery>,
) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(
        state.tags.search_by_name(owner.owner(), &query.name).await?,
    ))
}

/// Every tree of the caller's forest, roots ordered by name.
pub async fn tag_tree(
    State(state): State<AppState>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<Vec<TagNode>>, ApiError> {
    Ok(Json(state.tags.forest(owner.owner()).await?.trees()))
}

pub async fn create_tag(
    State(state): State<AppState>,
    Query(owner): Query<OwnerQuery>,
    Json(body): Json<CreateTagRequest>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    let tag = state.tags.create(owner.owner(), body).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// # Returns
/// - 200 OK with the tag and its nested children
/// - 404 Not Found if the caller owns no such tag
pub async fn get_tag(
    State(state): State<AppState>,
    Query(owner): Query<OwnerQuery>,
    Path(id): Path<Uuid>,
) -> Result<Json<TagDetail>, ApiError> {
    let forest = state.tags.forest(owner.owner()).await?;
    let tag = forest
        .get(id)
        .cloned()
        .ok_or_else(|| tagstack_core::Error::tag_missing(id))?;
    let children = forest.subtree(id).map(|mut node| std::mem::take(&mut node.children)).unwrap_or_default();
    Ok(Json(TagDetail { tag, children }))
}

pub async fn tag_children(
    State(state): State<AppState>,
    Query(owner): Query<OwnerQuery>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(state.tags.children(owner.owner(), id).await?))
}

/// Rename and/or reparent. A missing or null `parent_id` moves the tag to
/// the forest root.
///
/// # Returns
/// - 200 OK with the updated tag
/// - 400 Bad Request on self-parenting, an unknown parent, or a cycle
/// - 404 Not Found if the caller owns no such tag
pub async fn update_tag(
    State(state): State<AppState>,
    Query(owner): Query<OwnerQuery>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateTagRequest>,
) -> Result<Json<Tag>, ApiError> {
    Ok(Json(state.tags.update(owner.owner(), id, body).await?))
}

/// Deletes the tag and its whole subtree.
pub async fn delete_tag(
    State(state): State<AppState>,
    Query(owner): Query<OwnerQuery>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.tags.delete(owner.owner(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
