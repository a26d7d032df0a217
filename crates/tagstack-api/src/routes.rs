//! Router assembly.

use axum::{routing::get, Router};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::handlers::{bookmarks, health_check, tags};
use crate::AppState;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Tags
        .route("/api/v1/tags", get(tags::list_tags).post(tags::create_tag))
        .route("/api/v1/tags/search", get(tags::search_tags))
        .route("/api/v1/tags/tree", get(tags::tag_tree))
        .route(
            "/api/v1/tags/:id",
            get(tags::get_tag)
                .put(tags::update_tag)
                .delete(tags::delete_tag),
        )
        .route("/api/v1/tags/:id/children", get(tags::tag_children))
        // Bookmarks
        .route(
            "/api/v1/bookmarks",
            get(bookmarks::list_bookmarks)
                .post(bookmarks::create_bookmark)
                .delete(bookmarks::delete_bookmarks_by_url),
        )
        .route(
            "/api/v1/bookmarks/search/title",
            get(bookmarks::search_by_title),
        )
        .route(
            "/api/v1/bookmarks/search/url",
            get(bookmarks::search_by_url_part),
        )
        .route(
            "/api/v1/bookmarks/search/tag/:tag_id",
            get(bookmarks::search_by_tag),
        )
        .route(
            "/api/v1/bookmarks/:id",
            get(bookmarks::get_bookmark)
                .put(bookmarks::update_bookmark)
                .delete(bookmarks::delete_bookmark),
        )
        .route(
            "/api/v1/bookmarks/:id/hierarchy",
            get(bookmarks::bookmark_hierarchy),
        )
        // Middleware
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .with_state(state)
}
