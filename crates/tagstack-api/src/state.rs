//! Shared handler state.

use std::sync::Arc;

use sqlx::PgPool;

use tagstack_core::memory::InMemoryStore;
use tagstack_core::{BookmarkRepository, TagRepository};
use tagstack_db::Database;

/// Repositories every handler works against.
///
/// Both are trait objects so the same router serves PostgreSQL and the
/// in-memory store.
#[derive(Clone)]
pub struct AppState {
    pub tags: Arc<dyn TagRepository>,
    pub bookmarks: Arc<dyn BookmarkRepository>,
    /// Connection pool, when backed by PostgreSQL.
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn from_database(db: Database) -> Self {
        Self {
            tags: Arc::new(db.tags),
            bookmarks: Arc::new(db.bookmarks),
            pool: Some(db.pool),
        }
    }

    pub fn in_memory() -> Self {
        let store = InMemoryStore::new();
        Self {
            tags: Arc::new(store.tags),
            bookmarks: Arc::new(store.bookmarks),
            pool: None,
        }
    }
}
