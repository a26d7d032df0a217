//! # tagstack-db
//!
//! PostgreSQL storage layer for tagstack.
//!
//! This crate provides:
//! - Connection pool management
//! - [`PgTagRepository`] and [`PgBookmarkRepository`], the durable
//!   implementations of the core repository traits
//! - Embedded schema migrations (feature `migrations`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use tagstack_db::{CreateTagRequest, Database, OwnerId, PoolConfig, TagRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let url = "postgres://localhost/tagstack";
//!     let db = Database::connect_with_config(url, PoolConfig::default()).await?;
//!     let owner = OwnerId::random();
//!
//!     let tag = db.tags.create(owner, CreateTagRequest {
//!         name: "tech".to_string(),
//!         parent_id: None,
//!     }).await?;
//!
//!     println!("Created tag: {}", tag.id);
//!     Ok(())
//! }
//! ```
pub mod bookmarks;
pub mod pool;
pub mod tags;

// Always compiled so integration tests (in tests/) can use the fixtures.
pub mod test_fixtures;

// Re-export core types
pub use tagstack_core::*;

pub use bookmarks::PgBookmarkRepository;
pub use pool::{create_pool_with_config, log_pool_metrics, PoolConfig};
pub use tags::PgTagRepository;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Tag forest repository.
    pub tags: PgTagRepository,
    /// Bookmark repository.
    pub bookmarks: PgBookmarkRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            tags: PgTagRepository::new(pool.clone()),
            bookmarks: PgBookmarkRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
