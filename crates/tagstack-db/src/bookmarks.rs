//! Bookmark repository implementation.

use std::collections::BTreeSet;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Executor, Pool, Postgres, Row, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use tagstack_core::validation::dedupe_ids;
use tagstack_core::{
    require_fragment, require_url, Bookmark, BookmarkRepository, CreateBookmarkRequest, Error,
    OwnerId, Result, UpdateBookmarkRequest,
};

use crate::escape_like;

/// Bookmark columns plus the aggregated direct tag set. Callers append a
/// WHERE clause over `b`, then [`BOOKMARK_GROUP`].
const BOOKMARK_SELECT: &str = r#"
    SELECT
        b.id, b.owner_id, b.url, b.title, b.description,
        b.created_at_utc, b.updated_at_utc,
        COALESCE(
            ARRAY_AGG(bt.tag_id ORDER BY bt.tag_id) FILTER (WHERE bt.tag_id IS NOT NULL),
            '{}'
        ) AS tag_ids
    FROM bookmark b
    LEFT JOIN bookmark_tag bt ON bt.bookmark_id = b.id
"#;

const BOOKMARK_GROUP: &str = "GROUP BY b.id ORDER BY b.created_at_utc DESC, b.id DESC";

fn map_bookmark(row: &PgRow) -> Bookmark {
    let tag_ids: Vec<Uuid> = row.get("tag_ids");
    Bookmark {
        id: row.get("id"),
        owner_id: OwnerId::new(row.get("owner_id")),
        url: row.get("url"),
        title: row.get("title"),
        description: row.get("description"),
        created_at_utc: row.get("created_at_utc"),
        updated_at_utc: row.get("updated_at_utc"),
        tag_ids: tag_ids.into_iter().collect(),
    }
}

async fn fetch_bookmark<'e, E>(executor: E, owner: OwnerId, id: Uuid) -> Result<Option<Bookmark>>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query(&format!(
        "{} WHERE b.owner_id = $1 AND b.id = $2 {}",
        BOOKMARK_SELECT, BOOKMARK_GROUP
    ))
    .bind(owner.as_uuid())
    .bind(id)
    .fetch_optional(executor)
    .await
    .map_err(Error::Database)?;

    Ok(row.as_ref().map(map_bookmark))
}

/// Lock the requested tags for the rest of `tx` and return them as a set.
///
/// Fails with `TagNotFound` naming the first requested id the owner lacks.
async fn lock_owned_tags(
    tx: &mut Transaction<'_, Postgres>,
    owner: OwnerId,
    ids: &[Uuid],
) -> Result<BTreeSet<Uuid>> {
    let requested = dedupe_ids(ids);
    if requested.is_empty() {
        return Ok(BTreeSet::new());
    }

    let found: BTreeSet<Uuid> =
        sqlx::query("SELECT id FROM tag WHERE owner_id = $1 AND id = ANY($2) FOR SHARE")
            .bind(owner.as_uuid())
            .bind(&requested)
            .fetch_all(&mut **tx)
            .await
            .map_err(Error::Database)?
            .iter()
            .map(|row| row.get::<Uuid, _>("id"))
            .collect();

    match requested.iter().find(|id| !found.contains(id)) {
        Some(missing) => Err(Error::TagNotFound(*missing)),
        None => Ok(found),
    }
}

async fn insert_associations(
    tx: &mut Transaction<'_, Postgres>,
    bookmark_id: Uuid,
    tag_ids: &BTreeSet<Uuid>,
) -> Result<()> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    let ids: Vec<Uuid> = tag_ids.iter().copied().collect();
    sqlx::query(
        "INSERT INTO bookmark_tag (bookmark_id, tag_id)
         SELECT $1, t FROM UNNEST($2::uuid[]) AS t
         ON CONFLICT DO NOTHING",
    )
    .bind(bookmark_id)
    .bind(&ids)
    .execute(&mut **tx)
    .await
    .map_err(Error::Database)?;
    Ok(())
}

/// PostgreSQL implementation of BookmarkRepository.
#[derive(Clone)]
pub struct PgBookmarkRepository {
    pool: Pool<Postgres>,
}

impl PgBookmarkRepository {
    /// Create a new PgBookmarkRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn search(
        &self,
        op: &'static str,
        owner: OwnerId,
        filter: &str,
        arg: String,
    ) -> Result<Vec<Bookmark>> {
        let start = Instant::now();
        let rows = sqlx::query(&format!(
            "{} WHERE b.owner_id = $1 AND {} {}",
            BOOKMARK_SELECT, filter, BOOKMARK_GROUP
        ))
        .bind(owner.as_uuid())
        .bind(arg)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "bookmarks",
            op,
            owner_id = %owner,
            result_count = rows.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Bookmark search complete"
        );
        Ok(rows.iter().map(map_bookmark).collect())
    }
}

#[async_trait]
impl BookmarkRepository for PgBookmarkRepository {
    async fn create(&self, owner: OwnerId, req: CreateBookmarkRequest) -> Result<Bookmark> {
        let owner = owner.require()?;
        let url = require_url(&req.url)?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let tag_ids =
            lock_owned_tags(&mut tx, owner, req.tag_ids.as_deref().unwrap_or_default()).await?;

        let id = Uuid::now_v7();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO bookmark (id, owner_id, url, title, description, created_at_utc, updated_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6, $6)",
        )
        .bind(id)
        .bind(owner.as_uuid())
        .bind(&url)
        .bind(&req.title)
        .bind(&req.description)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        insert_associations(&mut tx, id, &tag_ids).await?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "bookmarks",
            op = "create",
            owner_id = %owner,
            bookmark_id = %id,
            tag_count = tag_ids.len(),
            "Created bookmark"
        );
        Ok(Bookmark {
            id,
            owner_id: owner,
            url,
            title: req.title,
            description: req.description,
            created_at_utc: now,
            updated_at_utc: now,
            tag_ids,
        })
    }

    async fn get(&self, owner: OwnerId, id: Uuid) -> Result<Bookmark> {
        let owner = owner.require()?;
        fetch_bookmark(&self.pool, owner, id)
            .await?
            .ok_or_else(|| Error::bookmark_missing(id))
    }

    async fn list(&self, owner: OwnerId) -> Result<Vec<Bookmark>> {
        let owner = owner.require()?;
        let rows = sqlx::query(&format!(
            "{} WHERE b.owner_id = $1 {}",
            BOOKMARK_SELECT, BOOKMARK_GROUP
        ))
        .bind(owner.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(map_bookmark).collect())
    }

    async fn search_by_title(&self, owner: OwnerId, fragment: &str) -> Result<Vec<Bookmark>> {
        let owner = owner.require()?;
        let fragment = require_fragment("title", fragment)?;
        self.search(
            "search_by_title",
            owner,
            r#"b.title ILIKE '%' || $2 || '%' ESCAPE '\'"#,
            escape_like(fragment),
        )
        .await
    }

    async fn search_by_url_part(&self, owner: OwnerId, fragment: &str) -> Result<Vec<Bookmark>> {
        let owner = owner.require()?;
        let fragment = require_fragment("url part", fragment)?;
        self.search(
            "search_by_url_part",
            owner,
            r#"b.url ILIKE '%' || $2 || '%' ESCAPE '\'"#,
            escape_like(fragment),
        )
        .await
    }

    async fn search_by_tag(&self, owner: OwnerId, tag_id: Uuid) -> Result<Vec<Bookmark>> {
        let owner = owner.require()?;

        let owned = sqlx::query("SELECT 1 FROM tag WHERE id = $1 AND owner_id = $2")
            .bind(tag_id)
            .bind(owner.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        if owned.is_none() {
            return Err(Error::TagNotFound(tag_id));
        }

        let rows = sqlx::query(&format!(
            "{} WHERE b.owner_id = $1
               AND EXISTS (
                   SELECT 1 FROM bookmark_tag x
                   WHERE x.bookmark_id = b.id AND x.tag_id = $2
               )
             {}",
            BOOKMARK_SELECT, BOOKMARK_GROUP
        ))
        .bind(owner.as_uuid())
        .bind(tag_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(map_bookmark).collect())
    }

    async fn update(
        &self,
        owner: OwnerId,
        id: Uuid,
        req: UpdateBookmarkRequest,
    ) -> Result<Bookmark> {
        let owner = owner.require()?;
        let url = require_url(&req.url)?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let exists = sqlx::query("SELECT id FROM bookmark WHERE id = $1 AND owner_id = $2 FOR UPDATE")
            .bind(id)
            .bind(owner.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?;
        if exists.is_none() {
            return Err(Error::bookmark_missing(id));
        }

        let replacement = match req.replacement_tags() {
            Some(ids) => Some(lock_owned_tags(&mut tx, owner, ids).await?),
            None => None,
        };

        sqlx::query(
            "UPDATE bookmark
             SET url = $1, title = $2, description = $3, updated_at_utc = $4
             WHERE id = $5 AND owner_id = $6",
        )
        .bind(&url)
        .bind(&req.title)
        .bind(&req.description)
        .bind(Utc::now())
        .bind(id)
        .bind(owner.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if let Some(tag_ids) = &replacement {
            sqlx::query("DELETE FROM bookmark_tag WHERE bookmark_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;
            insert_associations(&mut tx, id, tag_ids).await?;
        }

        let bookmark = fetch_bookmark(&mut *tx, owner, id)
            .await?
            .ok_or_else(|| Error::bookmark_missing(id))?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "bookmarks",
            op = "update",
            owner_id = %owner,
            bookmark_id = %id,
            tags_replaced = replacement.is_some(),
            "Updated bookmark"
        );
        Ok(bookmark)
    }

    async fn delete_by_id(&self, owner: OwnerId, id: Uuid) -> Result<()> {
        let owner = owner.require()?;
        let result = sqlx::query("DELETE FROM bookmark WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::bookmark_missing(id));
        }
        Ok(())
    }

    async fn delete_by_url(&self, owner: OwnerId, url: &str) -> Result<u64> {
        let owner = owner.require()?;
        let url = require_url(url)?;
        let result = sqlx::query("DELETE FROM bookmark WHERE owner_id = $1 AND url = $2")
            .bind(owner.as_uuid())
            .bind(&url)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "bookmarks",
            op = "delete_by_url",
            owner_id = %owner,
            deleted_count = result.rows_affected(),
            "Deleted bookmarks by url"
        );
        Ok(result.rows_affected())
    }
}
