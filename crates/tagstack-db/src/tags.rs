//! Tag repository implementation.
//!
//! Reparent and delete lock every tag row of the owner (`FOR UPDATE`, in id
//! order) before reading the forest, so two concurrent moves within one
//! owner are serialized and the cycle check always sees committed parents.

use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use tagstack_core::{
    normalize_tag_name, require_fragment, CreateTagRequest, Error, OwnerId, Result, Tag,
    TagForest, TagRepository, UpdateTagRequest,
};

use crate::escape_like;

const TAG_COLUMNS: &str = "id, owner_id, name, parent_id, created_at_utc";

pub(crate) fn map_tag(row: &PgRow) -> Tag {
    Tag {
        id: row.get("id"),
        owner_id: OwnerId::new(row.get("owner_id")),
        name: row.get("name"),
        parent_id: row.get("parent_id"),
        created_at_utc: row.get("created_at_utc"),
    }
}

/// PostgreSQL implementation of TagRepository.
#[derive(Clone)]
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Lock and load the owner's whole forest inside `tx`.
    async fn lock_forest(
        tx: &mut Transaction<'_, Postgres>,
        owner: OwnerId,
    ) -> Result<TagForest> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tag WHERE owner_id = $1 ORDER BY id FOR UPDATE",
            TAG_COLUMNS
        ))
        .bind(owner.as_uuid())
        .fetch_all(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok(TagForest::new(rows.iter().map(map_tag)))
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn create(&self, owner: OwnerId, req: CreateTagRequest) -> Result<Tag> {
        let owner = owner.require()?;
        let name = normalize_tag_name(&req.name)?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        if let Some(parent_id) = req.parent_id {
            // FOR SHARE keeps the parent from being deleted before commit.
            let parent = sqlx::query("SELECT id FROM tag WHERE id = $1 AND owner_id = $2 FOR SHARE")
                .bind(parent_id)
                .bind(owner.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Database)?;
            if parent.is_none() {
                return Err(Error::InvalidParent(parent_id));
            }
        }

        let row = sqlx::query(&format!(
            "INSERT INTO tag (id, owner_id, name, parent_id, created_at_utc)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            TAG_COLUMNS
        ))
        .bind(Uuid::now_v7())
        .bind(owner.as_uuid())
        .bind(&name)
        .bind(req.parent_id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        let tag = map_tag(&row);
        debug!(
            subsystem = "database",
            component = "tags",
            op = "create",
            owner_id = %owner,
            tag_id = %tag.id,
            "Created tag"
        );
        Ok(tag)
    }

    async fn get(&self, owner: OwnerId, id: Uuid) -> Result<Tag> {
        let owner = owner.require()?;
        let row = sqlx::query(&format!(
            "SELECT {} FROM tag WHERE id = $1 AND owner_id = $2",
            TAG_COLUMNS
        ))
        .bind(id)
        .bind(owner.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(map_tag).ok_or_else(|| Error::tag_missing(id))
    }

    async fn list(&self, owner: OwnerId) -> Result<Vec<Tag>> {
        let owner = owner.require()?;
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tag WHERE owner_id = $1 ORDER BY name, id",
            TAG_COLUMNS
        ))
        .bind(owner.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(map_tag).collect())
    }

    async fn search_by_name(&self, owner: OwnerId, fragment: &str) -> Result<Vec<Tag>> {
        let owner = owner.require()?;
        let fragment = require_fragment("name", fragment)?;
        let start = Instant::now();

        let rows = sqlx::query(&format!(
            r#"SELECT {} FROM tag
               WHERE owner_id = $1 AND name ILIKE '%' || $2 || '%' ESCAPE '\'
               ORDER BY name, id"#,
            TAG_COLUMNS
        ))
        .bind(owner.as_uuid())
        .bind(escape_like(fragment))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "tags",
            op = "search_by_name",
            owner_id = %owner,
            result_count = rows.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Tag search complete"
        );
        Ok(rows.iter().map(map_tag).collect())
    }

    async fn update(&self, owner: OwnerId, id: Uuid, req: UpdateTagRequest) -> Result<Tag> {
        let owner = owner.require()?;
        let name = normalize_tag_name(&req.name)?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let forest = Self::lock_forest(&mut tx, owner).await?;
        if !forest.contains(id) {
            return Err(Error::tag_missing(id));
        }
        forest.validate_reparent(id, req.parent_id)?;

        let row = sqlx::query(&format!(
            "UPDATE tag SET name = $1, parent_id = $2
             WHERE id = $3 AND owner_id = $4
             RETURNING {}",
            TAG_COLUMNS
        ))
        .bind(&name)
        .bind(req.parent_id)
        .bind(id)
        .bind(owner.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "tags",
            op = "update",
            owner_id = %owner,
            tag_id = %id,
            "Updated tag"
        );
        Ok(map_tag(&row))
    }

    async fn delete(&self, owner: OwnerId, id: Uuid) -> Result<u64> {
        let owner = owner.require()?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let forest = Self::lock_forest(&mut tx, owner).await?;
        if !forest.contains(id) {
            return Err(Error::tag_missing(id));
        }

        // bookmark_tag rows go with the tags through ON DELETE CASCADE.
        let result = sqlx::query(
            r#"
            WITH RECURSIVE doomed AS (
                SELECT id FROM tag WHERE id = $1 AND owner_id = $2
                UNION
                SELECT t.id
                FROM tag t
                JOIN doomed d ON t.parent_id = d.id
                WHERE t.owner_id = $2
            )
            DELETE FROM tag WHERE id IN (SELECT id FROM doomed)
            "#,
        )
        .bind(id)
        .bind(owner.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "tags",
            op = "delete",
            owner_id = %owner,
            tag_id = %id,
            deleted_count = result.rows_affected(),
            "Deleted tag subtree"
        );
        Ok(result.rows_affected())
    }
}
