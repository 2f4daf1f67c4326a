// ABOUTME: Tag group storage layer using SQLite
// ABOUTME: Creates, resolves, lists, and deletes named partitions of the tag namespace

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tagkit_core::{validate_name, TaggingConfig, ValidationError};
use tagkit_storage::{is_unique_violation, StorageError};
use tracing::{debug, warn};

use super::types::TagGroup;

pub struct TagGroupStorage {
    pool: SqlitePool,
    config: TaggingConfig,
}

impl TagGroupStorage {
    pub fn new(pool: SqlitePool, config: TaggingConfig) -> Self {
        Self { pool, config }
    }

    /// Create a group, or return the existing one with the same slug
    pub async fn create_group(&self, name: &str) -> Result<TagGroup, StorageError> {
        let slug = self.config.normalize(name);
        validate_name(name, &slug, ValidationError::EmptyGroupName)?;

        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;

        if let Some(existing) = Self::find_by_slug_with(&mut conn, &slug).await? {
            return Ok(existing);
        }

        let group_id = format!("tgrp-{}", nanoid::nanoid!());
        debug!("Creating tag group: {} (slug: {})", group_id, slug);

        let inserted = sqlx::query(
            r#"
            INSERT INTO tagging_tag_groups (id, name, slug, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&group_id)
        .bind(name.trim())
        .bind(&slug)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await;

        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                warn!("Tag group {} was created concurrently, re-fetching", slug);
            }
            Err(err) => return Err(StorageError::Sqlx(err)),
        }

        Self::find_by_slug_with(&mut conn, &slug)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("Tag group not found: {}", slug)))
    }

    /// Get a single group by ID
    pub async fn get_group(&self, group_id: &str) -> Result<TagGroup, StorageError> {
        debug!("Fetching tag group: {}", group_id);

        sqlx::query_as::<_, TagGroup>("SELECT * FROM tagging_tag_groups WHERE id = ?")
            .bind(group_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| StorageError::NotFound(format!("Tag group not found: {}", group_id)))
    }

    /// Look up a group by name (normalized to its slug)
    pub async fn find_group(&self, name: &str) -> Result<Option<TagGroup>, StorageError> {
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        Self::find_by_slug_with(&mut conn, &self.config.normalize(name)).await
    }

    /// List all groups ordered by slug
    pub async fn list_groups(&self) -> Result<Vec<TagGroup>, StorageError> {
        sqlx::query_as::<_, TagGroup>("SELECT * FROM tagging_tag_groups ORDER BY slug")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)
    }

    /// Delete a group; its tags stay and lose their group
    pub async fn delete_group(&self, group_id: &str) -> Result<(), StorageError> {
        debug!("Deleting tag group: {}", group_id);

        let result = sqlx::query("DELETE FROM tagging_tag_groups WHERE id = ?")
            .bind(group_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!(
                "Tag group not found: {}",
                group_id
            )));
        }

        Ok(())
    }

    pub async fn find_by_slug_with(
        conn: &mut SqliteConnection,
        slug: &str,
    ) -> Result<Option<TagGroup>, StorageError> {
        sqlx::query_as::<_, TagGroup>("SELECT * FROM tagging_tag_groups WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&mut *conn)
            .await
            .map_err(StorageError::Sqlx)
    }

    /// Resolve a group by name, failing with `NotFound` when it does not exist
    pub async fn require_with(
        conn: &mut SqliteConnection,
        config: &TaggingConfig,
        name: &str,
    ) -> Result<TagGroup, StorageError> {
        let slug = config.normalize(name);
        Self::find_by_slug_with(conn, &slug)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("No tag group found: {}", name.trim())))
    }
}
