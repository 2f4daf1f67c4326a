// ABOUTME: Tag storage layer using SQLite
// ABOUTME: Find-or-create by slug, group assignment, usage counters, and unused-tag cleanup

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tagkit_core::{validate_name, TaggingConfig, ValidationError};
use tagkit_storage::{begin_write, is_unique_violation, StorageError};
use tracing::{debug, info, warn};

use super::groups::TagGroupStorage;
use super::types::{Tag, TagGroup, TaggableRef};

pub struct TagStorage {
    pool: SqlitePool,
    config: TaggingConfig,
}

impl TagStorage {
    pub fn new(pool: SqlitePool, config: TaggingConfig) -> Self {
        Self { pool, config }
    }

    pub fn config(&self) -> &TaggingConfig {
        &self.config
    }

    /// Get a single tag by ID
    pub async fn get_tag(&self, tag_id: &str) -> Result<Tag, StorageError> {
        debug!("Fetching tag: {}", tag_id);

        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        Self::get_with(&mut conn, tag_id).await
    }

    /// Look up a tag by name, normalized with the configured normalizer
    pub async fn find_tag(&self, name: &str) -> Result<Option<Tag>, StorageError> {
        let slug = self.config.normalize(name);
        debug!("Fetching tag by slug: {}", slug);

        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        Self::find_by_slug_with(&mut conn, &slug, self.config.locale.as_deref()).await
    }

    /// Resolve `name` to an existing tag or create it, optionally inside a group
    pub async fn find_or_create(
        &self,
        name: &str,
        group_name: Option<&str>,
    ) -> Result<Tag, StorageError> {
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;

        let group = match group_name {
            Some(group_name) => {
                Some(TagGroupStorage::require_with(&mut conn, &self.config, group_name).await?)
            }
            None => None,
        };

        Self::find_or_create_with(&mut conn, &self.config, name, group.as_ref()).await
    }

    /// Create (or promote) a curated suggestion that survives unused-tag cleanup
    pub async fn create_suggested(
        &self,
        name: &str,
        group_name: Option<&str>,
    ) -> Result<Tag, StorageError> {
        let tag = self.find_or_create(name, group_name).await?;
        self.set_suggest(&tag.id, true).await
    }

    /// List all tags ordered by slug
    pub async fn list_tags(&self) -> Result<Vec<Tag>, StorageError> {
        sqlx::query_as::<_, Tag>("SELECT * FROM tagging_tags ORDER BY slug")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)
    }

    /// List curated suggestions
    pub async fn list_suggested(&self) -> Result<Vec<Tag>, StorageError> {
        sqlx::query_as::<_, Tag>("SELECT * FROM tagging_tags WHERE suggest = 1 ORDER BY slug")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)
    }

    /// List tags belonging to a group; an unknown group yields no tags
    pub async fn list_in_group(&self, group_name: &str) -> Result<Vec<Tag>, StorageError> {
        let group_slug = self.config.normalize(group_name);
        debug!("Fetching tags in group: {}", group_slug);

        sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.*
            FROM tagging_tags t
            JOIN tagging_tag_groups g ON g.id = t.tag_group_id
            WHERE g.slug = ?
            ORDER BY t.slug
            "#,
        )
        .bind(group_slug)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)
    }

    /// List tags the given entity does not carry, e.g. for suggestion pickers
    pub async fn list_not_tagged_to(&self, taggable: &TaggableRef) -> Result<Vec<Tag>, StorageError> {
        sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.*
            FROM tagging_tags t
            WHERE NOT EXISTS (
                SELECT 1 FROM tagging_tagged tg
                WHERE tg.tag_id = t.id
                AND tg.taggable_type = ?
                AND tg.taggable_id = ?
            )
            ORDER BY t.slug
            "#,
        )
        .bind(&taggable.taggable_type)
        .bind(&taggable.taggable_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)
    }

    /// Flag or unflag a tag as a curated suggestion
    pub async fn set_suggest(&self, tag_id: &str, suggest: bool) -> Result<Tag, StorageError> {
        debug!("Setting suggest={} on tag: {}", suggest, tag_id);

        let result = sqlx::query("UPDATE tagging_tags SET suggest = ? WHERE id = ?")
            .bind(suggest)
            .bind(tag_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("Tag not found: {}", tag_id)));
        }

        self.get_tag(tag_id).await
    }

    /// Put a tag into the named group
    pub async fn set_group(&self, tag_id: &str, group_name: &str) -> Result<Tag, StorageError> {
        let mut tx = begin_write(&self.pool).await?;

        let group = TagGroupStorage::require_with(&mut tx, &self.config, group_name).await?;
        debug!("Assigning tag {} to group {}", tag_id, group.slug);

        let result = sqlx::query("UPDATE tagging_tags SET tag_group_id = ? WHERE id = ?")
            .bind(&group.id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("Tag not found: {}", tag_id)));
        }

        let tag = Self::get_with(&mut tx, tag_id).await?;
        tx.commit().await.map_err(StorageError::Sqlx)?;

        Ok(tag)
    }

    /// Take a tag out of the named group; tags in other groups are left alone
    pub async fn remove_group(&self, tag_id: &str, group_name: &str) -> Result<Tag, StorageError> {
        let mut tx = begin_write(&self.pool).await?;

        let group = TagGroupStorage::require_with(&mut tx, &self.config, group_name).await?;
        debug!("Removing tag {} from group {}", tag_id, group.slug);

        sqlx::query("UPDATE tagging_tags SET tag_group_id = NULL WHERE id = ? AND tag_group_id = ?")
            .bind(tag_id)
            .bind(&group.id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        let tag = Self::get_with(&mut tx, tag_id).await?;
        tx.commit().await.map_err(StorageError::Sqlx)?;

        Ok(tag)
    }

    /// Whether the tag's current group has the normalized `group_name` as slug
    pub async fn is_in_group(&self, tag: &Tag, group_name: &str) -> Result<bool, StorageError> {
        let Some(group_id) = tag.tag_group_id.as_deref() else {
            return Ok(false);
        };

        let group_slug: Option<String> =
            sqlx::query_scalar("SELECT slug FROM tagging_tag_groups WHERE id = ?")
                .bind(group_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(StorageError::Sqlx)?;

        Ok(group_slug.as_deref() == Some(self.config.normalize(group_name).as_str()))
    }

    /// Delete every tag without join rows unless it is a suggestion
    pub async fn delete_unused(&self) -> Result<u64, StorageError> {
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        Self::delete_unused_with(&mut conn).await
    }

    /// Recompute every usage counter from the join table, returning how many drifted
    pub async fn recount_tags(&self) -> Result<u64, StorageError> {
        let result = sqlx::query(
            r#"
            UPDATE tagging_tags
            SET count = (SELECT COUNT(*) FROM tagging_tagged tg WHERE tg.tag_id = tagging_tags.id)
            WHERE count != (SELECT COUNT(*) FROM tagging_tagged tg WHERE tg.tag_id = tagging_tags.id)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        if result.rows_affected() > 0 {
            warn!("Repaired usage counters on {} tags", result.rows_affected());
        }

        Ok(result.rows_affected())
    }

    /// Delete a tag together with every join row referencing it
    pub async fn delete_tag(&self, tag_id: &str) -> Result<(), StorageError> {
        debug!("Deleting tag: {}", tag_id);

        let result = sqlx::query("DELETE FROM tagging_tags WHERE id = ?")
            .bind(tag_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("Tag not found: {}", tag_id)));
        }

        Ok(())
    }

    pub async fn get_with(conn: &mut SqliteConnection, tag_id: &str) -> Result<Tag, StorageError> {
        sqlx::query_as::<_, Tag>("SELECT * FROM tagging_tags WHERE id = ?")
            .bind(tag_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| StorageError::NotFound(format!("Tag not found: {}", tag_id)))
    }

    /// Find a tag by slug, falling back to a translated slug in `locale`
    pub async fn find_by_slug_with(
        conn: &mut SqliteConnection,
        slug: &str,
        locale: Option<&str>,
    ) -> Result<Option<Tag>, StorageError> {
        let tag = sqlx::query_as::<_, Tag>("SELECT * FROM tagging_tags WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&mut *conn)
            .await
            .map_err(StorageError::Sqlx)?;

        match (tag, locale) {
            (Some(tag), _) => Ok(Some(tag)),
            (None, Some(locale)) => sqlx::query_as::<_, Tag>(
                r#"
                SELECT t.*
                FROM tagging_tags t
                JOIN tagging_tags_translations tr ON tr.tag_id = t.id
                WHERE tr.locale = ? AND tr.slug = ?
                LIMIT 1
                "#,
            )
            .bind(locale)
            .bind(slug)
            .fetch_optional(&mut *conn)
            .await
            .map_err(StorageError::Sqlx),
            (None, None) => Ok(None),
        }
    }

    /// Resolve `name` to a tag, creating it when no tag has its slug.
    ///
    /// Losing a creation race to another writer surfaces as a uniqueness violation on
    /// the slug; the winner's row is re-fetched instead of failing.
    pub async fn find_or_create_with(
        conn: &mut SqliteConnection,
        config: &TaggingConfig,
        name: &str,
        group: Option<&TagGroup>,
    ) -> Result<Tag, StorageError> {
        let slug = config.normalize(name);
        validate_name(name, &slug, ValidationError::EmptyTagName)?;

        if let Some(tag) = Self::find_by_slug_with(conn, &slug, config.locale.as_deref()).await? {
            return Ok(tag);
        }

        let tag_id = format!("tag-{}", nanoid::nanoid!());
        let display_name = config.display(name);
        debug!("Creating tag: {} (name: {}, slug: {})", tag_id, display_name, slug);

        let inserted = sqlx::query(
            r#"
            INSERT INTO tagging_tags (id, name, slug, count, suggest, tag_group_id, created_at)
            VALUES (?, ?, ?, 0, 0, ?, ?)
            "#,
        )
        .bind(&tag_id)
        .bind(&display_name)
        .bind(&slug)
        .bind(group.map(|g| g.id.as_str()))
        .bind(Utc::now())
        .execute(&mut *conn)
        .await;

        match inserted {
            Ok(_) => Self::get_with(conn, &tag_id).await,
            Err(err) if is_unique_violation(&err) => {
                warn!("Tag {} was created concurrently, re-fetching", slug);
                Self::find_by_slug_with(conn, &slug, None)
                    .await?
                    .ok_or_else(|| StorageError::NotFound(format!("Tag not found: {}", slug)))
            }
            Err(err) => Err(StorageError::Sqlx(err)),
        }
    }

    /// Shift a usage counter by `delta`, never below zero
    pub async fn adjust_count_with(
        conn: &mut SqliteConnection,
        tag_id: &str,
        delta: i64,
    ) -> Result<(), StorageError> {
        if delta == 0 {
            return Ok(());
        }

        sqlx::query("UPDATE tagging_tags SET count = MAX(count + ?, 0) WHERE id = ?")
            .bind(delta)
            .bind(tag_id)
            .execute(&mut *conn)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(())
    }

    pub async fn delete_unused_with(conn: &mut SqliteConnection) -> Result<u64, StorageError> {
        let result = sqlx::query(
            r#"
            DELETE FROM tagging_tags
            WHERE suggest = 0
            AND NOT EXISTS (SELECT 1 FROM tagging_tagged tg WHERE tg.tag_id = tagging_tags.id)
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

        if result.rows_affected() > 0 {
            info!("Deleted {} unused tags", result.rows_affected());
        }

        Ok(result.rows_affected())
    }
}
