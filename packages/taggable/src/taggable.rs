// ABOUTME: Tag operations on a single taggable entity
// ABOUTME: Tag, untag, and retag with transactional usage counters, plus tag readers

use std::collections::HashSet;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tagkit_core::parse_tag_list;
use tagkit_storage::{begin_write, StorageError};
use tagkit_tags::{Tag, TagGroupStorage, TagStorage, TaggableRef, Tagged};
use tracing::debug;

use crate::events::TagEvent;
use crate::service::TaggingService;

/// Tagging operations bound to one entity (type discriminator + id)
pub struct Taggable<'a> {
    service: &'a TaggingService,
    taggable: TaggableRef,
}

/// A tag unlinked from the entity
struct Change {
    tag_id: String,
    tag_slug: String,
}

impl<'a> Taggable<'a> {
    pub(crate) fn new(service: &'a TaggingService, taggable: TaggableRef) -> Self {
        Self { service, taggable }
    }

    pub fn taggable(&self) -> &TaggableRef {
        &self.taggable
    }

    /// Tag the entity with `names` (each entry may be comma-separated)
    pub async fn tag<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Tag>, StorageError> {
        self.tag_with(names, None, false).await
    }

    /// Tag the entity, creating missing tags inside `group_name` and optionally
    /// numbering the new join rows after the existing ones.
    ///
    /// Names already carried (compared by slug) are skipped, as are names that
    /// normalize to nothing. Returns the tags that were newly linked.
    pub async fn tag_with<S: AsRef<str>>(
        &self,
        names: &[S],
        group_name: Option<&str>,
        use_sorting: bool,
    ) -> Result<Vec<Tag>, StorageError> {
        let wanted = self.normalized_names(names);
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let config = self.service.config();
        let mut tx = begin_write(self.service.pool()).await?;

        // Resolve the group before any writes so a missing group aborts cleanly
        let group = match group_name {
            Some(group_name) => Some(TagGroupStorage::require_with(&mut tx, config, group_name).await?),
            None => None,
        };

        let mut sorting = if use_sorting {
            Some(self.count_tagged_with(&mut tx).await?)
        } else {
            None
        };

        let mut added = Vec::new();
        for (name, _) in &wanted {
            let tag = TagStorage::find_or_create_with(&mut tx, config, name, group.as_ref()).await?;

            if self.link_with(&mut tx, &tag, sorting).await? {
                sorting = sorting.map(|s| s + 1);
                added.push(tag);
            } else {
                debug!("{} already tagged with {}", self.taggable, tag.slug);
            }
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;

        for tag in &added {
            self.service.emit(TagEvent::Added {
                taggable: self.taggable.clone(),
                tag_slug: tag.slug.clone(),
            });
        }

        Ok(added)
    }

    /// Tag the entity with existing tags by id; unknown ids are ignored
    pub async fn tag_with_ids<S: AsRef<str>>(
        &self,
        tag_ids: &[S],
        use_sorting: bool,
    ) -> Result<Vec<Tag>, StorageError> {
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = begin_write(self.service.pool()).await?;

        let mut sorting = if use_sorting {
            Some(self.count_tagged_with(&mut tx).await?)
        } else {
            None
        };

        let mut added = Vec::new();
        for tag_id in tag_ids {
            let tag = match TagStorage::get_with(&mut tx, tag_id.as_ref()).await {
                Ok(tag) => tag,
                Err(StorageError::NotFound(_)) => {
                    debug!("Ignoring unknown tag id: {}", tag_id.as_ref());
                    continue;
                }
                Err(e) => return Err(e),
            };

            if self.link_with(&mut tx, &tag, sorting).await? {
                sorting = sorting.map(|s| s + 1);
                added.push(tag);
            }
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;

        for tag in &added {
            self.service.emit(TagEvent::Added {
                taggable: self.taggable.clone(),
                tag_slug: tag.slug.clone(),
            });
        }

        Ok(added)
    }

    /// Remove the named tags; returns how many join rows were deleted
    pub async fn untag<S: AsRef<str>>(&self, names: &[S]) -> Result<u64, StorageError> {
        let wanted = self.normalized_names(names);

        let mut tag_ids = Vec::new();
        {
            let mut conn = self.service.pool().acquire().await.map_err(StorageError::Sqlx)?;
            let locale = self.service.config().locale.as_deref();
            for (_, slug) in &wanted {
                if let Some(tag) = TagStorage::find_by_slug_with(&mut conn, slug, locale).await? {
                    tag_ids.push(tag.id);
                }
            }
        }

        self.untag_ids(&tag_ids).await
    }

    /// Remove every tag from the entity
    pub async fn untag_all(&self) -> Result<u64, StorageError> {
        let tag_ids = self.tag_ids().await?;
        self.untag_ids(&tag_ids).await
    }

    /// Remove every tag the entity carries from the named group
    pub async fn untag_group(&self, group_name: &str) -> Result<u64, StorageError> {
        let tag_ids = self.tag_ids_in_group(group_name).await?;
        self.untag_ids(&tag_ids).await
    }

    /// Replace the entity's tags with `names`.
    ///
    /// Only the difference is applied: tags present on both sides keep their join
    /// rows and counters untouched.
    pub async fn retag<S: AsRef<str>>(&self, names: &[S]) -> Result<(), StorageError> {
        let wanted = self.normalized_names(names);
        let current = self.tags().await?;

        // Map each wanted name onto the slug of the tag it would resolve to
        let mut wanted_slugs = Vec::with_capacity(wanted.len());
        {
            let mut conn = self.service.pool().acquire().await.map_err(StorageError::Sqlx)?;
            let locale = self.service.config().locale.as_deref();
            for (name, slug) in &wanted {
                let canonical = TagStorage::find_by_slug_with(&mut conn, slug, locale)
                    .await?
                    .map(|tag| tag.slug)
                    .unwrap_or_else(|| slug.clone());
                wanted_slugs.push((name.clone(), canonical));
            }
        }

        let wanted_set: HashSet<&str> = wanted_slugs.iter().map(|(_, s)| s.as_str()).collect();
        let current_set: HashSet<&str> = current.iter().map(|t| t.slug.as_str()).collect();

        let removals: Vec<String> = current
            .iter()
            .filter(|tag| !wanted_set.contains(tag.slug.as_str()))
            .map(|tag| tag.id.clone())
            .collect();
        let additions: Vec<String> = wanted_slugs
            .iter()
            .filter(|(_, slug)| !current_set.contains(slug.as_str()))
            .map(|(name, _)| name.clone())
            .collect();

        debug!(
            "Retagging {}: {} removals, {} additions",
            self.taggable,
            removals.len(),
            additions.len()
        );

        if !removals.is_empty() {
            self.untag_ids(&removals).await?;
        }
        if !additions.is_empty() {
            self.tag(&additions).await?;
        }

        Ok(())
    }

    /// Join rows for the entity in display order, optionally limited to a group
    pub async fn tagged(&self, group_name: Option<&str>) -> Result<Vec<Tagged>, StorageError> {
        let mut builder = QueryBuilder::new("SELECT tg.* FROM tagging_tagged tg");
        self.push_scope(&mut builder, group_name);
        builder
            .build_query_as::<Tagged>()
            .fetch_all(self.service.pool())
            .await
            .map_err(StorageError::Sqlx)
    }

    /// Tags carried by the entity in display order
    pub async fn tags(&self) -> Result<Vec<Tag>, StorageError> {
        self.tags_in(None).await
    }

    pub async fn tags_in_group(&self, group_name: &str) -> Result<Vec<Tag>, StorageError> {
        self.tags_in(Some(group_name)).await
    }

    /// Display names, translated when a locale is configured
    pub async fn tag_names(&self) -> Result<Vec<String>, StorageError> {
        self.names_in(None).await
    }

    pub async fn tag_names_in_group(&self, group_name: &str) -> Result<Vec<String>, StorageError> {
        self.names_in(Some(group_name)).await
    }

    /// Display names joined with `", "`
    pub async fn tag_names_string(&self) -> Result<String, StorageError> {
        Ok(self.tag_names().await?.join(", "))
    }

    pub async fn tag_ids(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.tags().await?.into_iter().map(|t| t.id).collect())
    }

    pub async fn tag_ids_in_group(&self, group_name: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .tags_in_group(group_name)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect())
    }

    pub async fn tag_slugs(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.tags().await?.into_iter().map(|t| t.slug).collect())
    }

    pub async fn tag_slugs_in_group(&self, group_name: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .tags_in_group(group_name)
            .await?
            .into_iter()
            .map(|t| t.slug)
            .collect())
    }

    pub async fn has_tag(&self, tag: &Tag) -> Result<bool, StorageError> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM tagging_tagged
                WHERE taggable_type = ? AND taggable_id = ? AND tag_id = ?
            )
            "#,
        )
        .bind(&self.taggable.taggable_type)
        .bind(&self.taggable.taggable_id)
        .bind(&tag.id)
        .fetch_one(self.service.pool())
        .await
        .map_err(StorageError::Sqlx)
    }

    /// Delete join rows for `tag_ids` and decrement counters in one transaction,
    /// then notify and optionally collect unused tags.
    async fn untag_ids(&self, tag_ids: &[String]) -> Result<u64, StorageError> {
        let mut removed = Vec::new();
        let mut total = 0;

        if !tag_ids.is_empty() {
            let mut tx = begin_write(self.service.pool()).await?;

            for tag_id in tag_ids {
                let tag_slug: Option<String> = sqlx::query_scalar(
                    r#"
                    DELETE FROM tagging_tagged
                    WHERE taggable_type = ? AND taggable_id = ? AND tag_id = ?
                    RETURNING tag_slug
                    "#,
                )
                .bind(&self.taggable.taggable_type)
                .bind(&self.taggable.taggable_id)
                .bind(tag_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?;

                // At most one row per (entity, tag) pair
                if let Some(tag_slug) = tag_slug {
                    TagStorage::adjust_count_with(&mut tx, tag_id, -1).await?;
                    total += 1;
                    removed.push(Change {
                        tag_id: tag_id.clone(),
                        tag_slug,
                    });
                }
            }

            tx.commit().await.map_err(StorageError::Sqlx)?;
        }

        for change in &removed {
            debug!("Untagged {} from {}", change.tag_id, self.taggable);
            self.service.emit(TagEvent::Removed {
                taggable: self.taggable.clone(),
                tag_slug: change.tag_slug.clone(),
            });
        }

        if self.service.config().delete_unused_tags {
            self.service.delete_unused_tags().await?;
        }

        Ok(total)
    }

    /// Insert the join row and bump the counter; false when the pair already exists
    async fn link_with(
        &self,
        conn: &mut SqliteConnection,
        tag: &Tag,
        sorting: Option<i64>,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query(
            r#"
            INSERT INTO tagging_tagged
                (id, taggable_type, taggable_id, tag_id, tag_name, tag_slug, sorting, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (taggable_type, taggable_id, tag_id) DO NOTHING
            "#,
        )
        .bind(format!("tgd-{}", nanoid::nanoid!()))
        .bind(&self.taggable.taggable_type)
        .bind(&self.taggable.taggable_id)
        .bind(&tag.id)
        .bind(&tag.name)
        .bind(&tag.slug)
        .bind(sorting)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        TagStorage::adjust_count_with(conn, &tag.id, 1).await?;
        Ok(true)
    }

    async fn count_tagged_with(&self, conn: &mut SqliteConnection) -> Result<i64, StorageError> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM tagging_tagged WHERE taggable_type = ? AND taggable_id = ?",
        )
        .bind(&self.taggable.taggable_type)
        .bind(&self.taggable.taggable_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)
    }

    async fn tags_in(&self, group_name: Option<&str>) -> Result<Vec<Tag>, StorageError> {
        let mut builder = QueryBuilder::new("SELECT t.* FROM tagging_tagged tg");
        self.push_scope(&mut builder, group_name);
        builder
            .build_query_as::<Tag>()
            .fetch_all(self.service.pool())
            .await
            .map_err(StorageError::Sqlx)
    }

    async fn names_in(&self, group_name: Option<&str>) -> Result<Vec<String>, StorageError> {
        let mut builder = QueryBuilder::new("SELECT COALESCE(tr.name, t.name) FROM tagging_tagged tg");
        self.push_scope(&mut builder, group_name);
        builder
            .build_query_scalar::<String>()
            .fetch_all(self.service.pool())
            .await
            .map_err(StorageError::Sqlx)
    }

    /// Joins, entity/group restriction, and ordering shared by the readers.
    /// Rows without an explicit sorting value come first, in insertion order.
    fn push_scope(&self, builder: &mut QueryBuilder<'_, Sqlite>, group_name: Option<&str>) {
        let config = self.service.config();

        builder.push(" JOIN tagging_tags t ON t.id = tg.tag_id");
        builder.push(" LEFT JOIN tagging_tags_translations tr ON tr.tag_id = t.id AND tr.locale = ");
        builder.push_bind(config.locale.clone());
        if group_name.is_some() {
            builder.push(" JOIN tagging_tag_groups g ON g.id = t.tag_group_id");
        }

        builder.push(" WHERE tg.taggable_type = ");
        builder.push_bind(self.taggable.taggable_type.clone());
        builder.push(" AND tg.taggable_id = ");
        builder.push_bind(self.taggable.taggable_id.clone());

        if let Some(group_name) = group_name {
            builder.push(" AND g.slug = ");
            builder.push_bind(config.normalize(group_name));
        }

        builder.push(" ORDER BY tg.sorting, tg.rowid");
    }

    /// Parse, normalize, and de-duplicate raw input by slug, keeping first spelling
    fn normalized_names<S: AsRef<str>>(&self, names: &[S]) -> Vec<(String, String)> {
        let config = self.service.config();
        let mut seen = HashSet::new();

        parse_tag_list(names)
            .into_iter()
            .filter_map(|name| {
                let slug = config.normalize(&name);
                if slug.is_empty() {
                    debug!("Skipping tag name without a usable slug: {:?}", name);
                    return None;
                }
                seen.insert(slug.clone()).then_some((name, slug))
            })
            .collect()
    }
}
