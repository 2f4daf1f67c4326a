// ABOUTME: Tagging service shared by every taggable type
// ABOUTME: Owns the pool, configuration, registry storages, and the tag event channel

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tagkit_config::constants::TAGGING_EVENT_CHANNEL_SIZE;
use tagkit_config::env_u32_in_range;
use tagkit_core::TaggingConfig;
use tagkit_storage::StorageError;
use tagkit_tags::{TagCount, TagGroupStorage, TagStorage, TaggableRef, TranslationStorage};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::capability::HasTags;
use crate::events::TagEvent;
use crate::filter::TagQuery;
use crate::taggable::Taggable;

/// Default capacity for the tag event channel
/// Can be overridden via TAGGING_EVENT_CHANNEL_SIZE environment variable
const DEFAULT_EVENT_CHANNEL_SIZE: usize = 256;

pub struct TaggingService {
    pool: SqlitePool,
    config: TaggingConfig,
    tags: TagStorage,
    groups: TagGroupStorage,
    translations: TranslationStorage,
    event_tx: broadcast::Sender<TagEvent>,
}

impl TaggingService {
    pub fn new(pool: SqlitePool, config: TaggingConfig) -> Self {
        // Read channel size from environment with validation
        let channel_size = env_u32_in_range(TAGGING_EVENT_CHANNEL_SIZE, 10, 10_000)
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_EVENT_CHANNEL_SIZE);

        let (event_tx, _) = broadcast::channel(channel_size);

        Self {
            tags: TagStorage::new(pool.clone(), config.clone()),
            groups: TagGroupStorage::new(pool.clone(), config.clone()),
            translations: TranslationStorage::new(pool.clone(), config.clone()),
            pool,
            config,
            event_tx,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &TaggingConfig {
        &self.config
    }

    pub fn tags(&self) -> &TagStorage {
        &self.tags
    }

    pub fn groups(&self) -> &TagGroupStorage {
        &self.groups
    }

    pub fn translations(&self) -> &TranslationStorage {
        &self.translations
    }

    /// Subscribe to tag added/removed notifications
    pub fn subscribe(&self) -> broadcast::Receiver<TagEvent> {
        self.event_tx.subscribe()
    }

    /// Tagging handle for a concrete entity
    pub fn for_entity<E: HasTags>(&self, entity: &E) -> Taggable<'_> {
        Taggable::new(self, entity.taggable_ref())
    }

    /// Tagging handle for an entity known only by discriminator and id
    pub fn for_ref(&self, taggable: TaggableRef) -> Taggable<'_> {
        Taggable::new(self, taggable)
    }

    /// Empty filter set for entities of type `E`
    pub fn query<E: HasTags>(&self) -> TagQuery {
        self.query_type(E::TAGGABLE_TYPE)
    }

    /// Empty filter set for `taggable_type`, matching translated names in the configured locale
    pub fn query_type(&self, taggable_type: &str) -> TagQuery {
        let query = TagQuery::new(taggable_type, self.config.normalizer);
        match &self.config.locale {
            Some(locale) => query.with_locale(locale.clone()),
            None => query,
        }
    }

    /// Ids of tagged entities matching `query`, evaluated against the join table only.
    ///
    /// Entities with no tags at all never appear, so `without_tags` here means
    /// "tagged, but not with these".
    pub async fn tagged_ids(&self, query: &TagQuery) -> Result<Vec<String>, StorageError> {
        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT DISTINCT tg.taggable_id FROM tagging_tagged tg WHERE tg.taggable_type = ",
        );
        builder.push_bind(query.taggable_type().to_string());
        query.push_conditions(&mut builder, "tg.taggable_id")?;
        builder.push(" ORDER BY tg.taggable_id");

        builder
            .build_query_scalar::<String>()
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)
    }

    /// Distinct tags in use by a taggable type with their live per-type usage
    pub async fn existing_tags(&self, taggable_type: &str) -> Result<Vec<TagCount>, StorageError> {
        debug!("Fetching existing tags for type: {}", taggable_type);

        sqlx::query_as::<_, TagCount>(
            r#"
            SELECT t.name AS name, t.slug AS slug, COUNT(tg.id) AS count
            FROM tagging_tagged tg
            JOIN tagging_tags t ON t.id = tg.tag_id
            WHERE tg.taggable_type = ?
            GROUP BY t.id, t.name, t.slug
            ORDER BY t.slug
            "#,
        )
        .bind(taggable_type)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)
    }

    /// Like [`existing_tags`](Self::existing_tags), restricted to tags in the named groups
    pub async fn existing_tags_in_groups<S: AsRef<str>>(
        &self,
        taggable_type: &str,
        groups: &[S],
    ) -> Result<Vec<TagCount>, StorageError> {
        let mut group_slugs: Vec<String> = groups
            .iter()
            .map(|g| self.config.normalize(g.as_ref()))
            .filter(|slug| !slug.is_empty())
            .collect();
        group_slugs.sort();
        group_slugs.dedup();

        if group_slugs.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "Fetching existing tags for type: {} in groups: {:?}",
            taggable_type, group_slugs
        );

        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            r#"
            SELECT t.name AS name, t.slug AS slug, COUNT(tg.id) AS count
            FROM tagging_tagged tg
            JOIN tagging_tags t ON t.id = tg.tag_id
            JOIN tagging_tag_groups g ON g.id = t.tag_group_id
            WHERE tg.taggable_type = "#,
        );
        builder.push_bind(taggable_type.to_string());
        builder.push(" AND g.slug IN (");
        let mut separated = builder.separated(", ");
        for slug in group_slugs {
            separated.push_bind(slug);
        }
        separated.push_unseparated(")");
        builder.push(" GROUP BY t.id, t.name, t.slug ORDER BY t.slug");

        builder
            .build_query_as::<TagCount>()
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)
    }

    /// Delete every unused, non-suggested tag
    pub async fn delete_unused_tags(&self) -> Result<u64, StorageError> {
        self.tags.delete_unused().await
    }

    /// Broadcast an event to all subscribers
    pub(crate) fn emit(&self, event: TagEvent) {
        // Delivery is best-effort; no receivers is the normal case
        if let Err(e) = self.event_tx.send(event) {
            if self.event_tx.receiver_count() > 0 {
                warn!("Failed to broadcast tag event: {}", e);
            }
        }
    }
}
