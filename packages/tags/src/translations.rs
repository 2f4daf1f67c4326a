// ABOUTME: Tag translation storage
// ABOUTME: Per-locale names and slugs owned by a tag, with fallback to the base name

use sqlx::SqlitePool;
use tagkit_core::{validate_locale, validate_name, TaggingConfig, ValidationError};
use tagkit_storage::StorageError;
use tracing::debug;

use super::types::{Tag, TagTranslation};

pub struct TranslationStorage {
    pool: SqlitePool,
    config: TaggingConfig,
}

impl TranslationStorage {
    pub fn new(pool: SqlitePool, config: TaggingConfig) -> Self {
        Self { pool, config }
    }

    /// Insert or replace the translation of a tag for `locale`
    pub async fn set_translation(
        &self,
        tag_id: &str,
        locale: &str,
        name: &str,
    ) -> Result<TagTranslation, StorageError> {
        validate_locale(locale)?;
        let slug = self.config.normalize(name);
        validate_name(name, &slug, ValidationError::EmptyTagName)?;

        let locale = locale.trim();
        let display_name = self.config.display(name);
        debug!("Setting {} translation for tag {}: {}", locale, tag_id, display_name);

        sqlx::query(
            r#"
            INSERT INTO tagging_tags_translations (id, tag_id, locale, name, slug)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (tag_id, locale) DO UPDATE SET name = excluded.name, slug = excluded.slug
            "#,
        )
        .bind(format!("ttr-{}", nanoid::nanoid!()))
        .bind(tag_id)
        .bind(locale)
        .bind(&display_name)
        .bind(&slug)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            let missing_tag = matches!(
                &err,
                sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation()
            );
            if missing_tag {
                StorageError::NotFound(format!("Tag not found: {}", tag_id))
            } else {
                StorageError::Sqlx(err)
            }
        })?;

        self.get_translation(tag_id, locale)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("Translation not found: {}", locale)))
    }

    pub async fn get_translation(
        &self,
        tag_id: &str,
        locale: &str,
    ) -> Result<Option<TagTranslation>, StorageError> {
        sqlx::query_as::<_, TagTranslation>(
            "SELECT * FROM tagging_tags_translations WHERE tag_id = ? AND locale = ?",
        )
        .bind(tag_id)
        .bind(locale.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Sqlx)
    }

    /// All translations of a tag ordered by locale
    pub async fn translations(&self, tag_id: &str) -> Result<Vec<TagTranslation>, StorageError> {
        sqlx::query_as::<_, TagTranslation>(
            "SELECT * FROM tagging_tags_translations WHERE tag_id = ? ORDER BY locale",
        )
        .bind(tag_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)
    }

    /// Name of `tag` in `locale`, or its base name when untranslated
    pub async fn translated_name(&self, tag: &Tag, locale: &str) -> Result<String, StorageError> {
        Ok(self
            .get_translation(&tag.id, locale)
            .await?
            .map(|translation| translation.name)
            .unwrap_or_else(|| tag.name.clone()))
    }

    /// Returns whether a translation was removed
    pub async fn remove_translation(&self, tag_id: &str, locale: &str) -> Result<bool, StorageError> {
        let result =
            sqlx::query("DELETE FROM tagging_tags_translations WHERE tag_id = ? AND locale = ?")
                .bind(tag_id)
                .bind(locale.trim())
                .execute(&self.pool)
                .await
                .map_err(StorageError::Sqlx)?;

        Ok(result.rows_affected() > 0)
    }
}
