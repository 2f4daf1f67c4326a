// ABOUTME: Tag membership predicates for queries over taggable entities
// ABOUTME: Composable all/any/none filters scoped to one taggable type

use sqlx::{QueryBuilder, Sqlite};
use tagkit_core::{parse_tag_list, Normalizer};
use tagkit_storage::StorageError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagFilter {
    /// Entity carries every slug
    AllOf(Vec<String>),
    /// Entity carries at least one slug
    AnyOf(Vec<String>),
    /// Entity carries none of the slugs
    NoneOf(Vec<String>),
}

/// A set of tag filters bound to one taggable type.
///
/// Filters are pushed onto a caller-owned [`QueryBuilder`] as `AND …` predicates on the
/// entity key column, so they compose with any other conditions in that query.
#[derive(Debug, Clone)]
pub struct TagQuery {
    taggable_type: String,
    normalizer: Normalizer,
    locale: Option<String>,
    filters: Vec<TagFilter>,
}

impl TagQuery {
    pub fn new(taggable_type: impl Into<String>, normalizer: Normalizer) -> Self {
        Self {
            taggable_type: taggable_type.into(),
            normalizer,
            locale: None,
            filters: Vec::new(),
        }
    }

    /// Also match slugs of tag translations in `locale`, the way tagging resolves names
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn taggable_type(&self) -> &str {
        &self.taggable_type
    }

    pub fn filters(&self) -> &[TagFilter] {
        &self.filters
    }

    pub fn with_all_tags<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        let slugs = self.slugs(names);
        self.filters.push(TagFilter::AllOf(slugs));
        self
    }

    pub fn with_any_tag<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        let slugs = self.slugs(names);
        self.filters.push(TagFilter::AnyOf(slugs));
        self
    }

    pub fn without_tags<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        let slugs = self.slugs(names);
        self.filters.push(TagFilter::NoneOf(slugs));
        self
    }

    /// Append this query's predicates to `builder`.
    ///
    /// `builder` must already contain a `WHERE` clause. `key_column` is interpolated
    /// into the SQL, so only plain (optionally table-qualified) identifiers are accepted.
    pub fn push_conditions(
        &self,
        builder: &mut QueryBuilder<'_, Sqlite>,
        key_column: &str,
    ) -> Result<(), StorageError> {
        if !is_identifier(key_column) {
            return Err(StorageError::Validation(format!(
                "Invalid key column: {:?}",
                key_column
            )));
        }

        for filter in &self.filters {
            match filter {
                // One sub-select per slug: repeated intersection
                TagFilter::AllOf(slugs) => {
                    for slug in slugs {
                        builder.push(format!(" AND {} IN (", key_column));
                        self.push_tagged_ids(builder, std::slice::from_ref(slug));
                        builder.push(")");
                    }
                }
                TagFilter::AnyOf(slugs) if slugs.is_empty() => {
                    builder.push(" AND 1 = 0");
                }
                TagFilter::AnyOf(slugs) => {
                    builder.push(format!(" AND {} IN (", key_column));
                    self.push_tagged_ids(builder, slugs);
                    builder.push(")");
                }
                TagFilter::NoneOf(slugs) if slugs.is_empty() => {}
                TagFilter::NoneOf(slugs) => {
                    builder.push(format!(" AND {} NOT IN (", key_column));
                    self.push_tagged_ids(builder, slugs);
                    builder.push(")");
                }
            }
        }

        Ok(())
    }

    fn push_tagged_ids(&self, builder: &mut QueryBuilder<'_, Sqlite>, slugs: &[String]) {
        builder.push("SELECT taggable_id FROM tagging_tagged WHERE taggable_type = ");
        builder.push_bind(self.taggable_type.clone());
        builder.push(" AND (tag_slug IN (");
        push_slug_list(builder, slugs);

        // Translated slugs count only when no tag owns that slug outright
        if let Some(locale) = &self.locale {
            builder.push(
                " OR tag_id IN (SELECT tr.tag_id FROM tagging_tags_translations tr WHERE tr.locale = ",
            );
            builder.push_bind(locale.clone());
            builder.push(" AND tr.slug IN (");
            push_slug_list(builder, slugs);
            builder.push(
                " AND NOT EXISTS (SELECT 1 FROM tagging_tags t WHERE t.slug = tr.slug))",
            );
        }

        builder.push(")");
    }

    fn slugs<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        let mut slugs: Vec<String> = parse_tag_list(names)
            .iter()
            .map(|name| (self.normalizer)(name))
            .filter(|slug| !slug.is_empty())
            .collect();
        slugs.sort();
        slugs.dedup();
        slugs
    }
}

fn push_slug_list(builder: &mut QueryBuilder<'_, Sqlite>, slugs: &[String]) {
    let mut separated = builder.separated(", ");
    for slug in slugs {
        separated.push_bind(slug.clone());
    }
    separated.push_unseparated(")");
}

fn is_identifier(column: &str) -> bool {
    !column.is_empty()
        && column.split('.').all(|part| {
            !part.is_empty()
                && !part.starts_with(|c: char| c.is_ascii_digit())
                && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagkit_core::slug;

    fn sql_for(query: &TagQuery) -> String {
        let mut builder = QueryBuilder::new("SELECT id FROM posts WHERE 1 = 1");
        query.push_conditions(&mut builder, "posts.id").unwrap();
        builder.sql().to_string()
    }

    #[test]
    fn test_filters_normalize_and_dedupe_names() {
        let query = TagQuery::new("post", slug)
            .with_all_tags(&["Travel, cooking", "COOKING"])
            .without_tags(&["  "]);

        assert_eq!(
            query.filters(),
            &[
                TagFilter::AllOf(vec!["cooking".to_string(), "travel".to_string()]),
                TagFilter::NoneOf(vec![]),
            ]
        );
    }

    #[test]
    fn test_all_of_emits_one_subselect_per_tag() {
        let sql = sql_for(&TagQuery::new("post", slug).with_all_tags(&["a", "b"]));
        assert_eq!(sql.matches("posts.id IN (").count(), 2);
    }

    #[test]
    fn test_any_of_emits_single_subselect() {
        let sql = sql_for(&TagQuery::new("post", slug).with_any_tag(&["a", "b"]));
        assert_eq!(sql.matches("posts.id IN (").count(), 1);
        assert!(sql.contains("tag_slug IN (?, ?)"));
    }

    #[test]
    fn test_locale_matches_translated_slugs() {
        let plain = sql_for(&TagQuery::new("post", slug).with_any_tag(&["a"]));
        assert!(!plain.contains("tagging_tags_translations"));

        let query = TagQuery::new("post", slug).with_locale("fr").with_any_tag(&["a", "b"]);
        assert_eq!(query.locale(), Some("fr"));
        let sql = sql_for(&query);
        assert!(sql.contains("tag_slug IN (?, ?) OR tag_id IN ("));
        assert!(sql.contains("tr.locale = ? AND tr.slug IN (?, ?)"));
    }

    #[test]
    fn test_empty_filters() {
        let sql = sql_for(&TagQuery::new("post", slug).with_any_tag::<&str>(&[]));
        assert!(sql.ends_with(" AND 1 = 0"));

        let sql = sql_for(
            &TagQuery::new("post", slug)
                .without_tags::<&str>(&[])
                .with_all_tags::<&str>(&[]),
        );
        assert_eq!(sql, "SELECT id FROM posts WHERE 1 = 1");
    }

    #[test]
    fn test_rejects_unsafe_key_column() {
        let query = TagQuery::new("post", slug).with_any_tag(&["a"]);
        let mut builder = QueryBuilder::new("SELECT id FROM posts WHERE 1 = 1");

        assert!(query.push_conditions(&mut builder, "id; DROP TABLE posts").is_err());
        assert!(query.push_conditions(&mut builder, "").is_err());
        assert!(query.push_conditions(&mut builder, "posts.").is_err());
        assert!(query.push_conditions(&mut builder, "p.id").is_ok());
    }
}
