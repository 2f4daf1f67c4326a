// ABOUTME: Tag registry type definitions
// ABOUTME: Tags, tag groups, polymorphic join rows, translations, and usage aggregates

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub slug: String,
    /// Live join rows referencing this tag, maintained incrementally
    pub count: i64,
    /// Curated suggestion; never garbage collected
    pub suggest: bool,
    pub tag_group_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TagGroup {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// Join row linking one taggable entity to one tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tagged {
    pub id: String,
    pub taggable_type: String,
    pub taggable_id: String,
    pub tag_id: String,
    pub tag_name: String,
    pub tag_slug: String,
    pub sorting: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TagTranslation {
    pub id: String,
    pub tag_id: String,
    pub locale: String,
    pub name: String,
    pub slug: String,
}

/// A tag in use by some taggable type, with its live usage for that type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TagCount {
    pub name: String,
    pub slug: String,
    pub count: i64,
}

/// Polymorphic reference to a taggable entity: type discriminator plus id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaggableRef {
    pub taggable_type: String,
    pub taggable_id: String,
}

impl TaggableRef {
    pub fn new(taggable_type: impl Into<String>, taggable_id: impl Into<String>) -> Self {
        Self {
            taggable_type: taggable_type.into(),
            taggable_id: taggable_id.into(),
        }
    }
}

impl fmt::Display for TaggableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.taggable_type, self.taggable_id)
    }
}
