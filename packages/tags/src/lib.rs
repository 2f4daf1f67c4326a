// ABOUTME: Tag registry for taggable entities
// ABOUTME: Provides types and storage for tags, tag groups, join rows, and translations

pub mod groups;
pub mod storage;
pub mod translations;
pub mod types;

// Re-export main types
pub use groups::TagGroupStorage;
pub use storage::TagStorage;
pub use translations::TranslationStorage;
pub use types::{Tag, TagCount, TagGroup, TaggableRef, Tagged, TagTranslation};
