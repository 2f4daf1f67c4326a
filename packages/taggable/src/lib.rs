// ABOUTME: Tagging service for arbitrary taggable entities
// ABOUTME: Tag/untag/retag, membership filters, usage aggregates, events, and lifecycle hooks

pub mod capability;
pub mod events;
pub mod filter;
pub mod lifecycle;
pub mod service;
pub mod taggable;

// Re-export main types
pub use capability::HasTags;
pub use events::TagEvent;
pub use filter::{TagFilter, TagQuery};
pub use lifecycle::{AutoTag, EntityObserver, TaggingObserver};
pub use service::TaggingService;
pub use taggable::Taggable;

// Registry types callers need alongside the service
pub use tagkit_core::TaggingConfig;
pub use tagkit_storage::StorageError;
pub use tagkit_tags::{Tag, TagCount, TagGroup, TaggableRef, Tagged, TagTranslation};
