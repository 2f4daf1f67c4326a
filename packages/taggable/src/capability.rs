// ABOUTME: Capability trait for entities that carry tags
// ABOUTME: Supplies the type discriminator and id the tagging service scopes join rows by

use tagkit_tags::TaggableRef;

/// Implemented by domain types that can be tagged.
///
/// The entity only describes itself; all tagging behaviour lives in
/// [`TaggingService`](crate::TaggingService), reached through
/// [`TaggingService::for_entity`](crate::TaggingService::for_entity).
pub trait HasTags {
    /// Discriminator stored in `taggable_type`; must be stable across releases
    const TAGGABLE_TYPE: &'static str;

    fn taggable_id(&self) -> String;

    /// Per-type override of the configured untag-on-delete behaviour
    fn untag_on_delete() -> Option<bool> {
        None
    }

    fn taggable_ref(&self) -> TaggableRef {
        TaggableRef::new(Self::TAGGABLE_TYPE, self.taggable_id())
    }
}
