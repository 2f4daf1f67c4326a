// ABOUTME: Tag change notifications
// ABOUTME: Events broadcast after a join row is committed or removed

use serde::{Deserialize, Serialize};
use tagkit_tags::TaggableRef;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TagEvent {
    Added {
        taggable: TaggableRef,
        tag_slug: String,
    },
    Removed {
        taggable: TaggableRef,
        tag_slug: String,
    },
}

impl TagEvent {
    pub fn taggable(&self) -> &TaggableRef {
        match self {
            TagEvent::Added { taggable, .. } | TagEvent::Removed { taggable, .. } => taggable,
        }
    }

    pub fn tag_slug(&self) -> &str {
        match self {
            TagEvent::Added { tag_slug, .. } | TagEvent::Removed { tag_slug, .. } => tag_slug,
        }
    }
}
