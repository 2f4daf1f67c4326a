// ABOUTME: Entity lifecycle hooks for tagging
// ABOUTME: Untag before delete and apply pending auto-tag values after save

use std::sync::Arc;

use async_trait::async_trait;
use tagkit_storage::StorageError;
use tracing::debug;

use crate::capability::HasTags;
use crate::service::TaggingService;

/// Tag names assigned to an entity before it is saved.
///
/// Left unset, saving leaves the entity's tags alone. Setting names replaces the
/// tags on save; clearing removes them all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoTag {
    pending: Option<Vec<String>>,
}

impl AutoTag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<S: AsRef<str>>(&mut self, names: &[S]) {
        self.pending = Some(names.iter().map(|n| n.as_ref().to_string()).collect());
    }

    pub fn clear(&mut self) {
        self.pending = Some(Vec::new());
    }

    pub fn is_set(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending names, leaving the value unset
    pub fn take(&mut self) -> Option<Vec<String>> {
        self.pending.take()
    }
}

/// Hooks the persistence layer invokes around entity writes
#[async_trait]
pub trait EntityObserver<E: HasTags + Sync>: Send + Sync {
    /// Called before the entity row is deleted
    async fn before_delete(&self, entity: &E) -> Result<(), StorageError>;

    /// Called after the entity row is saved
    async fn after_save(&self, entity: &E, auto_tag: &mut AutoTag) -> Result<(), StorageError>;
}

/// Observer that keeps join rows consistent with entity lifecycle
#[derive(Clone)]
pub struct TaggingObserver {
    service: Arc<TaggingService>,
}

impl TaggingObserver {
    pub fn new(service: Arc<TaggingService>) -> Self {
        Self { service }
    }

    /// Per-type override first, then the service configuration
    pub fn untag_on_delete<E: HasTags>(&self) -> bool {
        E::untag_on_delete().unwrap_or(self.service.config().untag_on_delete)
    }
}

#[async_trait]
impl<E: HasTags + Sync> EntityObserver<E> for TaggingObserver {
    async fn before_delete(&self, entity: &E) -> Result<(), StorageError> {
        let taggable = self.service.for_entity(entity);

        if !self.untag_on_delete::<E>() {
            debug!("Keeping tags of deleted {}", taggable.taggable());
            return Ok(());
        }

        taggable.untag_all().await?;
        Ok(())
    }

    async fn after_save(&self, entity: &E, auto_tag: &mut AutoTag) -> Result<(), StorageError> {
        let Some(names) = auto_tag.take() else {
            return Ok(());
        };

        let taggable = self.service.for_entity(entity);
        if names.is_empty() {
            taggable.untag_all().await?;
        } else {
            taggable.retag(&names).await?;
        }

        Ok(())
    }
}
