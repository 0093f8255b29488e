//! Insert / update / delete decisions for a single entity.

use crate::core::{GatewayError, Result};
use crate::entity::Entity;
use crate::metadata::MetadataRegistry;
use crate::storage::StorageDriver;

/// Turns an entity's dirty state into calls on a [`StorageDriver`].
///
/// Neither `save` nor `restore` validates or clears the dirty set; calling
/// either twice issues the same write twice.
pub struct PersistenceDispatcher<D> {
    registry: MetadataRegistry,
    driver: D,
}

impl<D: StorageDriver> PersistenceDispatcher<D> {
    pub fn new(registry: MetadataRegistry, driver: D) -> Self {
        Self { registry, driver }
    }

    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Update when the primary key is set, insert otherwise. A clean entity
    /// is a no-op.
    pub fn save(&self, entity: &Entity) -> Result<()> {
        if !entity.has_changes() {
            return Ok(());
        }

        let entity_type = entity.type_name();
        let table = self.registry.table_name(entity_type)?;
        let primary_key = self.registry.primary_key(entity_type)?;
        let projection = entity.projection();

        match entity.get(primary_key).filter(|v| v.is_set()) {
            Some(key_value) => {
                log::debug!(
                    "update {} where {} = {}: {:?}",
                    table,
                    primary_key,
                    key_value,
                    projection.keys().collect::<Vec<_>>()
                );
                self.driver.update(table, primary_key, key_value, &projection)
            }
            None => {
                log::debug!(
                    "insert into {}: {:?}",
                    table,
                    projection.keys().collect::<Vec<_>>()
                );
                self.driver.insert(table, &projection)
            }
        }
    }

    /// Always insert, keeping whatever primary key the entity carries. Used to
    /// rebuild rows from a backup. A clean entity is a no-op.
    pub fn restore(&self, entity: &Entity) -> Result<()> {
        if !entity.has_changes() {
            return Ok(());
        }

        let table = self.registry.table_name(entity.type_name())?;
        let projection = entity.projection();

        log::debug!(
            "restore into {}: {:?}",
            table,
            projection.keys().collect::<Vec<_>>()
        );
        self.driver.insert(table, &projection)
    }

    /// Delete the stored row. The entity itself is left as it was and should
    /// not be saved again.
    pub fn delete(&self, entity: &Entity) -> Result<()> {
        let entity_type = entity.type_name();
        let primary_key = self.registry.primary_key(entity_type)?;

        let Some(key_value) = entity.get(primary_key).filter(|v| v.is_set()) else {
            return Err(GatewayError::InvalidState(format!(
                "Cannot delete a '{}' without an identifier",
                entity_type
            )));
        };

        let table = self.registry.table_name(entity_type)?;

        log::debug!("delete from {} where {} = {}", table, primary_key, key_value);
        self.driver.delete(table, primary_key, key_value)
    }
}
