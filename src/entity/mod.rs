//! In-memory representation of a single row.

pub mod dirty;

pub use dirty::DirtySet;

use crate::core::{FieldMap, GatewayError, Result, Value};
use crate::metadata::EntityType;
use std::sync::Arc;

/// One row of one entity type.
///
/// Every declared field is present and starts as [`Value::Null`]. Plain
/// assignment through [`Entity::set`] does not mark the field dirty; pair it
/// with [`Entity::mark_dirty`] or use [`Entity::assign`].
#[derive(Debug, Clone)]
pub struct Entity {
    entity_type: Arc<EntityType>,
    fields: FieldMap,
    dirty: DirtySet,
}

impl Entity {
    /// A new, unsaved entity with every field unset.
    pub fn new(entity_type: Arc<EntityType>) -> Self {
        let fields = entity_type
            .fields()
            .iter()
            .map(|f| (f.clone(), Value::Null))
            .collect();

        Self {
            entity_type,
            fields,
            dirty: DirtySet::new(),
        }
    }

    /// An entity populated from a stored record. Keys that are not declared
    /// fields of the type are dropped.
    pub fn from_record<I, K, V>(entity_type: Arc<EntityType>, record: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut entity = Self::new(entity_type);

        for (key, value) in record {
            let key = key.into();
            match entity.fields.get_mut(&key) {
                Some(slot) => *slot = value.into(),
                None => log::trace!(
                    "dropping undeclared field '{}' while loading '{}'",
                    key,
                    entity.entity_type.name()
                ),
            }
        }

        entity
    }

    pub fn type_name(&self) -> &str {
        self.entity_type.name()
    }

    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    /// `None` only for undeclared fields; unset fields read as `Null`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Plain assignment. Does not mark the field dirty.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<&mut Self> {
        match self.fields.get_mut(field) {
            Some(slot) => {
                *slot = value.into();
                Ok(self)
            }
            None => Err(self.unknown_field(field)),
        }
    }

    /// Assign and mark dirty in one step.
    pub fn assign(&mut self, field: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.set(field, value)?.mark_dirty(field)
    }

    /// Mark `field` as changed. Idempotent; undeclared names are rejected.
    pub fn mark_dirty(&mut self, field: &str) -> Result<&mut Self> {
        if !self.entity_type.declares(field) {
            return Err(self.unknown_field(field));
        }
        self.dirty.insert(field);
        Ok(self)
    }

    pub fn is_dirty(&self, field: &str) -> bool {
        self.dirty.contains(field)
    }

    pub fn dirty_fields(&self) -> &DirtySet {
        &self.dirty
    }

    pub fn has_changes(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Forget all dirty marks. Nothing in the gateway calls this implicitly.
    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }

    /// The dirty fields and their current values: the write payload.
    pub fn projection(&self) -> FieldMap {
        self.dirty
            .iter()
            .map(|field| {
                let value = self.fields.get(field).cloned().unwrap_or_default();
                (field.to_string(), value)
            })
            .collect()
    }

    /// The primary key value, if the type configures one and it is set.
    pub fn primary_key_value(&self) -> Option<&Value> {
        let pk = self.entity_type.meta().primary_key.as_deref()?;
        self.fields.get(pk).filter(|v| v.is_set())
    }

    /// True while the primary key is unset.
    pub fn is_new(&self) -> bool {
        self.primary_key_value().is_none()
    }

    fn unknown_field(&self, field: &str) -> GatewayError {
        GatewayError::UnknownField {
            entity: self.type_name().to_string(),
            field: field.to_string(),
        }
    }
}
