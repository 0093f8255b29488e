use super::{EntityDeclaration, EntityMeta, EntityType, MetaKey, MetaValue, ValidationRules};
use crate::core::{GatewayError, Result, Value};
use crate::entity::Entity;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Process-wide lookup of entity type metadata.
///
/// Built once at startup and read-only afterwards. Clones share the same map,
/// so handing a registry to every gateway is cheap.
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    types: Arc<HashMap<String, Arc<EntityType>>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity type. Returns a new registry; `self` is consumed.
    pub fn with_entity(self, declaration: EntityDeclaration) -> Result<Self> {
        let entity_type = declaration.into_entity_type()?;
        let name = entity_type.name().to_string();

        if self.types.contains_key(&name) {
            return Err(GatewayError::Configuration(format!(
                "Entity type '{}' is already registered",
                name
            )));
        }

        log::debug!(
            "registered entity type '{}' ({} fields)",
            name,
            entity_type.fields().len()
        );

        let mut types = (*self.types).clone();
        types.insert(name, Arc::new(entity_type));

        Ok(Self {
            types: Arc::new(types),
        })
    }

    /// Build a registry from a JSON declarations document.
    pub fn from_json(json: &str) -> Result<Self> {
        let declarations: super::Declarations = serde_json::from_str(json)?;
        declarations
            .entities
            .into_iter()
            .try_fold(Self::new(), Self::with_entity)
    }

    /// Build a registry from a JSON declarations file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::Configuration(format!(
                "Cannot read declarations from '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }

    pub fn entity_type(&self, name: &str) -> Result<Arc<EntityType>> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| GatewayError::missing_metadata(name))
    }

    /// A new, unsaved entity of the named type.
    pub fn new_entity(&self, name: &str) -> Result<Entity> {
        Ok(Entity::new(self.entity_type(name)?))
    }

    /// An entity of the named type populated from a stored record.
    pub fn load_entity<I, K, V>(&self, name: &str, record: I) -> Result<Entity>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Ok(Entity::from_record(self.entity_type(name)?, record))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn entity_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Look up metadata for `entity_type`.
    ///
    /// * `FieldList` answers from the field declarations.
    /// * An entity type without any metadata is a configuration error.
    /// * `None` as key returns the whole record.
    /// * A key the record does not configure returns `Ok(None)`.
    pub fn get_metadata(&self, entity_type: &str, key: Option<MetaKey>) -> Result<Option<MetaValue>> {
        let entry = self.lookup(entity_type)?;

        let value = match key {
            Some(MetaKey::FieldList) => Some(MetaValue::Fields(entry.fields().to_vec())),
            None => Some(MetaValue::Record(Self::meta_of(entry)?.clone())),
            Some(MetaKey::TableName) => Self::meta_of(entry)?.table_name.clone().map(MetaValue::Text),
            Some(MetaKey::PrimaryKey) => Self::meta_of(entry)?.primary_key.clone().map(MetaValue::Text),
            Some(MetaKey::ValidationRules) => Self::meta_of(entry)?
                .validation_rules
                .clone()
                .map(MetaValue::Rules),
        };

        Ok(value)
    }

    pub fn field_list(&self, entity_type: &str) -> Result<&[String]> {
        Ok(self.lookup(entity_type)?.fields())
    }

    pub fn table_name(&self, entity_type: &str) -> Result<&str> {
        Self::meta_of(self.lookup(entity_type)?)?
            .table_name
            .as_deref()
            .ok_or_else(|| {
                GatewayError::Configuration(format!(
                    "Entity type '{}' has no table_name",
                    entity_type
                ))
            })
    }

    pub fn primary_key(&self, entity_type: &str) -> Result<&str> {
        Self::meta_of(self.lookup(entity_type)?)?
            .primary_key
            .as_deref()
            .ok_or_else(|| {
                GatewayError::Configuration(format!(
                    "Entity type '{}' has no primary_key",
                    entity_type
                ))
            })
    }

    /// `Ok(None)` when the type configures no rules at all.
    pub fn validation_rules(&self, entity_type: &str) -> Result<Option<&ValidationRules>> {
        Ok(Self::meta_of(self.lookup(entity_type)?)?
            .validation_rules
            .as_ref())
    }

    fn lookup(&self, entity_type: &str) -> Result<&EntityType> {
        self.types
            .get(entity_type)
            .map(|entry| &**entry)
            .ok_or_else(|| GatewayError::missing_metadata(entity_type))
    }

    fn meta_of(entry: &EntityType) -> Result<&EntityMeta> {
        let meta = entry.meta();
        if meta.is_empty() {
            return Err(GatewayError::missing_metadata(entry.name()));
        }
        Ok(meta)
    }
}
