use crate::core::{Result, Value};
use crate::entity::Entity;
use crate::metadata::MetadataRegistry;
use crate::persistence::PersistenceDispatcher;
use crate::storage::StorageDriver;
use crate::validation::{Errors, RuleSet, ValidationDispatcher, ValidationService};

/// Row data gateway over an injected storage driver and validation service.
///
/// ```
/// use rowgate::{EntityDeclaration, Gateway, MemoryDriver, MetadataRegistry};
///
/// # fn main() -> rowgate::Result<()> {
/// let registry = MetadataRegistry::new().with_entity(
///     EntityDeclaration::new("Widget")
///         .table("widgets")
///         .primary_key("id")
///         .fields(["id", "name"])
///         .rule("name", "required"),
/// )?;
/// let driver = MemoryDriver::new().with_table("widgets", Some("id"))?;
/// let gateway = Gateway::new(registry, driver);
///
/// let mut widget = gateway.new_entity("Widget")?;
/// widget.assign("name", "Nut")?;
/// assert!(gateway.validate(&widget)?.is_empty());
/// gateway.save(&widget)?;
/// assert_eq!(gateway.driver().rows("widgets")?.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct Gateway<D, S = RuleSet> {
    validation: ValidationDispatcher<S>,
    persistence: PersistenceDispatcher<D>,
}

impl<D: StorageDriver> Gateway<D, RuleSet> {
    /// Gateway using the built-in rule set.
    pub fn new(registry: MetadataRegistry, driver: D) -> Self {
        Self::with_validation(registry, driver, RuleSet::new())
    }
}

impl<D: StorageDriver, S: ValidationService> Gateway<D, S> {
    pub fn with_validation(registry: MetadataRegistry, driver: D, service: S) -> Self {
        Self {
            validation: ValidationDispatcher::new(registry.clone(), service),
            persistence: PersistenceDispatcher::new(registry, driver),
        }
    }

    pub fn registry(&self) -> &MetadataRegistry {
        self.persistence.registry()
    }

    pub fn driver(&self) -> &D {
        self.persistence.driver()
    }

    pub fn new_entity(&self, entity_type: &str) -> Result<Entity> {
        self.registry().new_entity(entity_type)
    }

    pub fn load_entity<I, K, V>(&self, entity_type: &str, record: I) -> Result<Entity>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.registry().load_entity(entity_type, record)
    }

    pub fn validate(&self, entity: &Entity) -> Result<Errors> {
        self.validation.validate(entity)
    }

    pub fn save(&self, entity: &Entity) -> Result<()> {
        self.persistence.save(entity)
    }

    pub fn restore(&self, entity: &Entity) -> Result<()> {
        self.persistence.restore(entity)
    }

    pub fn delete(&self, entity: &Entity) -> Result<()> {
        self.persistence.delete(entity)
    }

    /// Validate, then save only if nothing failed. The returned errors are
    /// empty exactly when the save went through.
    pub fn validate_and_save(&self, entity: &Entity) -> Result<Errors> {
        let errors = self.validate(entity)?;
        if errors.has_errors() {
            log::debug!("not saving '{}': {}", entity.type_name(), errors);
            return Ok(errors);
        }
        self.save(entity)?;
        Ok(errors)
    }
}
