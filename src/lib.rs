// ============================================================================
// rowgate: Row Data Gateway kernel
// ============================================================================

pub mod core;
pub mod entity;
pub mod facade;
pub mod metadata;
pub mod persistence;
pub mod storage;
pub mod validation;

// Re-export main types for convenience
pub use crate::core::{FieldMap, GatewayError, Result, Value, field_map};
pub use entity::{DirtySet, Entity};
pub use facade::Gateway;
pub use metadata::{
    Declarations, EntityDeclaration, EntityMeta, EntityType, MetaKey, MetaValue,
    MetadataRegistry, ValidationRules,
};
pub use persistence::PersistenceDispatcher;
pub use storage::{MemoryDriver, MemoryError, StorageDriver, WriteOp};
pub use validation::{
    Errors, RuleSet, RuleValidator, ValidationDispatcher, ValidationError, ValidationRule,
    ValidationService, Validator,
};
