use crate::core::{FieldMap, Result, Value};
use std::sync::Arc;

/// Storage driver trait - the gateway's only way to touch a database.
///
/// Calls are synchronous. Failures come back as `GatewayError::Storage` and
/// are passed through the gateway untouched.
pub trait StorageDriver: Send + Sync {
    /// Insert a row built from `fields` into `table`
    fn insert(&self, table: &str, fields: &FieldMap) -> Result<()>;

    /// Write `fields` to the rows of `table` where `key_field = key_value`
    fn update(&self, table: &str, key_field: &str, key_value: &Value, fields: &FieldMap) -> Result<()>;

    /// Remove the rows of `table` where `key_field = key_value`
    fn delete(&self, table: &str, key_field: &str, key_value: &Value) -> Result<()>;
}

impl<D: StorageDriver + ?Sized> StorageDriver for Arc<D> {
    fn insert(&self, table: &str, fields: &FieldMap) -> Result<()> {
        (**self).insert(table, fields)
    }

    fn update(&self, table: &str, key_field: &str, key_value: &Value, fields: &FieldMap) -> Result<()> {
        (**self).update(table, key_field, key_value, fields)
    }

    fn delete(&self, table: &str, key_field: &str, key_value: &Value) -> Result<()> {
        (**self).delete(table, key_field, key_value)
    }
}
