use super::StorageDriver;
use crate::core::{FieldMap, GatewayError, Result, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Errors raised by [`MemoryDriver`]. They reach callers wrapped in
/// `GatewayError::Storage` with their message unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Duplicate key {key} in table '{table}'")]
    DuplicateKey { table: String, key: String },

    #[error("Key space exhausted in table '{0}'")]
    KeyOverflow(String),
}

impl From<MemoryError> for GatewayError {
    fn from(err: MemoryError) -> Self {
        GatewayError::storage(err)
    }
}

/// One write issued against the driver, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Insert {
        table: String,
        fields: FieldMap,
    },
    Update {
        table: String,
        key_field: String,
        key_value: Value,
        fields: FieldMap,
    },
    Delete {
        table: String,
        key_field: String,
        key_value: Value,
    },
}

#[derive(Debug, Clone)]
struct MemoryTable {
    /// Auto-increment column, if any
    key_field: Option<String>,
    next_id: i64,
    rows: Vec<FieldMap>,
}

impl MemoryTable {
    fn matches(row: &FieldMap, key_field: &str, key_value: &Value) -> bool {
        row.get(key_field).is_some_and(|v| v == key_value)
    }
}

/// In-memory storage driver.
///
/// Tables must be created before use. A table created with a key field gets
/// auto-increment behavior: inserts without a key receive the next id,
/// inserts with a key keep it verbatim. Every successful write is recorded in
/// order.
#[derive(Debug, Default)]
pub struct MemoryDriver {
    tables: Mutex<HashMap<String, MemoryTable>>,
    writes: Mutex<Vec<WriteOp>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style table creation
    pub fn with_table(self, table: &str, key_field: Option<&str>) -> Result<Self> {
        self.create_table(table, key_field)?;
        Ok(self)
    }

    pub fn create_table(&self, table: &str, key_field: Option<&str>) -> Result<()> {
        let mut tables = self.tables.lock()?;
        tables.entry(table.to_string()).or_insert_with(|| MemoryTable {
            key_field: key_field.map(str::to_string),
            next_id: 1,
            rows: Vec::new(),
        });
        Ok(())
    }

    /// Current rows of `table`, in insertion order.
    pub fn rows(&self, table: &str) -> Result<Vec<FieldMap>> {
        let tables = self.tables.lock()?;
        let entry = tables
            .get(table)
            .ok_or_else(|| MemoryError::TableNotFound(table.to_string()))?;
        Ok(entry.rows.clone())
    }

    /// First row of `table` where `key_field = key_value`.
    pub fn find(&self, table: &str, key_field: &str, key_value: &Value) -> Result<Option<FieldMap>> {
        let tables = self.tables.lock()?;
        let entry = tables
            .get(table)
            .ok_or_else(|| MemoryError::TableNotFound(table.to_string()))?;
        Ok(entry
            .rows
            .iter()
            .find(|row| MemoryTable::matches(row, key_field, key_value))
            .cloned())
    }

    /// Every write applied so far. Rejected writes are not recorded.
    pub fn writes(&self) -> Result<Vec<WriteOp>> {
        Ok(self.writes.lock()?.clone())
    }

    fn record(&self, op: WriteOp) -> Result<()> {
        self.writes.lock()?.push(op);
        Ok(())
    }
}

impl StorageDriver for MemoryDriver {
    fn insert(&self, table: &str, fields: &FieldMap) -> Result<()> {
        let mut tables = self.tables.lock()?;
        let entry = tables
            .get_mut(table)
            .ok_or_else(|| MemoryError::TableNotFound(table.to_string()))?;

        let mut row = fields.clone();

        if let Some(key_field) = entry.key_field.clone() {
            match row.get(&key_field).filter(|v| v.is_set()).cloned() {
                Some(key) => {
                    if entry.rows.iter().any(|r| MemoryTable::matches(r, &key_field, &key)) {
                        return Err(MemoryError::DuplicateKey {
                            table: table.to_string(),
                            key: key.to_string(),
                        }
                        .into());
                    }
                    if let Some(id) = key.as_i64() {
                        let next = id
                            .checked_add(1)
                            .ok_or_else(|| MemoryError::KeyOverflow(table.to_string()))?;
                        entry.next_id = entry.next_id.max(next);
                    }
                }
                None => {
                    let id = entry.next_id;
                    entry.next_id = id
                        .checked_add(1)
                        .ok_or_else(|| MemoryError::KeyOverflow(table.to_string()))?;
                    row.insert(key_field, Value::Integer(id));
                }
            }
        }

        log::trace!("insert into '{}': {:?}", table, row);
        entry.rows.push(row);
        self.record(WriteOp::Insert {
            table: table.to_string(),
            fields: fields.clone(),
        })
    }

    fn update(&self, table: &str, key_field: &str, key_value: &Value, fields: &FieldMap) -> Result<()> {
        let mut tables = self.tables.lock()?;
        let entry = tables
            .get_mut(table)
            .ok_or_else(|| MemoryError::TableNotFound(table.to_string()))?;

        let mut affected = 0;
        for row in entry
            .rows
            .iter_mut()
            .filter(|row| MemoryTable::matches(row, key_field, key_value))
        {
            row.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            affected += 1;
        }

        log::trace!(
            "update '{}' where {} = {}: {} row(s)",
            table,
            key_field,
            key_value,
            affected
        );
        self.record(WriteOp::Update {
            table: table.to_string(),
            key_field: key_field.to_string(),
            key_value: key_value.clone(),
            fields: fields.clone(),
        })
    }

    fn delete(&self, table: &str, key_field: &str, key_value: &Value) -> Result<()> {
        let mut tables = self.tables.lock()?;
        let entry = tables
            .get_mut(table)
            .ok_or_else(|| MemoryError::TableNotFound(table.to_string()))?;

        let before = entry.rows.len();
        entry
            .rows
            .retain(|row| !MemoryTable::matches(row, key_field, key_value));

        log::trace!(
            "delete from '{}' where {} = {}: {} row(s)",
            table,
            key_field,
            key_value,
            before - entry.rows.len()
        );
        self.record(WriteOp::Delete {
            table: table.to_string(),
            key_field: key_field.to_string(),
            key_value: key_value.clone(),
        })
    }
}
