//! Per-entity-type metadata: declared fields, table, primary key and
//! validation rules.

pub mod declaration;
pub mod registry;

pub use declaration::{Declarations, EntityDeclaration};
pub use registry::MetadataRegistry;

use crate::core::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Field name to pipe-separated rule string, e.g. `"name" => "required|max_length[50]"`.
pub type ValidationRules = BTreeMap<String, String>;

/// The metadata keys an entity type can be asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaKey {
    TableName,
    PrimaryKey,
    ValidationRules,
    /// Answered from the field declarations, never from the metadata record.
    FieldList,
}

impl MetaKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TableName => "table_name",
            Self::PrimaryKey => "primary_key",
            Self::ValidationRules => "validation_rules",
            Self::FieldList => "field_list",
        }
    }
}

impl fmt::Display for MetaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetaKey {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "table_name" => Ok(Self::TableName),
            "primary_key" => Ok(Self::PrimaryKey),
            "validation_rules" => Ok(Self::ValidationRules),
            "field_list" => Ok(Self::FieldList),
            other => Err(GatewayError::Parse(format!(
                "Unknown metadata key '{}'",
                other
            ))),
        }
    }
}

/// The metadata record of one entity type. Every entry is optional; a record
/// with no entries at all counts as "no metadata".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_rules: Option<ValidationRules>,
}

impl EntityMeta {
    pub fn is_empty(&self) -> bool {
        self.table_name.is_none() && self.primary_key.is_none() && self.validation_rules.is_none()
    }
}

/// Result of a metadata lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Text(String),
    Rules(ValidationRules),
    Fields(Vec<String>),
    Record(EntityMeta),
}

/// A registered entity type: its name, declared fields and metadata record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityType {
    name: String,
    fields: Vec<String>,
    meta: EntityMeta,
}

impl EntityType {
    pub fn new(name: impl Into<String>, fields: Vec<String>, meta: EntityMeta) -> Self {
        Self {
            name: name.into(),
            fields,
            meta,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared field names, in declaration order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn declares(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn meta(&self) -> &EntityMeta {
        &self.meta
    }
}
