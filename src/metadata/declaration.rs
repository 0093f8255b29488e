use super::{EntityMeta, EntityType, ValidationRules};
use crate::core::{GatewayError, Result};
use serde::{Deserialize, Serialize};

/// A JSON declarations document: `{ "entities": [ ... ] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Declarations {
    pub entities: Vec<EntityDeclaration>,
}

/// Declaration of one entity type, either built in code or read from JSON.
///
/// ```
/// use rowgate::EntityDeclaration;
///
/// let widget = EntityDeclaration::new("Widget")
///     .table("widgets")
///     .primary_key("id")
///     .fields(["id", "name"])
///     .rule("name", "required|max_length[50]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDeclaration {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_rules: Option<ValidationRules>,
}

impl EntityDeclaration {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
            table_name: None,
            primary_key: None,
            validation_rules: None,
        }
    }

    /// Set the backing table
    pub fn table(mut self, table_name: &str) -> Self {
        self.table_name = Some(table_name.to_string());
        self
    }

    /// Set the primary key field
    pub fn primary_key(mut self, field: &str) -> Self {
        self.primary_key = Some(field.to_string());
        self
    }

    /// Declare one field
    pub fn field(mut self, field: &str) -> Self {
        self.fields.push(field.to_string());
        self
    }

    /// Declare several fields
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Attach a pipe-separated rule string to a field
    pub fn rule(mut self, field: &str, rules: &str) -> Self {
        self.validation_rules
            .get_or_insert_with(ValidationRules::new)
            .insert(field.to_string(), rules.to_string());
        self
    }

    pub(crate) fn into_entity_type(self) -> Result<EntityType> {
        if self.name.trim().is_empty() {
            return Err(GatewayError::Configuration(
                "Entity type name cannot be empty".to_string(),
            ));
        }

        let mut fields: Vec<String> = Vec::with_capacity(self.fields.len());
        for field in self.fields {
            if fields.contains(&field) {
                return Err(GatewayError::Configuration(format!(
                    "Field '{}' declared twice on entity '{}'",
                    field, self.name
                )));
            }
            fields.push(field);
        }

        if let Some(pk) = &self.primary_key {
            if !fields.contains(pk) {
                return Err(GatewayError::Configuration(format!(
                    "Primary key '{}' is not a declared field of entity '{}'",
                    pk, self.name
                )));
            }
        }

        if let Some(rules) = &self.validation_rules {
            for field in rules.keys().filter(|f| !fields.contains(*f)) {
                log::warn!(
                    "validation rule for undeclared field '{}' on entity '{}' will never run",
                    field,
                    self.name
                );
            }
        }

        let meta = EntityMeta {
            table_name: self.table_name,
            primary_key: self.primary_key,
            validation_rules: self.validation_rules,
        };

        Ok(EntityType::new(self.name, fields, meta))
    }
}
