//! Validation of dirty fields against an entity type's rule strings.

pub mod errors;
pub mod rules;

pub use errors::{Errors, ValidationError};
pub use rules::{RuleSet, RuleValidator, ValidationRule};

use crate::core::{Result, Value};
use crate::entity::Entity;
use crate::metadata::MetadataRegistry;

/// Checks one value against an ordered list of rule names.
pub trait Validator {
    /// `true` when every rule passed.
    fn validate(&mut self, rules: &[&str], value: &Value) -> bool;

    /// Rules that failed during the last `validate` call, in rule order.
    fn failed_rules(&self) -> &[String];
}

/// Hands out a fresh [`Validator`] for each field being checked.
pub trait ValidationService: Send + Sync {
    fn validator(&self) -> Box<dyn Validator>;
}

/// Runs an entity's dirty fields through the configured rules.
pub struct ValidationDispatcher<S> {
    registry: MetadataRegistry,
    service: S,
}

impl<S: ValidationService> ValidationDispatcher<S> {
    pub fn new(registry: MetadataRegistry, service: S) -> Self {
        Self { registry, service }
    }

    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    /// Validate the dirty fields of `entity`.
    ///
    /// Failed rules come back as data, ordered by dirty-set order and then by
    /// rule order. `Err` is reserved for missing metadata. The dirty set is
    /// left alone.
    pub fn validate(&self, entity: &Entity) -> Result<Errors> {
        let mut errors = Errors::new();

        if !entity.has_changes() {
            return Ok(errors);
        }

        let Some(rules) = self.registry.validation_rules(entity.type_name())? else {
            return Ok(errors);
        };

        for field in entity.dirty_fields().iter() {
            let Some(rule_string) = rules.get(field) else {
                continue;
            };

            let rule_list = split_rules(rule_string);
            let value = entity.get(field).cloned().unwrap_or_default();

            let mut validator = self.service.validator();
            if !validator.validate(&rule_list, &value) {
                for rule in validator.failed_rules() {
                    errors.add_error(ValidationError::new(field, rule.as_str()));
                }
            }
        }

        if errors.has_errors() {
            log::debug!(
                "validation of '{}' failed: {}",
                entity.type_name(),
                errors
            );
        }

        Ok(errors)
    }
}

/// Split a pipe-separated rule string into rule tokens.
pub fn split_rules(rule_string: &str) -> Vec<&str> {
    rule_string
        .split('|')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::EntityDeclaration;

    /// Fails every rule named `fail`, recording each one.
    struct StubValidator {
        failed: Vec<String>,
    }

    impl Validator for StubValidator {
        fn validate(&mut self, rules: &[&str], _value: &Value) -> bool {
            self.failed = rules
                .iter()
                .filter(|r| r.starts_with("fail"))
                .map(|r| r.to_string())
                .collect();
            self.failed.is_empty()
        }

        fn failed_rules(&self) -> &[String] {
            &self.failed
        }
    }

    struct StubService;

    impl ValidationService for StubService {
        fn validator(&self) -> Box<dyn Validator> {
            Box::new(StubValidator { failed: Vec::new() })
        }
    }

    fn registry() -> MetadataRegistry {
        MetadataRegistry::new()
            .with_entity(
                EntityDeclaration::new("Widget")
                    .table("widgets")
                    .primary_key("id")
                    .fields(["id", "name", "sku", "note"])
                    .rule("name", "fail_a|ok|fail_b")
                    .rule("sku", "fail_c"),
            )
            .unwrap()
            .with_entity(
                EntityDeclaration::new("Plain")
                    .table("plain")
                    .primary_key("id")
                    .fields(["id", "name"]),
            )
            .unwrap()
            .with_entity(EntityDeclaration::new("Bare").fields(["id"]))
            .unwrap()
    }

    #[test]
    fn test_split_rules() {
        assert_eq!(split_rules("required|max_length[5]"), vec!["required", "max_length[5]"]);
        assert_eq!(split_rules("required||"), vec!["required"]);
        assert!(split_rules("").is_empty());
    }

    #[test]
    fn test_clean_entity_skips_metadata() {
        let registry = registry();
        let dispatcher = ValidationDispatcher::new(registry.clone(), StubService);
        // No metadata at all, but nothing is dirty so nothing is looked up.
        let bare = registry.new_entity("Bare").unwrap();
        assert!(dispatcher.validate(&bare).unwrap().is_empty());
    }

    #[test]
    fn test_missing_metadata_propagates() {
        let registry = registry();
        let dispatcher = ValidationDispatcher::new(registry.clone(), StubService);
        let mut bare = registry.new_entity("Bare").unwrap();
        bare.mark_dirty("id").unwrap();
        assert!(dispatcher.validate(&bare).is_err());
    }

    #[test]
    fn test_no_rules_configured() {
        let registry = registry();
        let dispatcher = ValidationDispatcher::new(registry.clone(), StubService);
        let mut plain = registry.new_entity("Plain").unwrap();
        plain.mark_dirty("name").unwrap().mark_dirty("id").unwrap();
        assert!(dispatcher.validate(&plain).unwrap().is_empty());
    }

    #[test]
    fn test_errors_follow_dirty_then_rule_order() {
        let registry = registry();
        let dispatcher = ValidationDispatcher::new(registry.clone(), StubService);
        let mut widget = registry.new_entity("Widget").unwrap();
        widget
            .mark_dirty("note")
            .unwrap()
            .mark_dirty("sku")
            .unwrap()
            .mark_dirty("name")
            .unwrap();

        let errors = dispatcher.validate(&widget).unwrap();
        let pairs: Vec<(String, String)> = errors
            .iter()
            .map(|e| (e.field.clone(), e.rule.clone()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("sku".to_string(), "fail_c".to_string()),
                ("name".to_string(), "fail_a".to_string()),
                ("name".to_string(), "fail_b".to_string()),
            ]
        );
        // Validation leaves the dirty set untouched.
        assert_eq!(widget.dirty_fields().len(), 3);
    }
}
