//! Built-in rule validator.
//!
//! Rule tokens look like `required`, `max_length[50]` or `enum[y,n]`. Every
//! rule except `required` passes on an empty value, so optional fields only
//! get checked once they hold something.

use super::{ValidationService, Validator};
use crate::core::Value;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

lazy_static! {
    static ref RULE_TOKEN: Regex = Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)(?:\[(.*)\])?$").unwrap();
    static ref INTEGER: Regex = Regex::new(r"^[-+]?[0-9]+$").unwrap();
    static ref NUMERIC: Regex = Regex::new(r"^[-+]?([0-9]+\.?[0-9]*|\.[0-9]+)$").unwrap();
    static ref ALPHA: Regex = Regex::new(r"^[A-Za-z]+$").unwrap();
    static ref ALPHA_NUMERIC: Regex = Regex::new(r"^[A-Za-z0-9]+$").unwrap();
    static ref ALPHA_DASH: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
    static ref EMAIL: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// A single named check.
pub trait ValidationRule: Send + Sync {
    fn check(&self, value: &Value, param: Option<&str>) -> bool;
}

impl<F> ValidationRule for F
where
    F: Fn(&Value, Option<&str>) -> bool + Send + Sync,
{
    fn check(&self, value: &Value, param: Option<&str>) -> bool {
        self(value, param)
    }
}

/// Split a rule token into its name and optional bracketed parameter.
pub fn parse_rule(token: &str) -> Option<(&str, Option<&str>)> {
    let caps = RULE_TOKEN.captures(token)?;
    let name = caps.get(1)?.as_str();
    Some((name, caps.get(2).map(|m| m.as_str())))
}

/// The set of rules a [`RuleValidator`] understands. Shared between the
/// validators it hands out.
#[derive(Clone)]
pub struct RuleSet {
    rules: Arc<HashMap<String, Arc<dyn ValidationRule>>>,
}

impl RuleSet {
    /// The built-in rules.
    pub fn new() -> Self {
        let mut rules: HashMap<String, Arc<dyn ValidationRule>> = HashMap::new();
        rules.insert("required".into(), Arc::new(required));
        rules.insert("integer".into(), Arc::new(integer));
        rules.insert("numeric".into(), Arc::new(numeric));
        rules.insert("is_natural".into(), Arc::new(is_natural));
        rules.insert("is_natural_no_zero".into(), Arc::new(is_natural_no_zero));
        rules.insert("alpha".into(), Arc::new(|v: &Value, _: Option<&str>| matches_text(v, &ALPHA)));
        rules.insert(
            "alpha_numeric".into(),
            Arc::new(|v: &Value, _: Option<&str>| matches_text(v, &ALPHA_NUMERIC)),
        );
        rules.insert(
            "alpha_dash".into(),
            Arc::new(|v: &Value, _: Option<&str>| matches_text(v, &ALPHA_DASH)),
        );
        rules.insert(
            "valid_email".into(),
            Arc::new(|v: &Value, _: Option<&str>| matches_text(v, &EMAIL)),
        );
        rules.insert("boolean".into(), Arc::new(boolean));
        rules.insert("min_length".into(), Arc::new(min_length));
        rules.insert("max_length".into(), Arc::new(max_length));
        rules.insert("exact_length".into(), Arc::new(exact_length));
        rules.insert("greater_than".into(), Arc::new(greater_than));
        rules.insert("less_than".into(), Arc::new(less_than));
        rules.insert("enum".into(), Arc::new(one_of));

        Self {
            rules: Arc::new(rules),
        }
    }

    /// Add or replace a rule. Returns a new set.
    pub fn with_rule(self, name: &str, rule: impl ValidationRule + 'static) -> Self {
        let mut rules = (*self.rules).clone();
        rules.insert(name.to_string(), Arc::new(rule));
        Self {
            rules: Arc::new(rules),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn rule_validator(&self) -> RuleValidator {
        RuleValidator {
            rules: self.clone(),
            failed: Vec::new(),
        }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationService for RuleSet {
    fn validator(&self) -> Box<dyn Validator> {
        Box::new(self.rule_validator())
    }
}

/// Runs rule tokens against a value and remembers which failed.
pub struct RuleValidator {
    rules: RuleSet,
    failed: Vec<String>,
}

impl Validator for RuleValidator {
    fn validate(&mut self, rules: &[&str], value: &Value) -> bool {
        self.failed.clear();

        for token in rules {
            let Some((name, param)) = parse_rule(token) else {
                log::warn!("malformed validation rule '{}'", token);
                self.failed.push((*token).to_string());
                continue;
            };

            let passed = match self.rules.rules.get(name) {
                Some(_) if name != "required" && is_empty(value) => true,
                Some(rule) => rule.check(value, param),
                None => {
                    log::warn!("unknown validation rule '{}'", name);
                    false
                }
            };

            if !passed {
                self.failed.push(name.to_string());
            }
        }

        self.failed.is_empty()
    }

    fn failed_rules(&self) -> &[String] {
        &self.failed
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Text(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn text_of(value: &Value) -> String {
    value.to_string()
}

fn matches_text(value: &Value, pattern: &Regex) -> bool {
    match value {
        Value::Text(s) => pattern.is_match(s),
        Value::Integer(_) | Value::Float(_) => pattern.is_match(&text_of(value)),
        _ => false,
    }
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(_) | Value::Float(_) => value.as_f64(),
        Value::Text(s) if NUMERIC.is_match(s.trim()) => s.trim().parse().ok(),
        _ => None,
    }
}

fn integer_of(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(_) | Value::Float(_) => value.as_i64(),
        Value::Text(s) if INTEGER.is_match(s.trim()) => s.trim().parse().ok(),
        _ => None,
    }
}

fn param_usize(name: &str, param: Option<&str>) -> Option<usize> {
    let parsed = param.and_then(|p| p.trim().parse().ok());
    if parsed.is_none() {
        log::warn!("rule '{}' needs a numeric parameter, got {:?}", name, param);
    }
    parsed
}

fn param_f64(name: &str, param: Option<&str>) -> Option<f64> {
    let parsed = param.and_then(|p| p.trim().parse().ok());
    if parsed.is_none() {
        log::warn!("rule '{}' needs a numeric parameter, got {:?}", name, param);
    }
    parsed
}

fn required(value: &Value, _: Option<&str>) -> bool {
    !is_empty(value)
}

fn integer(value: &Value, _: Option<&str>) -> bool {
    integer_of(value).is_some()
}

fn numeric(value: &Value, _: Option<&str>) -> bool {
    number_of(value).is_some()
}

fn is_natural(value: &Value, _: Option<&str>) -> bool {
    integer_of(value).is_some_and(|i| i >= 0)
}

fn is_natural_no_zero(value: &Value, _: Option<&str>) -> bool {
    integer_of(value).is_some_and(|i| i > 0)
}

fn boolean(value: &Value, _: Option<&str>) -> bool {
    match value {
        Value::Boolean(_) => true,
        Value::Integer(i) => *i == 0 || *i == 1,
        Value::Text(s) => matches!(s.as_str(), "y" | "n" | "true" | "false" | "1" | "0"),
        _ => false,
    }
}

fn min_length(value: &Value, param: Option<&str>) -> bool {
    param_usize("min_length", param).is_some_and(|n| text_of(value).chars().count() >= n)
}

fn max_length(value: &Value, param: Option<&str>) -> bool {
    param_usize("max_length", param).is_some_and(|n| text_of(value).chars().count() <= n)
}

fn exact_length(value: &Value, param: Option<&str>) -> bool {
    param_usize("exact_length", param).is_some_and(|n| text_of(value).chars().count() == n)
}

fn greater_than(value: &Value, param: Option<&str>) -> bool {
    match (number_of(value), param_f64("greater_than", param)) {
        (Some(v), Some(limit)) => v > limit,
        _ => false,
    }
}

fn less_than(value: &Value, param: Option<&str>) -> bool {
    match (number_of(value), param_f64("less_than", param)) {
        (Some(v), Some(limit)) => v < limit,
        _ => false,
    }
}

fn one_of(value: &Value, param: Option<&str>) -> bool {
    let text = text_of(value);
    param.is_some_and(|list| list.split(',').any(|choice| choice.trim() == text))
}
