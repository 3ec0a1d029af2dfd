//! Instance validator
//!
//! Validation semantics:
//! - Every field in the instance's lineage with a rule and a stored value
//!   is checked; unset fields are skipped
//! - Pattern rules must match the value's whole textual form
//! - Type rules require an instance of (or subtype of) the named type
//! - One message per failing field, lineage root first, declaration order
//!
//! Validation never mutates the instance and never fails: an empty list
//! means the instance is valid.

use super::registry::ClassRegistry;
use super::rules::ValidationRule;
use crate::object::{Object, Value};
use crate::observability::{Event, Severity};

/// Applies registered rules to an instance.
pub struct Validator<'a> {
    registry: &'a ClassRegistry,
}

impl<'a> Validator<'a> {
    pub fn new(registry: &'a ClassRegistry) -> Self {
        Self { registry }
    }

    /// Failure messages for `object`, each shaped
    /// `"<field> = <value> is not <description>"`.
    pub fn validate(&self, object: &Object) -> Vec<String> {
        let rules = match self.registry.rules_for(object.class()) {
            Ok(rules) => rules,
            Err(e) => {
                self.registry.log(
                    Severity::Error,
                    Event::ValidationFailed,
                    &[("class", object.class_name()), ("error", &e.to_string())],
                );
                return Vec::new();
            }
        };

        let mut messages = Vec::new();
        for (field, slot, rule) in &rules {
            let value = match object.slot(*slot) {
                Ok(v) if v.is_defined() => v,
                _ => continue,
            };
            if !self.satisfies(value, rule) {
                messages.push(format!("{} = {} is not {}", field, value, rule.description()));
            }
        }

        self.registry.metrics().record_validation(messages.len());
        if !messages.is_empty() && self.registry.config().log_validation_failures {
            self.registry.log(
                Severity::Warn,
                Event::ValidationFailed,
                &[
                    ("class", object.class_name()),
                    ("failures", &messages.len().to_string()),
                ],
            );
        }
        messages
    }

    fn satisfies(&self, value: &Value, rule: &ValidationRule) -> bool {
        match rule {
            ValidationRule::Pattern { regex, .. } => regex.is_match(&value.to_string()),
            ValidationRule::Type(type_name) => self.registry.type_matches(value, type_name),
        }
    }
}
