use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One problem found on a row, attributed to a column where possible
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub field: Option<String>,
    pub message: String,
}

impl RowError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.to_string()),
            message: message.into(),
        }
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}: {}", field, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Result of a validation rule check
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<RowError>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn invalid(error: RowError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Merge two validation results
    pub fn merge(mut self, other: ValidationResult) -> Self {
        self.errors.extend(other.errors);
        self
    }
}

/// Trait for validation rules in the chain of responsibility pattern
pub trait ValidationRule<C>: Send + Sync {
    /// Execute this validation rule
    fn validate(&self, context: &C) -> ValidationResult;

    /// Get the name of this validation rule for logging
    fn rule_name(&self) -> &'static str;

    /// Check if this rule should be skipped based on context
    fn should_skip(&self, _context: &C) -> bool {
        false
    }
}

/// Chain of validation rules implementing Chain of Responsibility pattern
pub struct ValidationChain<C> {
    rules: Vec<Arc<dyn ValidationRule<C>>>,
    stop_on_first_error: bool,
}

impl<C> Clone for ValidationChain<C> {
    fn clone(&self) -> Self {
        Self {
            rules: self.rules.clone(),
            stop_on_first_error: self.stop_on_first_error,
        }
    }
}

impl<C> ValidationChain<C> {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            stop_on_first_error: false,
        }
    }

    /// Add a validation rule to the chain
    pub fn add_rule(mut self, rule: Arc<dyn ValidationRule<C>>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Set whether to stop validation on first error
    pub fn stop_on_first_error(mut self, stop: bool) -> Self {
        self.stop_on_first_error = stop;
        self
    }

    /// Execute all validation rules in the chain
    pub fn validate(&self, context: &C) -> ValidationResult {
        let mut combined_result = ValidationResult::valid();

        for rule in &self.rules {
            if rule.should_skip(context) {
                continue;
            }

            let rule_result = rule.validate(context);

            if !rule_result.is_valid() {
                log::debug!(
                    "Validation rule '{}' reported {} error(s)",
                    rule.rule_name(),
                    rule_result.errors.len()
                );
            }

            combined_result = combined_result.merge(rule_result);

            if self.stop_on_first_error && !combined_result.is_valid() {
                break;
            }
        }

        combined_result
    }

    /// Get the number of rules in the chain
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl<C> Default for ValidationChain<C> {
    fn default() -> Self {
        Self::new()
    }
}
