//! Outcome records produced by validations.

use crate::core::error::LookupError;
use crate::core::types::Value;
use crate::rules::{Rule, RuleOutcome};
use serde::Serialize;

/// The outcome of one validation on one subject.
///
/// Immutable once built; fields are read through accessors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    validation_name: String,
    subject: String,
    success: bool,
    negative: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    observed: Option<Value>,
}

impl ValidationResult {
    /// A passing result.
    pub fn success(
        validation_name: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            validation_name: validation_name.into(),
            subject: subject.into(),
            success: true,
            negative: false,
            message: message.into(),
            expected: None,
            observed: None,
        }
    }

    /// A failing result.
    pub fn failure(
        validation_name: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            ..Self::success(validation_name, subject, message)
        }
    }

    /// Result of applying `rule` to `observed` and `expected`.
    pub fn from_rule(
        validation_name: impl Into<String>,
        subject: impl Into<String>,
        rule: &Rule,
        outcome: RuleOutcome,
        observed: Value,
        expected: Value,
    ) -> Self {
        Self {
            validation_name: validation_name.into(),
            subject: subject.into(),
            success: outcome.success,
            negative: rule.negative,
            message: outcome.message,
            expected: Some(expected),
            observed: Some(observed),
        }
    }

    /// A failed result for a step that could not be resolved.
    pub fn from_lookup_error(validation_name: impl Into<String>, error: &LookupError) -> Self {
        Self::failure(validation_name, error.step(), error.to_string())
    }

    /// Attach the observed value.
    pub fn with_observed(mut self, observed: impl Into<Value>) -> Self {
        self.observed = Some(observed.into());
        self
    }

    pub fn validation_name(&self) -> &str {
        &self.validation_name
    }

    /// Step name, or pipeline name for pipeline-scope checks.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Whether the rule applied was negated.
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn expected(&self) -> Option<&Value> {
        self.expected.as_ref()
    }

    pub fn observed(&self) -> Option<&Value> {
        self.observed.as_ref()
    }
}
