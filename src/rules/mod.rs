//! Rules: stateless predicates applied by validations.
//!
//! A rule compares an observed value against an expected one and can be
//! negated. Negation is applied after evaluation, so `negative` always
//! inverts whatever the comparison decided.

pub mod compare;

use crate::core::error::ComparisonError;
use crate::core::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The comparison a rule performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Structural equality, lists compared as sets.
    Equals,
    /// Membership, subset, sub-mapping or substring.
    Contains,
}

impl RuleKind {
    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::Equals => "Equals",
            RuleKind::Contains => "Contains",
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            RuleKind::Equals => "equal",
            RuleKind::Contains => "contain",
        }
    }
}

/// A comparison with an optional negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub kind: RuleKind,
    #[serde(default)]
    pub negative: bool,
}

/// The decision of a rule together with its human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub success: bool,
    pub message: String,
}

impl Rule {
    pub fn equals() -> Self {
        Self {
            kind: RuleKind::Equals,
            negative: false,
        }
    }

    pub fn contains() -> Self {
        Self {
            kind: RuleKind::Contains,
            negative: false,
        }
    }

    /// Invert the rule.
    pub fn negated(mut self) -> Self {
        self.negative = !self.negative;
        self
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Compare `actual` with `expected`, applying negation.
    pub fn evaluate(&self, actual: &Value, expected: &Value) -> Result<bool, ComparisonError> {
        Ok(self.holds(actual, expected)? ^ self.negative)
    }

    /// Whether the relation holds, before negation.
    fn holds(&self, actual: &Value, expected: &Value) -> Result<bool, ComparisonError> {
        match self.kind {
            RuleKind::Equals => Ok(compare::loose_eq(actual, expected)),
            RuleKind::Contains => compare::contains(actual, expected),
        }
    }

    /// Render `<actual> does [not ]equal|contain <expected>` for a relation
    /// that did or did not hold.
    pub fn describe(&self, actual: &Value, expected: &Value, holds: bool) -> String {
        format!(
            "{} does {}{} {}",
            actual,
            if holds { "" } else { "not " },
            self.kind.verb(),
            expected
        )
    }

    /// Evaluate and describe in one step.
    pub fn check(&self, actual: &Value, expected: &Value) -> Result<RuleOutcome, ComparisonError> {
        let holds = self.holds(actual, expected)?;
        Ok(RuleOutcome {
            success: holds ^ self.negative,
            message: self.describe(actual, expected, holds),
        })
    }
}

impl Default for Rule {
    fn default() -> Self {
        Self::equals()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "not {}", self.name())
        } else {
            f.write_str(self.name())
        }
    }
}
