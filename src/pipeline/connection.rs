//! Data sources that connect step inputs to upstream outputs.

use crate::core::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A reference to a named output of another step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputReference {
    /// The producing step.
    pub step_name: String,
    /// The output name on that step.
    pub output_name: String,
}

impl OutputReference {
    /// Create a new reference.
    pub fn new(step_name: impl Into<String>, output_name: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            output_name: output_name.into(),
        }
    }
}

impl fmt::Display for OutputReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.step_name, self.output_name)
    }
}

/// Where a step input reads its data from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataSource {
    /// A literal location, usually an S3 URI.
    Uri(String),
    /// The output of another step in the same pipeline.
    StepOutput(OutputReference),
}

impl DataSource {
    /// Whether this source reads the given output.
    pub fn references(&self, step_name: &str, output_name: &str) -> bool {
        matches!(
            self,
            DataSource::StepOutput(r) if r.step_name == step_name && r.output_name == output_name
        )
    }

    pub fn as_uri(&self) -> Option<&str> {
        match self {
            DataSource::Uri(uri) => Some(uri),
            DataSource::StepOutput(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            DataSource::Uri(uri) => Value::from(uri),
            DataSource::StepOutput(r) => Value::map([
                ("step_name", Value::from(&r.step_name)),
                ("output_name", Value::from(&r.output_name)),
            ]),
        }
    }
}

impl From<&str> for DataSource {
    fn from(uri: &str) -> Self {
        DataSource::Uri(uri.to_string())
    }
}

impl From<String> for DataSource {
    fn from(uri: String) -> Self {
        DataSource::Uri(uri)
    }
}

impl From<OutputReference> for DataSource {
    fn from(reference: OutputReference) -> Self {
        DataSource::StepOutput(reference)
    }
}
