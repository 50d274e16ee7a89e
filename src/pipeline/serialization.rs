//! Pipeline definition documents for saving and loading.

use crate::core::error::{LintError, LintResult, PipelineError, PipelineResult};
use crate::core::types::version_matches;
use crate::pipeline::structure::{Parameter, Pipeline, Step};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serializable representation of a pipeline definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDocument {
    /// Definition format version
    #[serde(default = "PipelineDocument::default_version")]
    pub version: String,
    /// Pipeline name
    pub name: String,
    /// Pipeline parameters
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// All steps, in definition order
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl PipelineDocument {
    /// Current format version.
    pub const VERSION: &'static str = "1.0.0";

    /// Versions this build reads.
    pub const SUPPORTED_VERSIONS: &'static str = "^1";

    fn default_version() -> String {
        Self::VERSION.to_string()
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> PipelineResult<Self> {
        let document: Self =
            serde_json::from_str(json).map_err(|e| PipelineError::Parse(e.to_string()))?;
        document.checked()
    }

    /// Deserialize from TOML string.
    pub fn from_toml(text: &str) -> PipelineResult<Self> {
        let document: Self = toml::from_str(text).map_err(|e| PipelineError::Parse(e.to_string()))?;
        document.checked()
    }

    fn checked(self) -> PipelineResult<Self> {
        if version_matches(&self.version, Self::SUPPORTED_VERSIONS) {
            Ok(self)
        } else {
            Err(PipelineError::UnsupportedVersion {
                found: self.version,
                supported: Self::SUPPORTED_VERSIONS,
            })
        }
    }

    /// Read a definition file, picking the format from its extension.
    pub fn load(path: &Path) -> LintResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| LintError::io(path.display().to_string(), e))?;

        let document = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&text)?,
            Some("toml") => Self::from_toml(&text)?,
            other => {
                return Err(PipelineError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                )
                .into())
            }
        };

        log::debug!(
            "Loaded pipeline '{}' with {} steps from {}",
            document.name,
            document.steps.len(),
            path.display()
        );
        Ok(document)
    }

    /// Check the step graph and build the pipeline.
    pub fn into_pipeline(self) -> PipelineResult<Pipeline> {
        let mut builder = Pipeline::builder(self.name);
        for parameter in self.parameters {
            builder = builder.parameter(parameter);
        }
        for step in self.steps {
            builder = builder.step(step);
        }
        builder.build()
    }
}

impl From<&Pipeline> for PipelineDocument {
    fn from(pipeline: &Pipeline) -> Self {
        Self {
            version: Self::VERSION.to_string(),
            name: pipeline.name().to_string(),
            parameters: pipeline.parameters().to_vec(),
            steps: pipeline.steps().cloned().collect(),
        }
    }
}

/// Load and build a pipeline from a definition file.
pub fn load_pipeline(path: &Path) -> LintResult<Pipeline> {
    Ok(PipelineDocument::load(path)?.into_pipeline()?)
}
