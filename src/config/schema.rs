//! Configuration file schema.
//!
//! A configuration names the pipeline to check, the resources known to
//! exist and the validations to run:
//!
//! ```toml
//! version = "1.0"
//! pipeline = "pipeline.json"
//! fail_fast = false
//!
//! [inventory]
//! roles = ["roleA"]
//!
//! [[validations]]
//! kind = "role_name"
//! expected = "roleA"
//! rule = { kind = "equals" }
//! ```

use crate::core::error::ConfigError;
use crate::core::types::{lenient_version, version_matches, Value};
use crate::lookup::{Inventory, RegistrySettings, ResourceCatalog};
use crate::pipeline::structure::{Parameter, StepType};
use crate::rules::Rule;
use crate::validation::{
    IoPair, PipelineParametersAsExpected, PipelineProcessingStepsIONamesUnique,
    StepCallbackSqsQueueExists, StepFilter, StepImagesExist, StepInputsAsExpected,
    StepKmsKeyIdAsExpected, StepLambdaFunctionExists, StepNetworkConfigAsExpected,
    StepOutputsAsExpected, StepOutputsMatchInputsAsExpected, StepRoleNameAsExpected,
    StepRoleNameExists, StepTagsAsExpected, Validation,
};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration versions this build understands.
pub const SUPPORTED_VERSIONS: &str = "^1";

/// A parsed configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default = "ConfigDocument::default_version")]
    pub version: String,
    /// Pipeline definition, relative to the configuration file.
    pub pipeline: PathBuf,
    #[serde(default)]
    pub fail_fast: bool,
    #[serde(default)]
    pub inventory: Inventory,
    /// Look images up in their registries when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<RegistrySettings>,
    #[serde(default)]
    pub validations: Vec<ValidationSpec>,
}

impl ConfigDocument {
    fn default_version() -> String {
        "1.0.0".to_string()
    }

    /// Parse the version, accepting `1` and `1.0` for `1.0.0`.
    pub fn parsed_version(&self) -> Result<Version, ConfigError> {
        lenient_version(&self.version).ok_or_else(|| self.unsupported_version())
    }

    /// Fail unless the version matches [`SUPPORTED_VERSIONS`].
    pub fn check_version(&self) -> Result<(), ConfigError> {
        if version_matches(&self.version, SUPPORTED_VERSIONS) {
            Ok(())
        } else {
            Err(self.unsupported_version())
        }
    }

    fn unsupported_version(&self) -> ConfigError {
        ConfigError::UnsupportedVersion {
            found: self.version.clone(),
            supported: SUPPORTED_VERSIONS,
        }
    }

    /// Catalog for existence checks.
    pub fn catalog(&self) -> Arc<dyn ResourceCatalog> {
        match &self.registry {
            Some(settings) => Arc::new(crate::lookup::RegistryCatalog::new(
                settings,
                self.inventory.clone(),
            )),
            None => Arc::new(self.inventory.clone()),
        }
    }

    /// Build every validation, in file order.
    pub fn build_validations(&self) -> Result<Vec<Box<dyn Validation>>, ConfigError> {
        if self.validations.is_empty() {
            return Err(ConfigError::EmptyValidations);
        }
        let catalog = self.catalog();
        self.validations
            .iter()
            .map(|spec| spec.build(&catalog))
            .collect()
    }
}

/// Step selection keys shared by step-scope entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_type: Option<StepType>,
}

impl FilterSpec {
    fn filter(&self) -> StepFilter {
        StepFilter {
            step_name: self.step_name.clone(),
            step_type: self.step_type,
        }
    }
}

/// An attribute comparison entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
    pub expected: Value,
    #[serde(default)]
    pub rule: Rule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_type: Option<StepType>,
}

impl AttributeSpec {
    fn filter(&self) -> StepFilter {
        FilterSpec {
            step_name: self.step_name.clone(),
            step_type: self.step_type,
        }
        .filter()
    }
}

/// One `[[validations]]` entry, keyed by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationSpec {
    PipelineParameters {
        parameters_expected: Vec<Parameter>,
        #[serde(default)]
        rule: Rule,
        #[serde(default)]
        ignore_default_value: bool,
    },
    ProcessingIoNamesUnique {},
    KmsKey(AttributeSpec),
    RoleName(AttributeSpec),
    Tags(AttributeSpec),
    NetworkConfig(AttributeSpec),
    Inputs(AttributeSpec),
    Outputs(AttributeSpec),
    OutputsMatchInputs {
        inputs_outputs: Vec<IoPair>,
    },
    ImagesExist(FilterSpec),
    RoleExists(FilterSpec),
    LambdaFunctionExists(FilterSpec),
    CallbackQueueExists(FilterSpec),
}

impl ValidationSpec {
    /// The `kind` key of this entry.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationSpec::PipelineParameters { .. } => "pipeline_parameters",
            ValidationSpec::ProcessingIoNamesUnique {} => "processing_io_names_unique",
            ValidationSpec::KmsKey(_) => "kms_key",
            ValidationSpec::RoleName(_) => "role_name",
            ValidationSpec::Tags(_) => "tags",
            ValidationSpec::NetworkConfig(_) => "network_config",
            ValidationSpec::Inputs(_) => "inputs",
            ValidationSpec::Outputs(_) => "outputs",
            ValidationSpec::OutputsMatchInputs { .. } => "outputs_match_inputs",
            ValidationSpec::ImagesExist(_) => "images_exist",
            ValidationSpec::RoleExists(_) => "role_exists",
            ValidationSpec::LambdaFunctionExists(_) => "lambda_function_exists",
            ValidationSpec::CallbackQueueExists(_) => "callback_queue_exists",
        }
    }

    /// Build the validation this entry describes.
    pub fn build(
        &self,
        catalog: &Arc<dyn ResourceCatalog>,
    ) -> Result<Box<dyn Validation>, ConfigError> {
        let validation: Box<dyn Validation> = match self {
            ValidationSpec::PipelineParameters {
                parameters_expected,
                rule,
                ignore_default_value,
            } => Box::new(
                PipelineParametersAsExpected::new(parameters_expected.clone(), *rule)?
                    .ignore_default_value(*ignore_default_value),
            ),
            ValidationSpec::ProcessingIoNamesUnique {} => {
                Box::new(PipelineProcessingStepsIONamesUnique::new())
            }
            ValidationSpec::KmsKey(spec) => Box::new(StepKmsKeyIdAsExpected::new(
                spec.expected.clone(),
                spec.rule,
                spec.filter(),
            )?),
            ValidationSpec::RoleName(spec) => Box::new(StepRoleNameAsExpected::new(
                spec.expected.clone(),
                spec.rule,
                spec.filter(),
            )?),
            ValidationSpec::Tags(spec) => Box::new(StepTagsAsExpected::new(
                spec.expected.clone(),
                spec.rule,
                spec.filter(),
            )?),
            ValidationSpec::NetworkConfig(spec) => Box::new(StepNetworkConfigAsExpected::new(
                spec.expected.clone(),
                spec.rule,
                spec.filter(),
            )?),
            ValidationSpec::Inputs(spec) => Box::new(StepInputsAsExpected::new(
                spec.expected.clone(),
                spec.rule,
                spec.filter(),
            )?),
            ValidationSpec::Outputs(spec) => Box::new(StepOutputsAsExpected::new(
                spec.expected.clone(),
                spec.rule,
                spec.filter(),
            )?),
            ValidationSpec::OutputsMatchInputs { inputs_outputs } => {
                Box::new(StepOutputsMatchInputsAsExpected::new(inputs_outputs.clone())?)
            }
            ValidationSpec::ImagesExist(spec) => {
                Box::new(StepImagesExist::new(catalog.clone(), spec.filter())?)
            }
            ValidationSpec::RoleExists(spec) => {
                Box::new(StepRoleNameExists::new(catalog.clone(), spec.filter())?)
            }
            ValidationSpec::LambdaFunctionExists(spec) => {
                Box::new(StepLambdaFunctionExists::new(catalog.clone(), spec.filter())?)
            }
            ValidationSpec::CallbackQueueExists(spec) => {
                Box::new(StepCallbackSqsQueueExists::new(catalog.clone(), spec.filter())?)
            }
        };
        Ok(validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::catalog;

    const CONFIG: &str = r#"
        version = "1.0"
        pipeline = "pipeline.json"

        [inventory]
        roles = ["roleA"]

        [[validations]]
        kind = "role_name"
        expected = "roleA"
        step_type = "Training"

        [[validations]]
        kind = "pipeline_parameters"
        parameters_expected = [{ name = "p1", default = "v1" }]
        rule = { kind = "contains", negative = true }

        [[validations]]
        kind = "processing_io_names_unique"

        [[validations]]
        kind = "outputs_match_inputs"
        inputs_outputs = [
            { input = { step_name = "train", input_name = "train" }, output = { step_name = "prep", output_name = "train" } },
        ]

        [[validations]]
        kind = "role_exists"
    "#;

    #[test]
    fn test_parse_config() {
        let document: ConfigDocument = toml::from_str(CONFIG).unwrap();
        assert!(document.check_version().is_ok());
        assert_eq!(document.validations.len(), 5);
        assert!(document.registry.is_none());

        match &document.validations[0] {
            ValidationSpec::RoleName(spec) => {
                assert_eq!(spec.expected, Value::from("roleA"));
                assert_eq!(spec.rule, Rule::equals());
                assert_eq!(spec.step_type, Some(StepType::Training));
            }
            other => panic!("unexpected spec {:?}", other),
        }
        match &document.validations[1] {
            ValidationSpec::PipelineParameters { parameters_expected, rule, .. } => {
                assert_eq!(parameters_expected[0].default_value, Some(Value::from("v1")));
                assert_eq!(*rule, Rule::contains().negated());
            }
            other => panic!("unexpected spec {:?}", other),
        }
    }

    #[test]
    fn test_built_names_match_catalog() {
        let document: ConfigDocument = toml::from_str(CONFIG).unwrap();
        let validations = document.build_validations().unwrap();
        for (spec, validation) in document.validations.iter().zip(&validations) {
            let listed = catalog::find(spec.kind()).unwrap();
            assert_eq!(listed.name, validation.name());
        }
    }

    #[test]
    fn test_conflicting_filter_is_config_error() {
        let spec: ValidationSpec = toml::from_str(
            r#"
            kind = "kms_key"
            expected = "alias/k"
            step_name = "train"
            step_type = "Training"
            "#,
        )
        .unwrap();
        let catalog: Arc<dyn ResourceCatalog> = Arc::new(Inventory::new());
        assert!(matches!(
            spec.build(&catalog),
            Err(ConfigError::ConflictingFilters { .. })
        ));
    }

    #[test]
    fn test_versions() {
        let mut document: ConfigDocument = toml::from_str(CONFIG).unwrap();
        document.version = "1".to_string();
        assert!(document.check_version().is_ok());
        document.version = "2.0.0".to_string();
        assert!(matches!(
            document.check_version(),
            Err(ConfigError::UnsupportedVersion { .. })
        ));
        document.version = "one".to_string();
        assert!(document.check_version().is_err());
    }

    #[test]
    fn test_registry_table() {
        let document: ConfigDocument = toml::from_str(
            r#"
            pipeline = "p.json"

            [registry]
            token_env = "ECR_PASSWORD"
            auth_scheme = "basic"

            [[validations]]
            kind = "images_exist"
            "#,
        )
        .unwrap();
        let registry = document.registry.unwrap();
        assert_eq!(registry.auth_scheme, Some(crate::lookup::AuthScheme::Basic));
        assert_eq!(registry.token_env.as_deref(), Some("ECR_PASSWORD"));
        assert_eq!(registry.timeout_secs, 10);
    }

    #[test]
    fn test_empty_validations() {
        let document: ConfigDocument = toml::from_str(r#"pipeline = "p.json""#).unwrap();
        assert_eq!(
            document.build_validations().err(),
            Some(ConfigError::EmptyValidations)
        );
    }
}
