//! Pipeline structure and step attributes.
//!
//! The Pipeline is the read-only graph every validation inspects. Steps are
//! kept in an IndexMap so that iteration follows definition order, which
//! keeps report order stable across runs.

use crate::core::error::{LookupError, PipelineError, PipelineResult};
use crate::core::types::Value;
use crate::pipeline::connection::{DataSource, OutputReference};
use crate::pipeline::topology::DependencyGraph;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of a pipeline step.
///
/// Names are matched case-insensitively when read from documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StepType {
    Processing,
    Training,
    Transform,
    Tuning,
    CreateModel,
    RegisterModel,
    Lambda,
    Callback,
    Condition,
    Fail,
}

impl StepType {
    /// Every step type, in declaration order.
    pub const ALL: [StepType; 10] = [
        StepType::Processing,
        StepType::Training,
        StepType::Transform,
        StepType::Tuning,
        StepType::CreateModel,
        StepType::RegisterModel,
        StepType::Lambda,
        StepType::Callback,
        StepType::Condition,
        StepType::Fail,
    ];

    /// Canonical name, as written in pipeline definitions.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Processing => "Processing",
            StepType::Training => "Training",
            StepType::Transform => "Transform",
            StepType::Tuning => "Tuning",
            StepType::CreateModel => "CreateModel",
            StepType::RegisterModel => "RegisterModel",
            StepType::Lambda => "Lambda",
            StepType::Callback => "Callback",
            StepType::Condition => "Condition",
            StepType::Fail => "Fail",
        }
    }

    /// Steps that launch a container job (image, role, KMS key, I/O).
    pub fn runs_container(&self) -> bool {
        matches!(
            self,
            StepType::Processing | StepType::Training | StepType::Transform | StepType::Tuning
        )
    }

    /// Steps whose job accepts VPC / isolation settings.
    pub fn supports_network_config(&self) -> bool {
        matches!(
            self,
            StepType::Processing | StepType::Training | StepType::Tuning
        )
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepType {
    type Err = crate::core::error::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::core::error::ConfigError::UnknownStepType(s.to_string()))
    }
}

impl TryFrom<String> for StepType {
    type Error = crate::core::error::ConfigError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl From<StepType> for String {
    fn from(step_type: StepType) -> Self {
        step_type.as_str().to_string()
    }
}

/// A pipeline-level parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Default value, if any
    #[serde(default, alias = "default", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_value: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Comparable form; `include_default` false drops the default value.
    pub fn to_value(&self, include_default: bool) -> Value {
        let mut entries = vec![("name", Value::from(&self.name))];
        if include_default {
            entries.push(("default_value", self.default_value.clone().into()));
        }
        Value::map(entries)
    }
}

/// VPC and isolation settings of a container job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub enable_network_isolation: bool,
    pub security_group_ids: Vec<String>,
    pub subnets: Vec<String>,
    pub encrypt_inter_container_traffic: bool,
}

impl NetworkConfig {
    pub fn to_value(&self) -> Value {
        Value::map([
            (
                "enable_network_isolation",
                Value::from(self.enable_network_isolation),
            ),
            (
                "security_group_ids",
                Value::from(self.security_group_ids.clone()),
            ),
            ("subnets", Value::from(self.subnets.clone())),
            (
                "encrypt_inter_container_traffic",
                Value::from(self.encrypt_inter_container_traffic),
            ),
        ])
    }
}

/// A resource tag attached to a step's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(rename = "Key", alias = "key")]
    pub key: String,
    #[serde(rename = "Value", alias = "value")]
    pub value: Value,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn to_value(&self) -> Value {
        Value::map([("Key", Value::from(&self.key)), ("Value", self.value.clone())])
    }
}

/// A named input channel of a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInput {
    /// Input (or channel) name
    pub name: String,
    /// Where the data comes from
    pub source: DataSource,
    /// Mount path inside the container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// MIME type of the data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl StepInput {
    pub fn new(name: impl Into<String>, source: impl Into<DataSource>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            destination: None,
            content_type: None,
        }
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn to_value(&self) -> Value {
        Value::compact_map([
            ("name", Value::from(&self.name)),
            ("source", self.source.to_value()),
            ("destination", self.destination.clone().into()),
            ("content_type", self.content_type.clone().into()),
        ])
    }
}

/// A named output of a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutput {
    /// Output name
    pub name: String,
    /// Path inside the container the output is collected from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Where the output is uploaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

impl StepOutput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            destination: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn to_value(&self) -> Value {
        Value::compact_map([
            ("name", Value::from(&self.name)),
            ("source", self.source.clone().into()),
            ("destination", self.destination.clone().into()),
        ])
    }
}

/// A node in the pipeline graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Unique step name
    pub name: String,
    /// Step category
    pub step_type: StepType,
    /// Container image the job runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    /// Execution role (name or ARN)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// KMS key used for job output / volumes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_config: Option<NetworkConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<StepInput>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<StepOutput>,
    /// Names of steps that must finish first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    /// Lambda function invoked by a Lambda step (name or ARN)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lambda_function: Option<String>,
    /// Queue a Callback step posts its token to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqs_queue_url: Option<String>,
}

impl Step {
    /// Create a new step with no attributes set.
    pub fn new(name: impl Into<String>, step_type: StepType) -> Self {
        Self {
            name: name.into(),
            step_type,
            image_uri: None,
            role: None,
            kms_key: None,
            network_config: None,
            tags: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            depends_on: Vec::new(),
            lambda_function: None,
            sqs_queue_url: None,
        }
    }

    pub fn with_image(mut self, image_uri: impl Into<String>) -> Self {
        self.image_uri = Some(image_uri.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_kms_key(mut self, kms_key: impl Into<String>) -> Self {
        self.kms_key = Some(kms_key.into());
        self
    }

    pub fn with_network_config(mut self, network_config: NetworkConfig) -> Self {
        self.network_config = Some(network_config);
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.tags.push(Tag::new(key, value));
        self
    }

    pub fn with_input(mut self, input: StepInput) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn with_output(mut self, output: StepOutput) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn depends_on(mut self, step: impl Into<String>) -> Self {
        self.depends_on.push(step.into());
        self
    }

    pub fn with_lambda_function(mut self, function: impl Into<String>) -> Self {
        self.lambda_function = Some(function.into());
        self
    }

    pub fn with_sqs_queue_url(mut self, url: impl Into<String>) -> Self {
        self.sqs_queue_url = Some(url.into());
        self
    }

    /// Role name, taken from the last path segment of a role ARN.
    pub fn role_name(&self) -> Option<&str> {
        self.role
            .as_deref()
            .map(|role| role.rsplit('/').next().unwrap_or(role))
    }

    /// Get an input by name.
    pub fn input(&self, name: &str) -> Result<&StepInput, LookupError> {
        self.inputs
            .iter()
            .find(|i| i.name == name)
            .ok_or_else(|| LookupError::InputNotFound {
                step: self.name.clone(),
                input: name.to_string(),
            })
    }

    /// Get an output by name.
    pub fn output(&self, name: &str) -> Result<&StepOutput, LookupError> {
        self.outputs
            .iter()
            .find(|o| o.name == name)
            .ok_or_else(|| LookupError::OutputNotFound {
                step: self.name.clone(),
                output: name.to_string(),
            })
    }

    /// Output references made by this step's inputs.
    pub fn output_references(&self) -> impl Iterator<Item = (&StepInput, &OutputReference)> {
        self.inputs.iter().filter_map(|input| match &input.source {
            DataSource::StepOutput(reference) => Some((input, reference)),
            DataSource::Uri(_) => None,
        })
    }

    /// Fail with `AttributeNotSupported` unless `supported` holds for this step.
    pub fn require(&self, supported: bool, attribute: &'static str) -> Result<(), LookupError> {
        if supported {
            Ok(())
        } else {
            Err(LookupError::AttributeNotSupported {
                step: self.name.clone(),
                step_type: self.step_type,
                attribute,
            })
        }
    }

    pub fn tags_value(&self) -> Value {
        Value::List(self.tags.iter().map(Tag::to_value).collect())
    }

    pub fn inputs_value(&self) -> Value {
        Value::List(self.inputs.iter().map(StepInput::to_value).collect())
    }

    pub fn outputs_value(&self) -> Value {
        Value::List(self.outputs.iter().map(StepOutput::to_value).collect())
    }
}

/// The pipeline graph being validated.
///
/// Built through [`PipelineBuilder`], which rejects duplicate step names,
/// dangling references and dependency cycles. Once built it is never
/// mutated.
#[derive(Debug, Clone)]
pub struct Pipeline {
    name: String,
    parameters: Vec<Parameter>,
    steps: IndexMap<String, Step>,
    topology: DependencyGraph,
}

impl Pipeline {
    /// Start building a pipeline.
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder {
            name: name.into(),
            parameters: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// All steps in definition order.
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.values()
    }

    /// Get a step by name.
    pub fn step(&self, name: &str) -> Result<&Step, LookupError> {
        self.steps
            .get(name)
            .ok_or_else(|| LookupError::StepNotFound(name.to_string()))
    }

    /// Steps of one type, in definition order.
    pub fn steps_of_type(&self, step_type: StepType) -> impl Iterator<Item = &Step> {
        self.steps().filter(move |s| s.step_type == step_type)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether `upstream` must finish before `downstream` runs.
    pub fn is_upstream(&self, upstream: &str, downstream: &str) -> bool {
        self.topology.has_path(upstream, downstream)
    }
}

/// Builder for [`Pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    name: String,
    parameters: Vec<Parameter>,
    steps: Vec<Step>,
}

impl PipelineBuilder {
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Check the step graph and build the pipeline.
    pub fn build(self) -> PipelineResult<Pipeline> {
        let mut steps = IndexMap::with_capacity(self.steps.len());
        for step in self.steps {
            if steps.contains_key(&step.name) {
                return Err(PipelineError::DuplicateStep(step.name));
            }
            steps.insert(step.name.clone(), step);
        }

        let topology = DependencyGraph::build(&steps)?;
        topology.check_acyclic()?;

        Ok(Pipeline {
            name: self.name,
            parameters: self.parameters,
            steps,
            topology,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processing(name: &str) -> Step {
        Step::new(name, StepType::Processing)
    }

    #[test]
    fn test_step_type_from_str() {
        assert_eq!("processing".parse::<StepType>().unwrap(), StepType::Processing);
        assert_eq!("Training".parse::<StepType>().unwrap(), StepType::Training);
        assert!("does-not-exist".parse::<StepType>().is_err());
    }

    #[test]
    fn test_role_name_from_arn() {
        let step = processing("a").with_role("arn:aws:iam::0123456789:role/TestRole");
        assert_eq!(step.role_name(), Some("TestRole"));

        let step = processing("b").with_role("roleA");
        assert_eq!(step.role_name(), Some("roleA"));
        assert_eq!(processing("c").role_name(), None);
    }

    #[test]
    fn test_duplicate_step_rejected() {
        let result = Pipeline::builder("p")
            .step(processing("a"))
            .step(processing("a"))
            .build();
        assert_eq!(result.unwrap_err(), PipelineError::DuplicateStep("a".to_string()));
    }

    #[test]
    fn test_step_lookup() {
        let pipeline = Pipeline::builder("p")
            .step(processing("a"))
            .step(Step::new("b", StepType::Training).depends_on("a"))
            .build()
            .unwrap();

        assert_eq!(pipeline.step_count(), 2);
        assert!(pipeline.step("a").is_ok());
        assert_eq!(
            pipeline.step("zzz").unwrap_err(),
            LookupError::StepNotFound("zzz".to_string())
        );
        assert_eq!(pipeline.steps_of_type(StepType::Training).count(), 1);
        assert!(pipeline.is_upstream("a", "b"));
        assert!(!pipeline.is_upstream("b", "a"));
    }

    #[test]
    fn test_input_value_omits_unset_fields() {
        let input = StepInput::new("train", "s3://bucket/train");
        let value = input.to_value();
        let map = value.as_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["source"], Value::from("s3://bucket/train"));
    }

    #[test]
    fn test_parameter_value_without_default() {
        let parameter = Parameter::new("p1").with_default("v1");
        assert_eq!(parameter.to_value(true).as_map().unwrap().len(), 2);
        assert_eq!(parameter.to_value(false).as_map().unwrap().len(), 1);
    }
}
