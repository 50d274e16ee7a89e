//! Step-scope validations comparing one step attribute with a rule.

use crate::core::error::{ConfigError, LookupError, ValidationOutcome};
use crate::core::types::Value;
use crate::pipeline::structure::{Pipeline, Step, StepType};
use crate::rules::Rule;
use crate::validation::filter::{check_steps, StepFilter};
use crate::validation::result::ValidationResult;
use crate::validation::Validation;

/// Reads an attribute off a step, failing when the step type lacks it.
type Extractor = fn(&Step) -> Result<Value, LookupError>;

/// The part every attribute validation shares.
#[derive(Clone)]
struct AttributeCheck {
    name: &'static str,
    expected: Value,
    rule: Rule,
    filter: StepFilter,
    eligible: fn(StepType) -> bool,
    extract: Extractor,
}

impl std::fmt::Debug for AttributeCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeCheck")
            .field("name", &self.name)
            .field("expected", &self.expected)
            .field("rule", &self.rule)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl AttributeCheck {
    fn new(
        name: &'static str,
        expected: Value,
        rule: Rule,
        filter: StepFilter,
        eligible: fn(StepType) -> bool,
        extract: Extractor,
    ) -> Result<Self, ConfigError> {
        filter.check(name)?;
        Ok(Self {
            name,
            expected,
            rule,
            filter,
            eligible,
            extract,
        })
    }

    fn run(&self, pipeline: &Pipeline) -> ValidationOutcome<Vec<ValidationResult>> {
        log::debug!("{}: checking with {} against {}", self.name, self.rule, self.expected);
        check_steps(self.name, &self.filter, pipeline, self.eligible, |step| {
            let observed = (self.extract)(step)?;
            let outcome = self.rule.check(&observed, &self.expected)?;
            Ok(ValidationResult::from_rule(
                self.name,
                &step.name,
                &self.rule,
                outcome,
                observed,
                self.expected.clone(),
            ))
        })
    }
}

fn runs_container(step_type: StepType) -> bool {
    step_type.runs_container()
}

fn supports_network_config(step_type: StepType) -> bool {
    step_type.supports_network_config()
}

fn kms_key(step: &Step) -> Result<Value, LookupError> {
    step.require(step.step_type.runs_container(), "kms_key")?;
    Ok(step.kms_key.clone().into())
}

fn role_name(step: &Step) -> Result<Value, LookupError> {
    step.require(step.step_type.runs_container(), "role")?;
    Ok(step.role_name().map(str::to_string).into())
}

fn tags(step: &Step) -> Result<Value, LookupError> {
    step.require(step.step_type.runs_container(), "tags")?;
    Ok(step.tags_value())
}

fn network_config(step: &Step) -> Result<Value, LookupError> {
    step.require(step.step_type.supports_network_config(), "network_config")?;
    Ok(step
        .network_config
        .as_ref()
        .map(|n| n.to_value())
        .unwrap_or_default())
}

fn inputs(step: &Step) -> Result<Value, LookupError> {
    step.require(step.step_type.runs_container(), "inputs")?;
    Ok(step.inputs_value())
}

fn outputs(step: &Step) -> Result<Value, LookupError> {
    step.require(step.step_type.runs_container(), "outputs")?;
    Ok(step.outputs_value())
}

/// Compares each step's KMS key id.
#[derive(Debug, Clone)]
pub struct StepKmsKeyIdAsExpected {
    check: AttributeCheck,
}

impl StepKmsKeyIdAsExpected {
    pub const NAME: &'static str = "StepKmsKeyIdAsExpected";

    pub fn new(
        kms_key_id_expected: impl Into<Value>,
        rule: Rule,
        filter: StepFilter,
    ) -> Result<Self, ConfigError> {
        let check = AttributeCheck::new(
            Self::NAME,
            kms_key_id_expected.into(),
            rule,
            filter,
            runs_container,
            kms_key,
        )?;
        Ok(Self { check })
    }
}

impl Validation for StepKmsKeyIdAsExpected {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, pipeline: &Pipeline) -> ValidationOutcome<Vec<ValidationResult>> {
        self.check.run(pipeline)
    }
}

/// Compares the role name (last segment of the role ARN) of each step.
#[derive(Debug, Clone)]
pub struct StepRoleNameAsExpected {
    check: AttributeCheck,
}

impl StepRoleNameAsExpected {
    pub const NAME: &'static str = "StepRoleNameAsExpected";

    pub fn new(
        role_name_expected: impl Into<Value>,
        rule: Rule,
        filter: StepFilter,
    ) -> Result<Self, ConfigError> {
        let check = AttributeCheck::new(
            Self::NAME,
            role_name_expected.into(),
            rule,
            filter,
            runs_container,
            role_name,
        )?;
        Ok(Self { check })
    }
}

impl Validation for StepRoleNameAsExpected {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, pipeline: &Pipeline) -> ValidationOutcome<Vec<ValidationResult>> {
        self.check.run(pipeline)
    }
}

/// Compares each step's tags, as a list of `{Key, Value}` maps.
#[derive(Debug, Clone)]
pub struct StepTagsAsExpected {
    check: AttributeCheck,
}

impl StepTagsAsExpected {
    pub const NAME: &'static str = "StepTagsAsExpected";

    pub fn new(
        tags_expected: impl Into<Value>,
        rule: Rule,
        filter: StepFilter,
    ) -> Result<Self, ConfigError> {
        let check = AttributeCheck::new(
            Self::NAME,
            tags_expected.into(),
            rule,
            filter,
            runs_container,
            tags,
        )?;
        Ok(Self { check })
    }
}

impl Validation for StepTagsAsExpected {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, pipeline: &Pipeline) -> ValidationOutcome<Vec<ValidationResult>> {
        self.check.run(pipeline)
    }
}

/// Compares each step's network configuration.
#[derive(Debug, Clone)]
pub struct StepNetworkConfigAsExpected {
    check: AttributeCheck,
}

impl StepNetworkConfigAsExpected {
    pub const NAME: &'static str = "StepNetworkConfigAsExpected";

    pub fn new(
        network_config_expected: impl Into<Value>,
        rule: Rule,
        filter: StepFilter,
    ) -> Result<Self, ConfigError> {
        let check = AttributeCheck::new(
            Self::NAME,
            network_config_expected.into(),
            rule,
            filter,
            supports_network_config,
            network_config,
        )?;
        Ok(Self { check })
    }
}

impl Validation for StepNetworkConfigAsExpected {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, pipeline: &Pipeline) -> ValidationOutcome<Vec<ValidationResult>> {
        self.check.run(pipeline)
    }
}

/// Compares each step's inputs.
#[derive(Debug, Clone)]
pub struct StepInputsAsExpected {
    check: AttributeCheck,
}

impl StepInputsAsExpected {
    pub const NAME: &'static str = "StepInputsAsExpected";

    pub fn new(
        inputs_expected: impl Into<Value>,
        rule: Rule,
        filter: StepFilter,
    ) -> Result<Self, ConfigError> {
        let check = AttributeCheck::new(
            Self::NAME,
            inputs_expected.into(),
            rule,
            filter,
            runs_container,
            inputs,
        )?;
        Ok(Self { check })
    }
}

impl Validation for StepInputsAsExpected {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, pipeline: &Pipeline) -> ValidationOutcome<Vec<ValidationResult>> {
        self.check.run(pipeline)
    }
}

/// Compares each step's outputs.
#[derive(Debug, Clone)]
pub struct StepOutputsAsExpected {
    check: AttributeCheck,
}

impl StepOutputsAsExpected {
    pub const NAME: &'static str = "StepOutputsAsExpected";

    pub fn new(
        outputs_expected: impl Into<Value>,
        rule: Rule,
        filter: StepFilter,
    ) -> Result<Self, ConfigError> {
        let check = AttributeCheck::new(
            Self::NAME,
            outputs_expected.into(),
            rule,
            filter,
            runs_container,
            outputs,
        )?;
        Ok(Self { check })
    }
}

impl Validation for StepOutputsAsExpected {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, pipeline: &Pipeline) -> ValidationOutcome<Vec<ValidationResult>> {
        self.check.run(pipeline)
    }
}
