//! Pipeline-scope validations.

use crate::core::error::{ConfigError, ValidationError, ValidationOutcome};
use crate::core::types::Value;
use crate::pipeline::structure::{Parameter, Pipeline, StepType};
use crate::rules::Rule;
use crate::validation::result::ValidationResult;
use crate::validation::Validation;
use std::collections::HashSet;

/// Compares the pipeline's declared parameters with an expected list.
#[derive(Debug, Clone)]
pub struct PipelineParametersAsExpected {
    parameters_expected: Vec<Parameter>,
    rule: Rule,
    ignore_default_value: bool,
}

impl PipelineParametersAsExpected {
    pub const NAME: &'static str = "PipelineParametersAsExpected";

    /// Fails if `parameters_expected` is empty.
    pub fn new(parameters_expected: Vec<Parameter>, rule: Rule) -> Result<Self, ConfigError> {
        if parameters_expected.is_empty() {
            return Err(ConfigError::EmptyExpectation {
                validation: Self::NAME.to_string(),
                field: "parameters_expected",
            });
        }
        Ok(Self {
            parameters_expected,
            rule,
            ignore_default_value: false,
        })
    }

    /// Compare parameter names only.
    pub fn ignore_default_value(mut self, ignore: bool) -> Self {
        self.ignore_default_value = ignore;
        self
    }

    fn lower(&self, parameters: &[Parameter]) -> Value {
        Value::List(
            parameters
                .iter()
                .map(|p| p.to_value(!self.ignore_default_value))
                .collect(),
        )
    }
}

impl Validation for PipelineParametersAsExpected {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, pipeline: &Pipeline) -> ValidationOutcome<Vec<ValidationResult>> {
        let observed = self.lower(pipeline.parameters());
        let expected = self.lower(&self.parameters_expected);

        let outcome = self
            .rule
            .check(&observed, &expected)
            .map_err(|source| ValidationError::Comparison {
                validation: Self::NAME.to_string(),
                source,
            })?;

        Ok(vec![ValidationResult::from_rule(
            Self::NAME,
            pipeline.name(),
            &self.rule,
            outcome,
            observed,
            expected,
        )])
    }
}

/// Checks that no Processing step reuses an input name or an output name.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineProcessingStepsIONamesUnique;

impl PipelineProcessingStepsIONamesUnique {
    pub const NAME: &'static str = "PipelineProcessingStepsIONamesUnique";

    pub fn new() -> Self {
        Self
    }
}

fn duplicates<'a>(names: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    let mut repeated = Vec::new();
    for name in names {
        if !seen.insert(name) && !repeated.contains(&name) {
            repeated.push(name);
        }
    }
    repeated
}

impl Validation for PipelineProcessingStepsIONamesUnique {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, pipeline: &Pipeline) -> ValidationOutcome<Vec<ValidationResult>> {
        let results = pipeline
            .steps_of_type(StepType::Processing)
            .map(|step| {
                let inputs = duplicates(step.inputs.iter().map(|i| i.name.as_str()));
                let outputs = duplicates(step.outputs.iter().map(|o| o.name.as_str()));

                if inputs.is_empty() && outputs.is_empty() {
                    return ValidationResult::success(
                        Self::NAME,
                        &step.name,
                        "Input and output names are unique",
                    );
                }

                let mut problems = Vec::new();
                if !inputs.is_empty() {
                    problems.push(format!("duplicate input names {:?}", inputs));
                }
                if !outputs.is_empty() {
                    problems.push(format!("duplicate output names {:?}", outputs));
                }
                ValidationResult::failure(Self::NAME, &step.name, problems.join("; "))
            })
            .collect();

        Ok(results)
    }
}
