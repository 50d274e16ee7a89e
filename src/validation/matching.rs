//! Cross-step input/output matching.

use crate::core::error::{ConfigError, LookupError, ValidationOutcome};
use crate::pipeline::structure::Pipeline;
use crate::validation::result::ValidationResult;
use crate::validation::Validation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Names an input of a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSelector {
    pub step_name: String,
    pub input_name: String,
}

/// Names an output of a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSelector {
    pub step_name: String,
    pub output_name: String,
}

/// An input that must read a given output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoPair {
    pub input: InputSelector,
    pub output: OutputSelector,
}

impl IoPair {
    pub fn new(
        input_step: impl Into<String>,
        input_name: impl Into<String>,
        output_step: impl Into<String>,
        output_name: impl Into<String>,
    ) -> Self {
        Self {
            input: InputSelector {
                step_name: input_step.into(),
                input_name: input_name.into(),
            },
            output: OutputSelector {
                step_name: output_step.into(),
                output_name: output_name.into(),
            },
        }
    }
}

impl fmt::Display for IoPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} <- {}.{}",
            self.input.step_name, self.input.input_name, self.output.step_name, self.output.output_name
        )
    }
}

/// Asserts that declared inputs read the declared upstream outputs.
///
/// An input matches an output when its source references that output, or
/// when its source URI equals the output's destination and the output's step
/// runs before the input's step.
#[derive(Debug, Clone)]
pub struct StepOutputsMatchInputsAsExpected {
    pairs: Vec<IoPair>,
}

impl StepOutputsMatchInputsAsExpected {
    pub const NAME: &'static str = "StepOutputsMatchInputsAsExpected";

    pub fn new(pairs: Vec<IoPair>) -> Result<Self, ConfigError> {
        if pairs.is_empty() {
            return Err(ConfigError::EmptyExpectation {
                validation: Self::NAME.to_string(),
                field: "inputs_outputs",
            });
        }
        Ok(Self { pairs })
    }

    fn check_pair(&self, pipeline: &Pipeline, pair: &IoPair) -> Result<ValidationResult, LookupError> {
        let input = pipeline
            .step(&pair.input.step_name)?
            .input(&pair.input.input_name)?;
        let output = pipeline
            .step(&pair.output.step_name)?
            .output(&pair.output.output_name)?;

        let referenced = input
            .source
            .references(&pair.output.step_name, &pair.output.output_name);
        let same_location = input
            .source
            .as_uri()
            .is_some_and(|uri| output.destination.as_deref() == Some(uri));
        // A shared location only carries data when the writer runs first.
        let ordered = pipeline.is_upstream(&pair.output.step_name, &pair.input.step_name);

        let subject = pair.to_string();
        let source = input.source.to_value();
        let result = if referenced || (same_location && ordered) {
            ValidationResult::success(
                Self::NAME,
                subject,
                format!("Input source {} matches output {}", source, pair.output.output_name),
            )
        } else if same_location {
            ValidationResult::failure(
                Self::NAME,
                subject,
                format!(
                    "Input source {} is written by step '{}', which does not run before step '{}'",
                    source, pair.output.step_name, pair.input.step_name
                ),
            )
        } else {
            ValidationResult::failure(
                Self::NAME,
                subject,
                format!(
                    "Input source {} does not match output '{}' of step '{}' (destination {})",
                    source,
                    pair.output.output_name,
                    pair.output.step_name,
                    output.destination.as_deref().unwrap_or("unset")
                ),
            )
        };
        Ok(result.with_observed(source))
    }
}

impl Validation for StepOutputsMatchInputsAsExpected {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, pipeline: &Pipeline) -> ValidationOutcome<Vec<ValidationResult>> {
        let results = self
            .pairs
            .iter()
            .map(|pair| {
                self.check_pair(pipeline, pair).unwrap_or_else(|error| {
                    ValidationResult::failure(Self::NAME, pair.to_string(), error.to_string())
                })
            })
            .collect();
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::connection::OutputReference;
    use crate::pipeline::structure::{Step, StepInput, StepOutput, StepType};

    fn pipeline() -> Pipeline {
        Pipeline::builder("p")
            .step(
                Step::new("prep", StepType::Processing)
                    .with_output(StepOutput::new("train").with_destination("s3://bucket/train"))
                    .with_output(StepOutput::new("test").with_destination("s3://bucket/test")),
            )
            .step(
                Step::new("train", StepType::Training)
                    .with_input(StepInput::new("train", OutputReference::new("prep", "train")))
                    .with_input(StepInput::new("test", "s3://bucket/test"))
                    .with_input(StepInput::new("extra", "s3://elsewhere")),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_empty_pairs_rejected() {
        assert!(StepOutputsMatchInputsAsExpected::new(vec![]).is_err());
    }

    #[test]
    fn test_pairs_match() {
        let validation = StepOutputsMatchInputsAsExpected::new(vec![
            IoPair::new("train", "train", "prep", "train"),
            IoPair::new("train", "test", "prep", "test"),
            IoPair::new("train", "extra", "prep", "test"),
            IoPair::new("train", "train", "prep", "test"),
        ])
        .unwrap();
        let results = validation.run(&pipeline()).unwrap();
        let successes: Vec<bool> = results.iter().map(|r| r.is_success()).collect();
        assert_eq!(successes, vec![true, true, false, false]);
        assert_eq!(results[0].subject(), "train.train <- prep.train");
    }

    #[test]
    fn test_shared_location_needs_ordering() {
        let pipeline = Pipeline::builder("p")
            .step(
                Step::new("prep", StepType::Processing)
                    .with_output(StepOutput::new("train").with_destination("s3://bucket/train")),
            )
            .step(
                Step::new("train", StepType::Training)
                    .with_input(StepInput::new("train", "s3://bucket/train")),
            )
            .step(
                Step::new("retrain", StepType::Training)
                    .with_input(StepInput::new("train", "s3://bucket/train"))
                    .depends_on("prep"),
            )
            .build()
            .unwrap();

        let validation = StepOutputsMatchInputsAsExpected::new(vec![
            IoPair::new("train", "train", "prep", "train"),
            IoPair::new("retrain", "train", "prep", "train"),
        ])
        .unwrap();
        let results = validation.run(&pipeline).unwrap();

        assert!(!results[0].is_success());
        assert!(results[0].message().contains("does not run before step 'train'"));
        assert!(results[1].is_success());
    }

    #[test]
    fn test_missing_output_fails_pair() {
        let validation =
            StepOutputsMatchInputsAsExpected::new(vec![IoPair::new("train", "train", "prep", "model")])
                .unwrap();
        let results = validation.run(&pipeline()).unwrap();
        assert_eq!(results.len(), 1);
        assert!(!results[0].is_success());
        assert!(results[0].message().contains("model"));
    }
}
