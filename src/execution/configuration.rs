//! Running a list of validations against one pipeline.

use crate::core::error::{ConfigError, ValidationOutcome};
use crate::execution::report::Report;
use crate::pipeline::structure::Pipeline;
use crate::validation::Validation;

/// Options for a single run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Stop after the first validation with a failed result.
    pub fail_fast: bool,
}

impl RunOptions {
    pub fn fail_fast() -> Self {
        Self { fail_fast: true }
    }
}

/// A pipeline paired with the validations to run against it.
///
/// The pipeline is borrowed and never modified, so a configuration can be
/// run any number of times with the same outcome.
pub struct Configuration<'p> {
    pipeline: &'p Pipeline,
    validations: Vec<Box<dyn Validation>>,
}

impl<'p> Configuration<'p> {
    /// Fails if `validations` is empty.
    pub fn new(
        pipeline: &'p Pipeline,
        validations: Vec<Box<dyn Validation>>,
    ) -> Result<Self, ConfigError> {
        if validations.is_empty() {
            return Err(ConfigError::EmptyValidations);
        }
        Ok(Self {
            pipeline,
            validations,
        })
    }

    pub fn pipeline(&self) -> &'p Pipeline {
        self.pipeline
    }

    pub fn len(&self) -> usize {
        self.validations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validations.is_empty()
    }

    /// Run every validation in order.
    pub fn run(&self) -> ValidationOutcome<Report> {
        self.run_with(RunOptions::default())
    }

    /// Run with options.
    pub fn run_with(&self, options: RunOptions) -> ValidationOutcome<Report> {
        let mut report = Report::new();
        let last = self.validations.len().saturating_sub(1);

        for (index, validation) in self.validations.iter().enumerate() {
            let results = validation.run(self.pipeline)?;
            log::debug!("{} produced {} result(s)", validation.name(), results.len());

            if results.is_empty() {
                log::warn!(
                    "Validation {} matched no steps of pipeline '{}'",
                    validation.name(),
                    self.pipeline.name()
                );
                report.add_unmatched(validation.name());
                continue;
            }

            let failed = results.iter().any(|r| !r.is_success());
            for result in results {
                report.add(result);
            }

            if failed && options.fail_fast && index != last {
                log::info!(
                    "Validation {} failed; stopping early (fail_fast)",
                    validation.name()
                );
                report.mark_stopped_early();
                break;
            }
        }

        log::info!("Pipeline '{}': {}", self.pipeline.name(), report.summary());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::structure::{Step, StepType};
    use crate::rules::Rule;
    use crate::validation::{
        StepCallbackSqsQueueExists, StepFilter, StepKmsKeyIdAsExpected, StepRoleNameAsExpected,
    };
    use crate::lookup::Inventory;
    use std::sync::Arc;

    fn pipeline() -> Pipeline {
        Pipeline::builder("p")
            .step(Step::new("train", StepType::Training).with_role("roleA"))
            .step(Step::new("process", StepType::Processing).with_role("roleA"))
            .build()
            .unwrap()
    }

    fn role(expected: &str) -> Box<dyn Validation> {
        Box::new(StepRoleNameAsExpected::new(expected, Rule::equals(), StepFilter::all()).unwrap())
    }

    #[test]
    fn test_empty_validations_rejected() {
        let pipeline = pipeline();
        assert_eq!(
            Configuration::new(&pipeline, vec![]).err(),
            Some(ConfigError::EmptyValidations)
        );
    }

    #[test]
    fn test_results_in_validation_order() {
        let pipeline = pipeline();
        let configuration = Configuration::new(&pipeline, vec![role("roleA"), role("roleB")]).unwrap();
        let report = configuration.run().unwrap();

        assert_eq!(report.len(), 4);
        let successes: Vec<bool> = report.iter().map(|r| r.is_success()).collect();
        assert_eq!(successes, vec![true, true, false, false]);
        assert!(!report.stopped_early());
    }

    #[test]
    fn test_fail_fast_stops_after_failing_validation() {
        let pipeline = pipeline();
        let configuration = Configuration::new(
            &pipeline,
            vec![role("roleB"), role("roleA"), role("roleA")],
        )
        .unwrap();

        let report = configuration.run_with(RunOptions::fail_fast()).unwrap();
        assert_eq!(report.len(), 2);
        assert!(report.stopped_early());

        let full = configuration.run().unwrap();
        assert_eq!(full.len(), 6);
    }

    #[test]
    fn test_fail_fast_on_last_validation_is_not_early() {
        let pipeline = pipeline();
        let configuration = Configuration::new(&pipeline, vec![role("roleA"), role("roleB")]).unwrap();
        let report = configuration.run_with(RunOptions::fail_fast()).unwrap();
        assert_eq!(report.len(), 4);
        assert!(!report.stopped_early());
    }

    #[test]
    fn test_unmatched_validation_recorded() {
        let pipeline = pipeline();
        let queue = StepCallbackSqsQueueExists::new(Arc::new(Inventory::new()), StepFilter::all())
            .unwrap();
        let validations: Vec<Box<dyn Validation>> = vec![Box::new(queue), role("roleA")];
        let configuration = Configuration::new(&pipeline, validations).unwrap();
        let report = configuration.run().unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report.unmatched(), ["StepCallbackSqsQueueExists".to_string()]);
        assert_eq!(report.summary().unmatched, 1);
        assert!(report.is_success());
    }

    #[test]
    fn test_comparison_error_propagates() {
        let pipeline = Pipeline::builder("p")
            .step(Step::new("train", StepType::Training).with_kms_key("k"))
            .build()
            .unwrap();
        let kms = StepKmsKeyIdAsExpected::new(true, Rule::contains(), StepFilter::all()).unwrap();
        let configuration = Configuration::new(&pipeline, vec![Box::new(kms) as Box<dyn Validation>]).unwrap();
        assert!(configuration.run().is_err());
    }

    #[test]
    fn test_run_is_repeatable() {
        let pipeline = pipeline();
        let configuration = Configuration::new(&pipeline, vec![role("roleA"), role("roleB")]).unwrap();
        assert_eq!(configuration.run().unwrap(), configuration.run().unwrap());
    }
}
