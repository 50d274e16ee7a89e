//! Step selection shared by step-scope validations.

use crate::core::error::{
    ComparisonError, ConfigError, ExternalLookupError, LookupError, ValidationError,
    ValidationOutcome,
};
use crate::pipeline::structure::{Pipeline, Step, StepType};
use crate::validation::result::ValidationResult;
use serde::{Deserialize, Serialize};

/// Which steps a validation applies to.
///
/// At most one of `step_name` and `step_type` may be set. With neither set
/// the validation applies to every eligible step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_type: Option<StepType>,
}

impl StepFilter {
    /// Match every eligible step.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_name(step_name: impl Into<String>) -> Self {
        Self {
            step_name: Some(step_name.into()),
            step_type: None,
        }
    }

    pub fn by_type(step_type: StepType) -> Self {
        Self {
            step_name: None,
            step_type: Some(step_type),
        }
    }

    /// Reject a filter that sets both a name and a type.
    pub fn check(&self, validation: &str) -> Result<(), ConfigError> {
        if self.step_name.is_some() && self.step_type.is_some() {
            return Err(ConfigError::ConflictingFilters {
                validation: validation.to_string(),
            });
        }
        Ok(())
    }

    /// Resolve the target steps in definition order.
    ///
    /// Eligibility only narrows the unfiltered case; a step selected by name
    /// or type is returned even when ineligible, so the attribute lookup can
    /// report why it does not apply.
    pub fn resolve<'p>(
        &self,
        pipeline: &'p Pipeline,
        eligible: fn(StepType) -> bool,
    ) -> Vec<Result<&'p Step, LookupError>> {
        match (&self.step_name, self.step_type) {
            (Some(name), _) => vec![pipeline.step(name)],
            (None, Some(step_type)) => pipeline.steps_of_type(step_type).map(Ok).collect(),
            (None, None) => pipeline
                .steps()
                .filter(|s| eligible(s.step_type))
                .map(Ok)
                .collect(),
        }
    }
}

/// Why a check on one step did not produce a result.
#[derive(Debug)]
pub(crate) enum StepCheckError {
    Lookup(LookupError),
    External(ExternalLookupError),
    Comparison(ComparisonError),
}

impl From<LookupError> for StepCheckError {
    fn from(error: LookupError) -> Self {
        StepCheckError::Lookup(error)
    }
}

impl From<ExternalLookupError> for StepCheckError {
    fn from(error: ExternalLookupError) -> Self {
        StepCheckError::External(error)
    }
}

impl From<ComparisonError> for StepCheckError {
    fn from(error: ComparisonError) -> Self {
        StepCheckError::Comparison(error)
    }
}

/// Run `check` on every step selected by `filter`.
///
/// Lookup failures, on resolution or inside `check`, become failed results
/// for that step. Comparison errors abort the validation.
pub(crate) fn check_steps<F>(
    validation: &str,
    filter: &StepFilter,
    pipeline: &Pipeline,
    eligible: fn(StepType) -> bool,
    mut check: F,
) -> ValidationOutcome<Vec<ValidationResult>>
where
    F: FnMut(&Step) -> Result<ValidationResult, StepCheckError>,
{
    let mut results = Vec::new();

    for resolved in filter.resolve(pipeline, eligible) {
        let step = match resolved {
            Ok(step) => step,
            Err(error) => {
                results.push(ValidationResult::from_lookup_error(validation, &error));
                continue;
            }
        };

        let result = match check(step) {
            Ok(result) => result,
            Err(StepCheckError::Lookup(error)) => {
                ValidationResult::from_lookup_error(validation, &error)
            }
            Err(StepCheckError::External(error)) => {
                log::warn!("{}: lookup failed for step '{}': {}", validation, step.name, error);
                ValidationResult::failure(validation, &step.name, error.to_string())
            }
            Err(StepCheckError::Comparison(source)) => {
                return Err(ValidationError::Comparison {
                    validation: validation.to_string(),
                    source,
                })
            }
        };
        results.push(result);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> Pipeline {
        Pipeline::builder("p")
            .step(Step::new("prep", StepType::Processing))
            .step(Step::new("train", StepType::Training))
            .step(Step::new("notify", StepType::Lambda))
            .build()
            .unwrap()
    }

    #[test]
    fn test_conflicting_filters() {
        let filter = StepFilter {
            step_name: Some("prep".to_string()),
            step_type: Some(StepType::Processing),
        };
        assert_eq!(
            filter.check("V"),
            Err(ConfigError::ConflictingFilters {
                validation: "V".to_string()
            })
        );
        assert!(StepFilter::by_name("prep").check("V").is_ok());
    }

    #[test]
    fn test_resolve_all_eligible() {
        let pipeline = pipeline();
        let steps = StepFilter::all().resolve(&pipeline, |t| t.runs_container());
        let names: Vec<_> = steps.into_iter().map(|s| s.unwrap().name.as_str()).collect();
        assert_eq!(names, vec!["prep", "train"]);
    }

    #[test]
    fn test_resolve_by_type_ignores_eligibility() {
        let pipeline = pipeline();
        let steps = StepFilter::by_type(StepType::Lambda).resolve(&pipeline, |t| t.runs_container());
        assert_eq!(steps.len(), 1);
    }

    #[test]
    fn test_resolve_missing_name() {
        let pipeline = pipeline();
        let steps = StepFilter::by_name("ghost").resolve(&pipeline, |_| true);
        assert_eq!(
            steps[0].clone().unwrap_err(),
            LookupError::StepNotFound("ghost".to_string())
        );
    }

    #[test]
    fn test_check_steps_fail_soft() {
        let pipeline = pipeline();
        let results = check_steps(
            "V",
            &StepFilter::by_name("notify"),
            &pipeline,
            |_| true,
            |step| Err(step.require(false, "kms_key").unwrap_err().into()),
        )
        .unwrap();
        assert_eq!(results.len(), 1);
        assert!(!results[0].is_success());
        assert_eq!(results[0].subject(), "notify");
    }

    #[test]
    fn test_check_steps_comparison_propagates() {
        let pipeline = pipeline();
        let error = check_steps("V", &StepFilter::all(), &pipeline, |_| true, |_| {
            Err(ComparisonError::Incompatible {
                rule: "Contains",
                actual: "integer",
                expected: "integer",
            }
            .into())
        })
        .unwrap_err();
        assert!(matches!(error, ValidationError::Comparison { .. }));
    }
}
