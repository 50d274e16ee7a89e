//! Validations applied to a pipeline.
//!
//! Each validation reads specific attributes off the pipeline, applies a
//! rule or an existence lookup, and returns one result per subject.

pub mod result;
pub mod filter;
pub mod parameters;
pub mod attributes;
pub mod existence;
pub mod matching;
pub mod catalog;

pub use result::ValidationResult;
pub use filter::StepFilter;
pub use parameters::{PipelineParametersAsExpected, PipelineProcessingStepsIONamesUnique};
pub use attributes::{
    StepInputsAsExpected, StepKmsKeyIdAsExpected, StepNetworkConfigAsExpected,
    StepOutputsAsExpected, StepRoleNameAsExpected, StepTagsAsExpected,
};
pub use existence::{
    StepCallbackSqsQueueExists, StepImagesExist, StepLambdaFunctionExists, StepRoleNameExists,
};
pub use matching::{InputSelector, IoPair, OutputSelector, StepOutputsMatchInputsAsExpected};
pub use catalog::{ValidationKind, VALIDATION_KINDS};

use crate::core::error::ValidationOutcome;
use crate::pipeline::structure::Pipeline;

/// Trait for validations.
pub trait Validation: Send + Sync {
    /// Name of this validation, used as `validation_name` in results.
    fn name(&self) -> &str;

    /// Check the pipeline.
    ///
    /// Per-step lookup failures are returned as failed results; only
    /// comparison and configuration errors are returned as `Err`.
    fn run(&self, pipeline: &Pipeline) -> ValidationOutcome<Vec<ValidationResult>>;
}
