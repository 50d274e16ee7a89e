//! Error types for steplint.
//!
//! Uses thiserror for structured errors with context. The split follows how
//! each kind is handled at run time:
//! - Lookup and external lookup errors are data/environment problems and are
//!   turned into failed results by the validation that hit them
//! - Comparison and configuration errors are programmer errors and propagate

use crate::lookup::ResourceKind;
use crate::pipeline::structure::StepType;
use thiserror::Error;

/// Top-level error type for steplint.
///
/// This enum encompasses all error categories and enables automatic
/// conversion between specific error types.
#[derive(Error, Debug)]
pub enum LintError {
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that make a pipeline definition unusable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Step '{0}' is defined more than once")]
    DuplicateStep(String),

    #[error("Step '{step}' depends on unknown step '{dependency}'")]
    UnknownDependency { step: String, dependency: String },

    #[error("Input '{input}' of step '{step}' references unknown step '{referenced}'")]
    UnknownReference {
        step: String,
        input: String,
        referenced: String,
    },

    #[error("Dependency cycle detected involving steps: {steps:?}")]
    CycleDetected { steps: Vec<String> },

    #[error("Failed to parse pipeline definition: {0}")]
    Parse(String),

    #[error("Unsupported pipeline definition format: {0}")]
    UnsupportedFormat(String),

    #[error("Pipeline definition version {found} is not supported (expected {supported})")]
    UnsupportedVersion {
        found: String,
        supported: &'static str,
    },
}

/// Incompatible operands given to a rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComparisonError {
    #[error("{rule} cannot compare {actual} with {expected}")]
    Incompatible {
        rule: &'static str,
        actual: &'static str,
        expected: &'static str,
    },
}

/// A named step or attribute does not exist on the pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Step '{0}' not found in pipeline")]
    StepNotFound(String),

    #[error("Input '{input}' not found on step '{step}'")]
    InputNotFound { step: String, input: String },

    #[error("Output '{output}' not found on step '{step}'")]
    OutputNotFound { step: String, output: String },

    #[error("Step '{step}' of type {step_type} has no {attribute}")]
    AttributeNotSupported {
        step: String,
        step_type: StepType,
        attribute: &'static str,
    },

    #[error("Step '{step}' does not set {attribute}")]
    AttributeMissing { step: String, attribute: &'static str },
}

/// An existence lookup against an external service failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExternalLookupError {
    #[error("Access denied looking up {kind} '{identifier}' (HTTP {status})")]
    PermissionDenied {
        kind: ResourceKind,
        identifier: String,
        status: u16,
    },

    #[error("Unexpected HTTP {status} looking up {kind} '{identifier}'")]
    UnexpectedStatus {
        kind: ResourceKind,
        identifier: String,
        status: u16,
    },

    #[error("Transport failure looking up {kind} '{identifier}': {message}")]
    Transport {
        kind: ResourceKind,
        identifier: String,
        message: String,
    },

    #[error("Malformed {kind} identifier '{identifier}': {reason}")]
    MalformedIdentifier {
        kind: ResourceKind,
        identifier: String,
        reason: String,
    },

    #[error("Catalog '{catalog}' cannot look up {kind} resources")]
    Unsupported {
        catalog: String,
        kind: ResourceKind,
    },
}

/// Malformed configuration supplied by the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("A configuration needs at least one validation")]
    EmptyValidations,

    #[error("{validation}: step_name and step_type are mutually exclusive")]
    ConflictingFilters { validation: String },

    #[error("{validation}: {field} must not be empty")]
    EmptyExpectation {
        validation: String,
        field: &'static str,
    },

    #[error("Unknown step type '{0}'")]
    UnknownStepType(String),

    #[error("Configuration version {found} is not supported (expected {supported})")]
    UnsupportedVersion {
        found: String,
        supported: &'static str,
    },

    #[error("Failed to parse configuration {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    #[error("No configuration files found under {0}")]
    NothingFound(String),
}

/// Errors a validation lets escape its own run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{validation}: {source}")]
    Comparison {
        validation: String,
        #[source]
        source: ComparisonError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ============================================================================
// Error Utilities
// ============================================================================

impl LookupError {
    /// Step the error is about.
    pub fn step(&self) -> &str {
        match self {
            LookupError::StepNotFound(step) => step,
            LookupError::InputNotFound { step, .. }
            | LookupError::OutputNotFound { step, .. }
            | LookupError::AttributeNotSupported { step, .. }
            | LookupError::AttributeMissing { step, .. } => step,
        }
    }
}

impl ExternalLookupError {
    /// Whether the lookup was refused rather than failing to complete.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, ExternalLookupError::PermissionDenied { .. })
    }
}

impl LintError {
    /// Wrap an I/O error with the path that caused it.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        LintError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for steplint operations.
pub type LintResult<T> = Result<T, LintError>;

/// Result type alias for pipeline construction.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type alias for validation runs.
pub type ValidationOutcome<T> = Result<T, ValidationError>;
