//! Core types shared by every part of steplint:
//! - Structured values that rules compare
//! - Error types

pub mod types;
pub mod error;

// Re-export commonly used types
pub use types::Value;
pub use error::{
    ComparisonError, ConfigError, ExternalLookupError, LintError, LookupError, PipelineError,
    ValidationError,
};
