//! # Steplint - Pre-deployment checks for ML pipeline definitions
//!
//! Steplint validates the structure and configuration of a machine-learning
//! pipeline definition (a graph of processing, training, callback and other
//! steps) against a declarative rule set, and produces a pass/fail report.
//!
//! ## Features
//!
//! - **Typed pipeline model**: JSON or TOML definitions, checked for duplicate
//!   steps, dangling references and dependency cycles on load
//! - **Rules**: `Equals` and `Contains`, each invertible
//! - **Validations**: parameters, KMS keys, roles, tags, network settings,
//!   inputs and outputs, cross-step wiring, resource existence
//! - **Reports**: aligned tables, JSON and summary counts
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use steplint::prelude::*;
//!
//! let pipeline = Pipeline::builder("training")
//!     .step(Step::new("train", StepType::Training).with_role("arn:aws:iam::1:role/roleA"))
//!     .step(Step::new("process", StepType::Processing).with_role("roleA"))
//!     .build()?;
//!
//! let validations: Vec<Box<dyn Validation>> = vec![Box::new(
//!     StepRoleNameAsExpected::new("roleA", Rule::equals(), StepFilter::all())?,
//! )];
//!
//! let report = Configuration::new(&pipeline, validations)?.run()?;
//! println!("{}", report.to_table());
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: Values and error types
//! - [`pipeline`]: Pipeline model, dependency graph and loading
//! - [`rules`]: Comparison rules
//! - [`lookup`]: Resource catalogs for existence checks
//! - [`validation`]: The validation family
//! - [`execution`]: Configurations and reports
//! - [`config`]: Configuration files

#![warn(clippy::all)]

pub mod core;
pub mod pipeline;
pub mod rules;
pub mod lookup;
pub mod validation;
pub mod execution;
pub mod config;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use steplint::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::types::Value;

    // Errors
    pub use crate::core::error::{
        ComparisonError, ConfigError, ExternalLookupError, LintError, LintResult, LookupError,
        PipelineError, ValidationError,
    };

    // Pipeline
    pub use crate::pipeline::connection::{DataSource, OutputReference};
    pub use crate::pipeline::serialization::{load_pipeline, PipelineDocument};
    pub use crate::pipeline::structure::{
        NetworkConfig, Parameter, Pipeline, Step, StepInput, StepOutput, StepType, Tag,
    };

    // Rules
    pub use crate::rules::{Rule, RuleKind};

    // Lookups
    pub use crate::lookup::{
        AuthScheme, ContainerImage, Inventory, RegistryCatalog, RegistrySettings,
        ResourceCatalog, ResourceKind,
    };

    // Validations
    pub use crate::validation::{
        IoPair, PipelineParametersAsExpected, PipelineProcessingStepsIONamesUnique,
        StepCallbackSqsQueueExists, StepFilter, StepImagesExist, StepInputsAsExpected,
        StepKmsKeyIdAsExpected, StepLambdaFunctionExists, StepNetworkConfigAsExpected,
        StepOutputsAsExpected, StepOutputsMatchInputsAsExpected, StepRoleNameAsExpected,
        StepRoleNameExists, StepTagsAsExpected, Validation, ValidationResult,
    };

    // Execution
    pub use crate::execution::{Configuration, Report, ReportSummary, RunOptions, Table};

    // Configuration files
    pub use crate::config::{discover, ConfigDocument, LoadedConfiguration, ValidationSpec};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "steplint");
    }

    #[test]
    fn test_prelude_round_trip() {
        let pipeline = Pipeline::builder("p")
            .step(Step::new("train", StepType::Training).with_role("roleA"))
            .build()
            .unwrap();
        let validations: Vec<Box<dyn Validation>> = vec![Box::new(
            StepRoleNameAsExpected::new("roleA", Rule::equals(), StepFilter::all()).unwrap(),
        )];
        let report = Configuration::new(&pipeline, validations)
            .unwrap()
            .run()
            .unwrap();
        assert!(report.is_success());
        assert_eq!(report.summary().total, 1);
    }
}
