//! Existence validations backed by a resource catalog.

use crate::core::error::{ConfigError, LookupError, ValidationOutcome};
use crate::lookup::{ResourceCatalog, ResourceKind};
use crate::pipeline::structure::{Pipeline, Step, StepType};
use crate::validation::filter::{check_steps, StepFilter};
use crate::validation::result::ValidationResult;
use crate::validation::Validation;
use std::fmt;
use std::sync::Arc;

type Identifier = fn(&Step) -> Result<&str, LookupError>;

/// The part every existence validation shares.
#[derive(Clone)]
struct ExistenceCheck {
    name: &'static str,
    kind: ResourceKind,
    filter: StepFilter,
    eligible: fn(StepType) -> bool,
    identifier: Identifier,
    catalog: Arc<dyn ResourceCatalog>,
}

impl fmt::Debug for ExistenceCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExistenceCheck")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("filter", &self.filter)
            .field("catalog", &self.catalog.name())
            .finish_non_exhaustive()
    }
}

impl ExistenceCheck {
    fn new(
        name: &'static str,
        kind: ResourceKind,
        filter: StepFilter,
        eligible: fn(StepType) -> bool,
        identifier: Identifier,
        catalog: Arc<dyn ResourceCatalog>,
    ) -> Result<Self, ConfigError> {
        filter.check(name)?;
        Ok(Self {
            name,
            kind,
            filter,
            eligible,
            identifier,
            catalog,
        })
    }

    fn run(&self, pipeline: &Pipeline) -> ValidationOutcome<Vec<ValidationResult>> {
        check_steps(self.name, &self.filter, pipeline, self.eligible, |step| {
            let identifier = (self.identifier)(step)?;
            let found = self.catalog.exists(self.kind, identifier)?;
            log::debug!(
                "{}: {} '{}' found={} ({})",
                self.name,
                self.kind,
                identifier,
                found,
                self.catalog.name()
            );

            let result = if found {
                ValidationResult::success(
                    self.name,
                    &step.name,
                    format!("{} '{}' exists in {}", self.kind, identifier, self.catalog.name()),
                )
            } else {
                ValidationResult::failure(
                    self.name,
                    &step.name,
                    format!("{} '{}' not found in {}", self.kind, identifier, self.catalog.name()),
                )
            };
            Ok(result.with_observed(identifier))
        })
    }
}

fn required<'s>(
    step: &'s Step,
    supported: bool,
    attribute: &'static str,
    value: &'s Option<String>,
) -> Result<&'s str, LookupError> {
    step.require(supported, attribute)?;
    value.as_deref().ok_or_else(|| LookupError::AttributeMissing {
        step: step.name.clone(),
        attribute,
    })
}

fn image_uri(step: &Step) -> Result<&str, LookupError> {
    required(step, step.step_type.runs_container(), "image_uri", &step.image_uri)
}

fn role(step: &Step) -> Result<&str, LookupError> {
    required(step, step.step_type.runs_container(), "role", &step.role)
}

fn lambda_function(step: &Step) -> Result<&str, LookupError> {
    required(
        step,
        step.step_type == StepType::Lambda,
        "lambda_function",
        &step.lambda_function,
    )
}

fn sqs_queue_url(step: &Step) -> Result<&str, LookupError> {
    required(
        step,
        step.step_type == StepType::Callback,
        "sqs_queue_url",
        &step.sqs_queue_url,
    )
}

fn runs_container(step_type: StepType) -> bool {
    step_type.runs_container()
}

fn is_lambda(step_type: StepType) -> bool {
    step_type == StepType::Lambda
}

fn is_callback(step_type: StepType) -> bool {
    step_type == StepType::Callback
}

/// Checks that every step's container image exists in its registry.
#[derive(Debug, Clone)]
pub struct StepImagesExist {
    check: ExistenceCheck,
}

impl StepImagesExist {
    pub const NAME: &'static str = "StepImagesExist";

    pub fn new(catalog: Arc<dyn ResourceCatalog>, filter: StepFilter) -> Result<Self, ConfigError> {
        let check = ExistenceCheck::new(
            Self::NAME,
            ResourceKind::Image,
            filter,
            runs_container,
            image_uri,
            catalog,
        )?;
        Ok(Self { check })
    }
}

impl Validation for StepImagesExist {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, pipeline: &Pipeline) -> ValidationOutcome<Vec<ValidationResult>> {
        self.check.run(pipeline)
    }
}

/// Checks that every step's execution role exists.
#[derive(Debug, Clone)]
pub struct StepRoleNameExists {
    check: ExistenceCheck,
}

impl StepRoleNameExists {
    pub const NAME: &'static str = "StepRoleNameExists";

    pub fn new(catalog: Arc<dyn ResourceCatalog>, filter: StepFilter) -> Result<Self, ConfigError> {
        let check = ExistenceCheck::new(
            Self::NAME,
            ResourceKind::Role,
            filter,
            runs_container,
            role,
            catalog,
        )?;
        Ok(Self { check })
    }
}

impl Validation for StepRoleNameExists {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, pipeline: &Pipeline) -> ValidationOutcome<Vec<ValidationResult>> {
        self.check.run(pipeline)
    }
}

/// Checks that the function behind every Lambda step exists.
#[derive(Debug, Clone)]
pub struct StepLambdaFunctionExists {
    check: ExistenceCheck,
}

impl StepLambdaFunctionExists {
    pub const NAME: &'static str = "StepLambdaFunctionExists";

    pub fn new(catalog: Arc<dyn ResourceCatalog>, filter: StepFilter) -> Result<Self, ConfigError> {
        let check = ExistenceCheck::new(
            Self::NAME,
            ResourceKind::LambdaFunction,
            filter,
            is_lambda,
            lambda_function,
            catalog,
        )?;
        Ok(Self { check })
    }
}

impl Validation for StepLambdaFunctionExists {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, pipeline: &Pipeline) -> ValidationOutcome<Vec<ValidationResult>> {
        self.check.run(pipeline)
    }
}

/// Checks that the queue every Callback step posts to exists.
#[derive(Debug, Clone)]
pub struct StepCallbackSqsQueueExists {
    check: ExistenceCheck,
}

impl StepCallbackSqsQueueExists {
    pub const NAME: &'static str = "StepCallbackSqsQueueExists";

    pub fn new(catalog: Arc<dyn ResourceCatalog>, filter: StepFilter) -> Result<Self, ConfigError> {
        let check = ExistenceCheck::new(
            Self::NAME,
            ResourceKind::Queue,
            filter,
            is_callback,
            sqs_queue_url,
            catalog,
        )?;
        Ok(Self { check })
    }
}

impl Validation for StepCallbackSqsQueueExists {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, pipeline: &Pipeline) -> ValidationOutcome<Vec<ValidationResult>> {
        self.check.run(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ExternalLookupError;
    use crate::lookup::Inventory;

    struct DenyingCatalog;

    impl ResourceCatalog for DenyingCatalog {
        fn name(&self) -> &str {
            "denying"
        }

        fn exists(&self, kind: ResourceKind, identifier: &str) -> Result<bool, ExternalLookupError> {
            Err(ExternalLookupError::PermissionDenied {
                kind,
                identifier: identifier.to_string(),
                status: 403,
            })
        }
    }

    fn pipeline() -> Pipeline {
        Pipeline::builder("p")
            .step(
                Step::new("train", StepType::Training)
                    .with_image("repo/img:1")
                    .with_role("arn:aws:iam::0123456789:role/roleA"),
            )
            .step(Step::new("process", StepType::Processing).with_image("repo/img:2"))
            .step(Step::new("notify", StepType::Lambda).with_lambda_function("notify"))
            .step(
                Step::new("approve", StepType::Callback)
                    .with_sqs_queue_url("https://sqs.us-east-1.amazonaws.com/1/approvals"),
            )
            .build()
            .unwrap()
    }

    fn inventory() -> Arc<dyn ResourceCatalog> {
        Arc::new(
            Inventory::new()
                .with(ResourceKind::Image, "repo/img:1")
                .with(ResourceKind::Role, "roleA")
                .with(ResourceKind::LambdaFunction, "notify")
                .with(ResourceKind::Queue, "approvals"),
        )
    }

    #[test]
    fn test_images_exist() {
        let results = StepImagesExist::new(inventory(), StepFilter::all())
            .unwrap()
            .run(&pipeline())
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_success());
        assert!(!results[1].is_success());
        assert!(results[1].message().contains("repo/img:2"));
    }

    #[test]
    fn test_role_missing_attribute_fails() {
        let results = StepRoleNameExists::new(inventory(), StepFilter::all())
            .unwrap()
            .run(&pipeline())
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_success());
        assert!(!results[1].is_success());
        assert!(results[1].message().contains("does not set role"));
    }

    #[test]
    fn test_lambda_and_queue_exist() {
        let lambda = StepLambdaFunctionExists::new(inventory(), StepFilter::all())
            .unwrap()
            .run(&pipeline())
            .unwrap();
        assert_eq!(lambda.len(), 1);
        assert!(lambda[0].is_success());

        let queue = StepCallbackSqsQueueExists::new(inventory(), StepFilter::all())
            .unwrap()
            .run(&pipeline())
            .unwrap();
        assert_eq!(queue.len(), 1);
        assert!(queue[0].is_success());
    }

    #[test]
    fn test_lookup_failure_becomes_failed_result() {
        let results = StepImagesExist::new(Arc::new(DenyingCatalog), StepFilter::by_name("train"))
            .unwrap()
            .run(&pipeline())
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(!results[0].is_success());
        assert!(results[0].message().contains("403"));
    }

    #[test]
    fn test_no_callback_steps_yields_nothing() {
        let pipeline = Pipeline::builder("p")
            .step(Step::new("train", StepType::Training))
            .build()
            .unwrap();
        let results = StepCallbackSqsQueueExists::new(inventory(), StepFilter::all())
            .unwrap()
            .run(&pipeline)
            .unwrap();
        assert!(results.is_empty());
    }
}
