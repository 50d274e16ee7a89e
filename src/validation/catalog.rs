//! Descriptions of the available validation kinds.

/// A validation kind as written in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationKind {
    /// Value of the `kind` key.
    pub kind: &'static str,
    /// Name reported in results.
    pub name: &'static str,
    pub description: &'static str,
}

/// Every validation kind, in `steplint list` order.
pub const VALIDATION_KINDS: &[ValidationKind] = &[
    ValidationKind {
        kind: "pipeline_parameters",
        name: "PipelineParametersAsExpected",
        description: "Compare declared pipeline parameters with an expected list",
    },
    ValidationKind {
        kind: "processing_io_names_unique",
        name: "PipelineProcessingStepsIONamesUnique",
        description: "Require unique input and output names on Processing steps",
    },
    ValidationKind {
        kind: "kms_key",
        name: "StepKmsKeyIdAsExpected",
        description: "Compare the KMS key id of container steps",
    },
    ValidationKind {
        kind: "role_name",
        name: "StepRoleNameAsExpected",
        description: "Compare the execution role name of container steps",
    },
    ValidationKind {
        kind: "tags",
        name: "StepTagsAsExpected",
        description: "Compare the tags of container steps",
    },
    ValidationKind {
        kind: "network_config",
        name: "StepNetworkConfigAsExpected",
        description: "Compare the network settings of Processing, Training and Tuning steps",
    },
    ValidationKind {
        kind: "inputs",
        name: "StepInputsAsExpected",
        description: "Compare the inputs of container steps",
    },
    ValidationKind {
        kind: "outputs",
        name: "StepOutputsAsExpected",
        description: "Compare the outputs of container steps",
    },
    ValidationKind {
        kind: "outputs_match_inputs",
        name: "StepOutputsMatchInputsAsExpected",
        description: "Require declared inputs to read declared upstream outputs",
    },
    ValidationKind {
        kind: "images_exist",
        name: "StepImagesExist",
        description: "Look up every container image in its registry",
    },
    ValidationKind {
        kind: "role_exists",
        name: "StepRoleNameExists",
        description: "Look up the execution role of container steps",
    },
    ValidationKind {
        kind: "lambda_function_exists",
        name: "StepLambdaFunctionExists",
        description: "Look up the function behind every Lambda step",
    },
    ValidationKind {
        kind: "callback_queue_exists",
        name: "StepCallbackSqsQueueExists",
        description: "Look up the queue every Callback step posts to",
    },
];

/// Find a kind by its configuration key.
pub fn find(kind: &str) -> Option<&'static ValidationKind> {
    VALIDATION_KINDS.iter().find(|k| k.kind == kind)
}
