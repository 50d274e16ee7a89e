//! Pipeline module for the definitions under validation.
//!
//! A pipeline is a directed acyclic graph of named steps. Edges come from
//! explicit `depends_on` lists and from inputs that read another step's
//! output.

pub mod structure;
pub mod connection;
pub mod topology;
pub mod serialization;

// Re-export commonly used types
pub use structure::{
    NetworkConfig, Parameter, Pipeline, PipelineBuilder, Step, StepInput, StepOutput, StepType,
    Tag,
};
pub use connection::{DataSource, OutputReference};
pub use topology::DependencyGraph;
pub use serialization::{load_pipeline, PipelineDocument};
