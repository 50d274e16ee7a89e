//! Existence lookups for resources a pipeline refers to.
//!
//! Validations that check whether an image, role, Lambda function or queue
//! exists go through a [`ResourceCatalog`]. Two catalogs ship with the crate:
//! - [`Inventory`]: a static list, used offline and in tests
//! - [`RegistryCatalog`]: asks container registries over HTTP

pub mod image;
pub mod inventory;
pub mod registry;

pub use image::ContainerImage;
pub use inventory::Inventory;
pub use registry::{AuthScheme, RegistryCatalog, RegistrySettings};

use crate::core::error::ExternalLookupError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of resource a lookup is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Image,
    Role,
    LambdaFunction,
    Queue,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::Role => "role",
            ResourceKind::LambdaFunction => "lambda function",
            ResourceKind::Queue => "queue",
        }
    }

    /// Normalize an identifier so ARNs, URLs and bare names compare equal.
    ///
    /// - role: `arn:aws:iam::1:role/path/Name` becomes `Name`
    /// - lambda function: `arn:aws:lambda:r:1:function:name[:alias]` becomes `name`
    /// - queue: `https://sqs.r.amazonaws.com/1/name` or `arn:aws:sqs:r:1:name` becomes `name`
    /// - image: `name` becomes `docker.io/library/name:latest`
    pub fn canonical(&self, identifier: &str) -> String {
        let identifier = identifier.trim();
        match self {
            ResourceKind::Role => last_segment(identifier, '/').to_string(),
            ResourceKind::LambdaFunction => match identifier.split_once(":function:") {
                Some((_, rest)) => rest.split(':').next().unwrap_or(rest).to_string(),
                None => identifier.to_string(),
            },
            ResourceKind::Queue => {
                if identifier.starts_with("arn:") {
                    last_segment(identifier, ':').to_string()
                } else {
                    last_segment(identifier.trim_end_matches('/'), '/').to_string()
                }
            }
            ResourceKind::Image => ContainerImage::parse(identifier)
                .map(|image| image.to_string())
                .unwrap_or_else(|_| identifier.to_string()),
        }
    }
}

fn last_segment(identifier: &str, separator: char) -> &str {
    identifier.rsplit(separator).next().unwrap_or(identifier)
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source of truth for whether external resources exist.
///
/// Implementations must be `Send + Sync` so validations holding one stay
/// `Send + Sync` themselves.
pub trait ResourceCatalog: Send + Sync {
    /// Catalog name, used in logs and errors.
    fn name(&self) -> &str;

    /// Whether the resource exists.
    fn exists(&self, kind: ResourceKind, identifier: &str) -> Result<bool, ExternalLookupError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_role() {
        assert_eq!(
            ResourceKind::Role.canonical("arn:aws:iam::0123456789:role/service/TestRole"),
            "TestRole"
        );
        assert_eq!(ResourceKind::Role.canonical("TestRole"), "TestRole");
    }

    #[test]
    fn test_canonical_lambda() {
        assert_eq!(
            ResourceKind::LambdaFunction
                .canonical("arn:aws:lambda:eu-west-1:0123456789:function:notify:prod"),
            "notify"
        );
        assert_eq!(ResourceKind::LambdaFunction.canonical("notify"), "notify");
    }

    #[test]
    fn test_canonical_queue() {
        assert_eq!(
            ResourceKind::Queue.canonical("https://sqs.eu-west-1.amazonaws.com/0123456789/approvals"),
            "approvals"
        );
        assert_eq!(
            ResourceKind::Queue.canonical("arn:aws:sqs:eu-west-1:0123456789:approvals"),
            "approvals"
        );
    }

    #[test]
    fn test_canonical_image() {
        assert_eq!(
            ResourceKind::Image.canonical("python"),
            "docker.io/library/python:latest"
        );
        assert_eq!(ResourceKind::Image.canonical(""), "");
    }
}
