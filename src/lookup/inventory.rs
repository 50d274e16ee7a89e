//! Static resource inventory.

use crate::core::error::ExternalLookupError;
use crate::lookup::{ResourceCatalog, ResourceKind};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// A fixed list of known resources per kind.
///
/// Deserialized from the `[inventory]` table of a configuration file:
///
/// ```toml
/// [inventory]
/// images = ["123456789012.dkr.ecr.us-east-1.amazonaws.com/prep:1.0"]
/// roles = ["roleA"]
/// lambda_functions = ["notify"]
/// queues = ["approvals"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Inventory {
    pub images: IndexSet<String>,
    pub roles: IndexSet<String>,
    pub lambda_functions: IndexSet<String>,
    pub queues: IndexSet<String>,
}

impl Inventory {
    /// Create an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource.
    pub fn with(mut self, kind: ResourceKind, identifier: impl Into<String>) -> Self {
        self.entries_mut(kind).insert(identifier.into());
        self
    }

    pub fn entries(&self, kind: ResourceKind) -> &IndexSet<String> {
        match kind {
            ResourceKind::Image => &self.images,
            ResourceKind::Role => &self.roles,
            ResourceKind::LambdaFunction => &self.lambda_functions,
            ResourceKind::Queue => &self.queues,
        }
    }

    fn entries_mut(&mut self, kind: ResourceKind) -> &mut IndexSet<String> {
        match kind {
            ResourceKind::Image => &mut self.images,
            ResourceKind::Role => &mut self.roles,
            ResourceKind::LambdaFunction => &mut self.lambda_functions,
            ResourceKind::Queue => &mut self.queues,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
            && self.roles.is_empty()
            && self.lambda_functions.is_empty()
            && self.queues.is_empty()
    }
}

impl ResourceCatalog for Inventory {
    fn name(&self) -> &str {
        "inventory"
    }

    fn exists(&self, kind: ResourceKind, identifier: &str) -> Result<bool, ExternalLookupError> {
        let wanted = kind.canonical(identifier);
        Ok(self
            .entries(kind)
            .iter()
            .any(|entry| kind.canonical(entry) == wanted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exists_by_canonical_name() {
        let inventory = Inventory::new()
            .with(ResourceKind::Role, "roleA")
            .with(ResourceKind::Queue, "https://sqs.us-east-1.amazonaws.com/1/approvals")
            .with(ResourceKind::Image, "python:3.11");

        assert!(inventory
            .exists(ResourceKind::Role, "arn:aws:iam::1:role/roleA")
            .unwrap());
        assert!(!inventory.exists(ResourceKind::Role, "roleB").unwrap());
        assert!(inventory
            .exists(ResourceKind::Queue, "arn:aws:sqs:us-east-1:1:approvals")
            .unwrap());
        assert!(inventory
            .exists(ResourceKind::Image, "docker.io/library/python:3.11")
            .unwrap());
        assert!(!inventory.exists(ResourceKind::Image, "python:3.12").unwrap());
    }

    #[test]
    fn test_kinds_are_separate() {
        let inventory = Inventory::new().with(ResourceKind::Role, "shared");
        assert!(!inventory
            .exists(ResourceKind::LambdaFunction, "shared")
            .unwrap());
    }

    #[test]
    fn test_deserialize_partial() {
        let inventory: Inventory = toml::from_str(r#"roles = ["roleA"]"#).unwrap();
        assert_eq!(inventory.roles.len(), 1);
        assert!(inventory.images.is_empty());
        assert!(!inventory.is_empty());
    }
}
