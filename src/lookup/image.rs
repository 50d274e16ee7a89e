//! Container image references.

use crate::core::error::ExternalLookupError;
use crate::lookup::ResourceKind;
use std::fmt;

/// Registry used when an image reference names none.
pub const DEFAULT_REGISTRY: &str = "docker.io";

/// A parsed container image URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerImage {
    /// Registry host, with port if one was given.
    pub registry: String,
    /// Repository path within the registry.
    pub repository: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
    /// AWS account owning an ECR registry.
    pub account_id: Option<String>,
    /// AWS region of an ECR registry.
    pub region: Option<String>,
}

impl ContainerImage {
    /// Parse `[registry/]repository[:tag][@digest]`.
    ///
    /// The first path segment is taken as the registry host when it contains
    /// a `.` or a `:` or is `localhost`. An image without tag or digest is
    /// tagged `latest`.
    pub fn parse(uri: &str) -> Result<Self, ExternalLookupError> {
        let malformed = |reason: &str| ExternalLookupError::MalformedIdentifier {
            kind: ResourceKind::Image,
            identifier: uri.to_string(),
            reason: reason.to_string(),
        };

        let uri = uri.trim();
        if uri.is_empty() {
            return Err(malformed("empty image reference"));
        }

        let (name, digest) = match uri.split_once('@') {
            Some((name, digest)) if !digest.is_empty() => (name, Some(digest.to_string())),
            Some(_) => return Err(malformed("empty digest")),
            None => (uri, None),
        };

        let (registry, path) = match name.split_once('/') {
            Some((first, rest))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (first.to_string(), rest)
            }
            _ => (DEFAULT_REGISTRY.to_string(), name),
        };

        let (repository, tag) = match path.rsplit_once(':') {
            Some((repository, tag)) if !tag.contains('/') => {
                if tag.is_empty() {
                    return Err(malformed("empty tag"));
                }
                (repository, Some(tag.to_string()))
            }
            _ => (path, None),
        };

        if repository.is_empty() || repository.split('/').any(str::is_empty) {
            return Err(malformed("empty repository path segment"));
        }

        let repository = if registry == DEFAULT_REGISTRY && !repository.contains('/') {
            format!("library/{}", repository)
        } else {
            repository.to_string()
        };

        let tag = match (&tag, &digest) {
            (None, None) => Some("latest".to_string()),
            _ => tag,
        };

        let (account_id, region) = parse_ecr_host(&registry);

        Ok(Self {
            registry,
            repository,
            tag,
            digest,
            account_id,
            region,
        })
    }

    /// Digest if pinned, tag otherwise.
    pub fn reference(&self) -> &str {
        self.digest
            .as_deref()
            .or(self.tag.as_deref())
            .unwrap_or("latest")
    }

    /// Whether the registry is an Amazon ECR registry.
    pub fn is_ecr(&self) -> bool {
        self.account_id.is_some()
    }

    /// Host serving the registry HTTP API.
    pub fn api_host(&self) -> &str {
        if self.registry == DEFAULT_REGISTRY {
            "registry-1.docker.io"
        } else {
            &self.registry
        }
    }

    /// Path of the manifest endpoint for this image.
    pub fn manifest_path(&self) -> String {
        format!("/v2/{}/manifests/{}", self.repository, self.reference())
    }
}

/// `<account>.dkr.ecr.<region>.amazonaws.com[.cn]`
fn parse_ecr_host(host: &str) -> (Option<String>, Option<String>) {
    let parts: Vec<&str> = host.split('.').collect();
    match parts.as_slice() {
        [account, "dkr", "ecr", region, "amazonaws", "com", ..]
            if account.chars().all(|c| c.is_ascii_digit()) =>
        {
            (Some(account.to_string()), Some(region.to_string()))
        }
        _ => (None, None),
    }
}

impl fmt::Display for ContainerImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}
