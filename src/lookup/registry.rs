//! Container registry lookups over the OCI distribution API.
//!
//! A manifest `HEAD` is sent with the configured credentials. A `401` carrying
//! a `Bearer` challenge is answered once: a token is fetched from the
//! challenge realm and the request is repeated with it.

use crate::core::error::ExternalLookupError;
use crate::lookup::image::ContainerImage;
use crate::lookup::inventory::Inventory;
use crate::lookup::{ResourceCatalog, ResourceKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MANIFEST_MEDIA_TYPES: &str = "application/vnd.oci.image.index.v1+json, \
     application/vnd.oci.image.manifest.v1+json, \
     application/vnd.docker.distribution.manifest.list.v2+json, \
     application/vnd.docker.distribution.manifest.v2+json";

/// How stored credentials are presented to a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
    /// `Authorization: Bearer <token>`
    Bearer,
    /// `Authorization: Basic <token>`, where the token is already base64
    /// encoded (ECR authorization tokens are).
    Basic,
}

impl AuthScheme {
    fn header(self, token: &str) -> String {
        match self {
            AuthScheme::Bearer => format!("Bearer {}", token),
            AuthScheme::Basic => format!("Basic {}", token),
        }
    }
}

/// Settings read from the `[registry]` configuration table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Environment variable holding the registry credentials.
    pub token_env: Option<String>,
    /// Scheme for those credentials; ECR registries default to `basic`,
    /// others to `bearer`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_scheme: Option<AuthScheme>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Registry hosts reached over plain HTTP.
    pub insecure_registries: Vec<String>,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            token_env: None,
            auth_scheme: None,
            timeout_secs: 10,
            insecure_registries: Vec::new(),
        }
    }
}

/// Parameters of a `WWW-Authenticate: Bearer ...` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BearerChallenge {
    realm: String,
    service: Option<String>,
    scope: Option<String>,
}

impl BearerChallenge {
    fn parse(header: &str) -> Option<Self> {
        let (scheme, params) = header.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }

        let mut realm = None;
        let mut service = None;
        let mut scope = None;
        for (key, value) in challenge_params(params) {
            match key.to_ascii_lowercase().as_str() {
                "realm" => realm = Some(value),
                "service" => service = Some(value),
                "scope" => scope = Some(value),
                _ => {}
            }
        }

        Some(Self {
            realm: realm?,
            service,
            scope,
        })
    }
}

/// Split `key="value",key=value` pairs; quoted values may hold commas.
fn challenge_params(params: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut rest = params.trim();

    while let Some((key, after)) = rest.split_once('=') {
        let after = after.trim_start();
        let (value, remainder) = match after.strip_prefix('"') {
            Some(quoted) => match quoted.find('"') {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                None => (quoted, ""),
            },
            None => match after.find(',') {
                Some(end) => (&after[..end], &after[end..]),
                None => (after, ""),
            },
        };
        pairs.push((key.trim().to_string(), value.to_string()));
        rest = remainder.trim_start().trim_start_matches(',').trim_start();
    }

    pairs
}

#[derive(Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

/// Looks images up in their registry; other kinds go to a fallback inventory.
pub struct RegistryCatalog {
    agent: ureq::Agent,
    credentials: Option<String>,
    auth_scheme: Option<AuthScheme>,
    insecure_registries: Vec<String>,
    fallback: Inventory,
}

impl RegistryCatalog {
    /// Create a catalog from settings.
    pub fn new(settings: &RegistrySettings, fallback: Inventory) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("steplint/", env!("CARGO_PKG_VERSION")))
            .build();

        let credentials = settings.token_env.as_deref().and_then(|var| match std::env::var(var) {
            Ok(token) if !token.is_empty() => Some(token),
            _ => {
                log::warn!("Registry token variable {} is not set; using anonymous access", var);
                None
            }
        });

        Self {
            agent,
            credentials,
            auth_scheme: settings.auth_scheme,
            insecure_registries: settings.insecure_registries.clone(),
            fallback,
        }
    }

    fn manifest_url(&self, image: &ContainerImage) -> String {
        let scheme = if self.insecure_registries.iter().any(|r| r == &image.registry) {
            "http"
        } else {
            "https"
        };
        format!("{}://{}{}", scheme, image.api_host(), image.manifest_path())
    }

    fn scheme_for(&self, image: &ContainerImage) -> AuthScheme {
        self.auth_scheme.unwrap_or(if image.is_ecr() {
            AuthScheme::Basic
        } else {
            AuthScheme::Bearer
        })
    }

    fn head(&self, url: &str, authorization: Option<&str>) -> Result<ureq::Response, ureq::Error> {
        let mut request = self.agent.head(url).set("Accept", MANIFEST_MEDIA_TYPES);
        if let Some(value) = authorization {
            request = request.set("Authorization", value);
        }
        request.call()
    }

    /// Exchange a challenge for a token, sending Basic credentials if any.
    fn fetch_token(
        &self,
        challenge: &BearerChallenge,
        scheme: AuthScheme,
        identifier: &str,
    ) -> Result<String, ExternalLookupError> {
        log::debug!("Fetching registry token from {}", challenge.realm);

        let mut request = self.agent.get(&challenge.realm);
        if let Some(service) = &challenge.service {
            request = request.query("service", service);
        }
        if let Some(scope) = &challenge.scope {
            request = request.query("scope", scope);
        }
        if let (AuthScheme::Basic, Some(credentials)) = (scheme, &self.credentials) {
            request = request.set("Authorization", &scheme.header(credentials));
        }

        let response = request.call().map_err(|e| lookup_error(e, identifier))?;
        let body: TokenResponse = response.into_json().map_err(|e| ExternalLookupError::Transport {
            kind: ResourceKind::Image,
            identifier: identifier.to_string(),
            message: format!("unreadable token response: {}", e),
        })?;

        body.token
            .or(body.access_token)
            .ok_or_else(|| ExternalLookupError::Transport {
                kind: ResourceKind::Image,
                identifier: identifier.to_string(),
                message: "token response has no token".to_string(),
            })
    }

    fn image_exists(&self, identifier: &str) -> Result<bool, ExternalLookupError> {
        let image = ContainerImage::parse(identifier)?;
        let url = self.manifest_url(&image);
        let scheme = self.scheme_for(&image);
        log::debug!("HEAD {}", url);

        let authorization = self.credentials.as_deref().map(|token| scheme.header(token));
        let mut outcome = self.head(&url, authorization.as_deref());

        let challenge = match &outcome {
            Err(ureq::Error::Status(401, response)) => response
                .header("WWW-Authenticate")
                .and_then(BearerChallenge::parse),
            _ => None,
        };
        if let Some(challenge) = challenge {
            let token = self.fetch_token(&challenge, scheme, identifier)?;
            outcome = self.head(&url, Some(&AuthScheme::Bearer.header(&token)));
        }

        match outcome {
            Ok(_) => Ok(true),
            Err(ureq::Error::Status(404, _)) => Ok(false),
            Err(error) => Err(lookup_error(error, identifier)),
        }
    }
}

fn lookup_error(error: ureq::Error, identifier: &str) -> ExternalLookupError {
    match error {
        ureq::Error::Status(status @ (401 | 403), _) => ExternalLookupError::PermissionDenied {
            kind: ResourceKind::Image,
            identifier: identifier.to_string(),
            status,
        },
        ureq::Error::Status(status, _) => ExternalLookupError::UnexpectedStatus {
            kind: ResourceKind::Image,
            identifier: identifier.to_string(),
            status,
        },
        ureq::Error::Transport(transport) => ExternalLookupError::Transport {
            kind: ResourceKind::Image,
            identifier: identifier.to_string(),
            message: transport.to_string(),
        },
    }
}

impl ResourceCatalog for RegistryCatalog {
    fn name(&self) -> &str {
        "registry"
    }

    fn exists(&self, kind: ResourceKind, identifier: &str) -> Result<bool, ExternalLookupError> {
        match kind {
            ResourceKind::Image => self.image_exists(identifier),
            _ if self.fallback.entries(kind).is_empty() => Err(ExternalLookupError::Unsupported {
                catalog: self.name().to_string(),
                kind,
            }),
            _ => self.fallback.exists(kind, identifier),
        }
    }
}
