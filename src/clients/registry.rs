//! Tag listing for the container registries the compose stack pulls from.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{expect_success, http_client, trim_base};
use crate::reconcile::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registry {
    DockerHub,
    Ghcr,
    Lscr,
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DockerHub => "Docker Hub",
            Self::Ghcr => "GHCR",
            Self::Lscr => "LSCR",
        };
        write!(f, "{s}")
    }
}

/// Repository coordinates of a compose image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub registry: Registry,
    pub namespace: String,
    pub name: String,
}

impl ImageRef {
    /// Resolves an image name (without tag) to its registry.
    ///
    /// Only two-segment repositories are understood on GHCR, LSCR and Docker
    /// Hub. A single segment is a Docker Hub official image. Other registry
    /// hosts are not supported.
    #[must_use]
    pub fn resolve(image: &str) -> Option<Self> {
        let (registry, rest) = if let Some(rest) = image.strip_prefix("ghcr.io/") {
            (Registry::Ghcr, rest)
        } else if let Some(rest) = image.strip_prefix("lscr.io/") {
            (Registry::Lscr, rest)
        } else {
            (Registry::DockerHub, image)
        };

        let parts: Vec<&str> = rest.split('/').collect();
        match (registry, parts.as_slice()) {
            (Registry::DockerHub, [host, _]) if host.contains('.') => None,
            (_, [namespace, name]) if !namespace.is_empty() && !name.is_empty() => Some(Self {
                registry,
                namespace: (*namespace).to_string(),
                name: (*name).to_string(),
            }),
            (Registry::DockerHub, [name]) if !name.is_empty() && !name.contains('.') => {
                Some(Self {
                    registry,
                    namespace: "library".to_string(),
                    name: (*name).to_string(),
                })
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn repository(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// Base URLs; overridable so tests can point at a local server.
#[derive(Debug, Clone)]
pub struct RegistryEndpoints {
    pub docker_hub: String,
    pub docker_auth: String,
    pub ghcr: String,
    pub lscr: String,
}

impl Default for RegistryEndpoints {
    fn default() -> Self {
        Self {
            docker_hub: "https://registry.hub.docker.com".to_string(),
            docker_auth: "https://auth.docker.io".to_string(),
            ghcr: "https://ghcr.io".to_string(),
            lscr: "https://lscr.io".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagList {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    endpoints: RegistryEndpoints,
}

impl RegistryClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_endpoints(RegistryEndpoints::default(), timeout)
    }

    pub fn with_endpoints(endpoints: RegistryEndpoints, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoints: RegistryEndpoints {
                docker_hub: trim_base(&endpoints.docker_hub),
                docker_auth: trim_base(&endpoints.docker_auth),
                ghcr: trim_base(&endpoints.ghcr),
                lscr: trim_base(&endpoints.lscr),
            },
        })
    }

    async fn docker_hub_token(&self, image: &ImageRef) -> Result<String> {
        let mut url = Url::parse(&format!("{}/token", self.endpoints.docker_auth))?;
        url.query_pairs_mut()
            .append_pair("service", "registry.docker.io")
            .append_pair("scope", &format!("repository:{}:pull", image.repository()));

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to reach Docker Hub auth")?;

        let body: TokenResponse = expect_success(response).await?.json().await?;
        body.token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Docker Hub returned no token"))
    }

    /// All tags published for `image`.
    ///
    /// A GHCR package that needs credentials fails with a 401
    /// [`ProviderError::Status`].
    pub async fn list_tags(&self, image: &ImageRef) -> Result<Vec<String>> {
        let base = match image.registry {
            Registry::DockerHub => &self.endpoints.docker_hub,
            Registry::Ghcr => &self.endpoints.ghcr,
            Registry::Lscr => &self.endpoints.lscr,
        };
        let url = format!("{base}/v2/{}/tags/list", image.repository());

        let mut request = self.client.get(&url);
        if image.registry == Registry::DockerHub {
            let token = self.docker_hub_token(image).await?;
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", image.registry))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!(image = %image.repository(), registry = %image.registry, "Authentication required");
            return Err(
                ProviderError::status(StatusCode::UNAUTHORIZED, "authentication required").into(),
            );
        }

        let body: TagList = expect_success(response)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse tag list for {}", image.repository()))?;

        Ok(body.tags.unwrap_or_default())
    }
}
