//! Radarr and Sonarr share the same v3 API shape; one client serves both.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{delete_outcome, expect_success, http_client, trim_base};
use crate::reconcile::DeleteOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrKind {
    Radarr,
    Sonarr,
}

impl ArrKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Radarr => "radarr",
            Self::Sonarr => "sonarr",
        }
    }

    const fn resource(self) -> &'static str {
        match self {
            Self::Radarr => "movie",
            Self::Sonarr => "series",
        }
    }

    /// The two services spell the "add exclusion" flag differently.
    const fn exclusion_param(self) -> &'static str {
        match self {
            Self::Radarr => "addImportExclusion",
            Self::Sonarr => "addImportListExclusion",
        }
    }
}

/// A movie (Radarr) or series (Sonarr) record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrMedia {
    pub id: i64,

    pub title: String,

    #[serde(default)]
    pub tmdb_id: Option<i64>,

    #[serde(default)]
    pub tvdb_id: Option<i64>,

    #[serde(default)]
    pub year: Option<i32>,
}

impl ArrMedia {
    /// External id used to match against Jellyseerr, zero treated as unset.
    #[must_use]
    pub fn external_id(&self, kind: ArrKind) -> Option<i64> {
        let id = match kind {
            ArrKind::Radarr => self.tmdb_id,
            ArrKind::Sonarr => self.tvdb_id,
        };
        id.filter(|id| *id > 0)
    }

    #[must_use]
    pub fn display_title(&self) -> String {
        match self.year {
            Some(year) if year > 0 => format!("{} ({year})", self.title),
            _ => self.title.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArrClient {
    client: Client,
    kind: ArrKind,
    base_url: String,
    api_key: String,
}

impl ArrClient {
    pub fn new(kind: ArrKind, base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            kind,
            base_url: trim_base(base_url),
            api_key: api_key.to_string(),
        })
    }

    #[must_use]
    pub const fn kind(&self) -> ArrKind {
        self.kind
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v3/{path}", self.base_url)
    }

    pub async fn list_media(&self) -> Result<Vec<ArrMedia>> {
        let url = self.endpoint(self.kind.resource());

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", self.kind.name()))?;

        let media: Vec<ArrMedia> = expect_success(response)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse {} library", self.kind.name()))?;

        debug!(service = self.kind.name(), count = media.len(), "Fetched library");
        Ok(media)
    }

    /// Deletes a movie/series by its service id.
    pub async fn delete_media(&self, id: i64, delete_files: bool) -> Result<DeleteOutcome> {
        let mut url = Url::parse(&self.endpoint(&format!("{}/{id}", self.kind.resource())))?;
        url.query_pairs_mut()
            .append_pair("deleteFiles", if delete_files { "true" } else { "false" })
            .append_pair(self.kind.exclusion_param(), "false");

        let response = self
            .client
            .delete(url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", self.kind.name()))?;

        delete_outcome(response).await
    }

    /// Custom formats as raw JSON so unknown fields survive a copy.
    pub async fn list_custom_formats(&self) -> Result<Vec<serde_json::Value>> {
        let response = self
            .client
            .get(self.endpoint("customformat"))
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", self.kind.name()))?;

        let formats = expect_success(response).await?.json().await?;
        Ok(formats)
    }

    pub async fn create_custom_format(&self, format: &serde_json::Value) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint("customformat"))
            .header("X-Api-Key", &self.api_key)
            .json(format)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", self.kind.name()))?;

        expect_success(response).await?;
        Ok(())
    }
}
