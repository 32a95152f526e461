use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{delete_outcome, expect_success, http_client, trim_base};
use crate::reconcile::DeleteOutcome;

const PAGE_SIZE: usize = 100;

/// Media availability as reported by Jellyseerr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaStatus {
    Unknown,
    Pending,
    Processing,
    PartiallyAvailable,
    Available,
}

impl MediaStatus {
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            2 => Self::Pending,
            3 => Self::Processing,
            4 => Self::PartiallyAvailable,
            5 => Self::Available,
            _ => Self::Unknown,
        }
    }

    /// Whether Jellyseerr believes the media is in the Jellyfin library.
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::PartiallyAvailable | Self::Available)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JellyseerrMedia {
    pub id: i64,

    #[serde(default)]
    pub media_type: String,

    #[serde(default)]
    pub tmdb_id: Option<i64>,

    #[serde(default)]
    pub tvdb_id: Option<i64>,

    #[serde(default)]
    pub status: i64,

    #[serde(default)]
    pub jellyfin_media_id: Option<String>,

    #[serde(default)]
    pub title: Option<String>,
}

impl JellyseerrMedia {
    #[must_use]
    pub const fn status(&self) -> MediaStatus {
        MediaStatus::from_code(self.status)
    }

    #[must_use]
    pub fn is_movie(&self) -> bool {
        self.media_type == "movie"
    }

    #[must_use]
    pub fn is_tv(&self) -> bool {
        self.media_type == "tv"
    }

    /// Jellyseerr's media list carries no title, so fall back to the ids.
    #[must_use]
    pub fn label(&self) -> String {
        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            return title.to_string();
        }
        match (self.tmdb_id, self.tvdb_id) {
            (Some(tmdb), _) => format!("{} tmdb:{tmdb}", self.media_type),
            (None, Some(tvdb)) => format!("{} tvdb:{tvdb}", self.media_type),
            _ => format!("{} media #{}", self.media_type, self.id),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MediaPage {
    #[serde(default)]
    results: Vec<JellyseerrMedia>,
}

#[derive(Debug, Clone)]
pub struct JellyseerrClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl JellyseerrClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: trim_base(base_url),
            api_key: api_key.to_string(),
        })
    }

    async fn fetch_page(&self, skip: usize) -> Result<Vec<JellyseerrMedia>> {
        let mut url = Url::parse(&format!("{}/api/v1/media", self.base_url))?;
        url.query_pairs_mut()
            .append_pair("take", &PAGE_SIZE.to_string())
            .append_pair("skip", &skip.to_string());

        let mut request = self.client.get(url);
        if !self.api_key.is_empty() {
            request = request.header("X-Api-Key", &self.api_key);
        }

        let response = request
            .send()
            .await
            .context("Failed to connect to Jellyseerr")?;

        let page: MediaPage = expect_success(response)
            .await?
            .json()
            .await
            .context("Failed to parse Jellyseerr media page")?;
        Ok(page.results)
    }

    /// Every media entry, following pagination until a short page.
    ///
    /// A failing page fails the whole listing rather than returning a
    /// truncated one.
    pub async fn list_media(&self) -> Result<Vec<JellyseerrMedia>> {
        let mut all = Vec::new();
        let mut skip = 0;

        loop {
            let page = self.fetch_page(skip).await?;
            let len = page.len();
            all.extend(page);

            if len < PAGE_SIZE {
                break;
            }
            skip += PAGE_SIZE;
        }

        debug!(count = all.len(), "Fetched Jellyseerr media");
        Ok(all)
    }

    /// Deletes a media entry together with its requests, so it can be
    /// requested again.
    pub async fn delete_media(&self, media_id: i64) -> Result<DeleteOutcome> {
        let url = format!("{}/api/v1/media/{media_id}", self.base_url);

        let response = self
            .client
            .delete(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .context("Failed to connect to Jellyseerr")?;

        delete_outcome(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert!(MediaStatus::from_code(5).is_available());
        assert!(MediaStatus::from_code(4).is_available());
        assert!(!MediaStatus::from_code(3).is_available());
        assert_eq!(MediaStatus::from_code(42), MediaStatus::Unknown);
    }

    #[test]
    fn parses_media_entry() {
        let media: JellyseerrMedia = serde_json::from_str(
            r#"{
                "id": 12,
                "mediaType": "tv",
                "tmdbId": 1399,
                "tvdbId": 121361,
                "status": 5,
                "jellyfinMediaId": "abc123"
            }"#,
        )
        .unwrap();

        assert!(media.is_tv());
        assert_eq!(media.status(), MediaStatus::Available);
        assert_eq!(media.jellyfin_media_id.as_deref(), Some("abc123"));
        assert_eq!(media.label(), "tv tmdb:1399");
    }

    #[test]
    fn tolerates_null_ids() {
        let media: JellyseerrMedia =
            serde_json::from_str(r#"{"id": 3, "mediaType": "movie", "tmdbId": null}"#).unwrap();
        assert!(media.is_movie());
        assert_eq!(media.tmdb_id, None);
        assert_eq!(media.label(), "movie media #3");
    }
}
