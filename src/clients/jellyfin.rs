use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{delete_outcome, expect_success, http_client, trim_base};
use crate::reconcile::DeleteOutcome;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JellyfinItem {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(rename = "Type", default)]
    pub item_type: String,

    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemsResponse {
    #[serde(default)]
    items: Vec<JellyfinItem>,
}

#[derive(Debug, Clone)]
pub struct JellyfinClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl JellyfinClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: trim_base(base_url),
            api_key: api_key.to_string(),
        })
    }

    /// All items of the given types across every library on the server.
    ///
    /// `types` is a Jellyfin item kind list such as `["Movie", "Episode"]`.
    /// The listing goes through `/Items` with the server API key rather than
    /// a user view, so library access and parental limits do not hide items.
    pub async fn list_items(&self, types: &[&str]) -> Result<Vec<JellyfinItem>> {
        let mut url = Url::parse(&format!("{}/Items", self.base_url))?;
        url.query_pairs_mut()
            .append_pair("Recursive", "true")
            .append_pair("IncludeItemTypes", &types.join(","))
            .append_pair("Fields", "Path");

        let response = self
            .client
            .get(url)
            .header("X-Emby-Token", &self.api_key)
            .send()
            .await
            .context("Failed to connect to Jellyfin")?;

        let body: ItemsResponse = expect_success(response)
            .await?
            .json()
            .await
            .context("Failed to parse Jellyfin items")?;

        debug!(count = body.items.len(), "Fetched Jellyfin items");
        Ok(body.items)
    }

    pub async fn delete_item(&self, item_id: &str) -> Result<DeleteOutcome> {
        let response = self
            .client
            .delete(format!("{}/Items/{item_id}", self.base_url))
            .header("X-Emby-Token", &self.api_key)
            .send()
            .await
            .context("Failed to connect to Jellyfin")?;

        delete_outcome(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_items_response() {
        let body: ItemsResponse = serde_json::from_str(
            r#"{
                "Items": [
                    {"Id": "f00d", "Name": "Alien", "Type": "Movie", "Path": "/media/movies/Alien.mkv"},
                    {"Id": "beef", "Name": "Collections", "Type": "BoxSet"}
                ],
                "TotalRecordCount": 2
            }"#,
        )
        .unwrap();

        assert_eq!(body.items.len(), 2);
        assert_eq!(body.items[0].item_type, "Movie");
        assert_eq!(body.items[0].path.as_deref(), Some("/media/movies/Alien.mkv"));
        assert!(body.items[1].path.is_none());
    }
}
