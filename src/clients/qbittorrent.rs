use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{expect_success, session_client, trim_base};
use crate::reconcile::DeleteOutcome;

#[derive(Debug, Clone, Default)]
pub struct QBitConfig {
    pub base_url: String,

    /// Empty when the WebUI whitelists this host.
    pub username: String,

    pub password: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TorrentState {
    Error,
    MissingFiles,
    Uploading,
    #[serde(rename = "pausedUP")]
    PausedUP,
    #[serde(rename = "queuedUP")]
    QueuedUP,
    #[serde(rename = "stalledUP")]
    StalledUP,
    #[serde(rename = "checkingUP")]
    CheckingUP,
    #[serde(rename = "forcedUP")]
    ForcedUP,
    #[serde(rename = "stoppedUP")]
    StoppedUP,
    Moving,
    #[serde(other)]
    Unknown,
}

impl TorrentState {
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error | Self::MissingFiles)
    }
}

impl fmt::Display for TorrentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Error => "Error",
            Self::MissingFiles => "Missing Files",
            Self::Uploading => "Seeding",
            Self::PausedUP => "Paused (Seeding)",
            Self::QueuedUP => "Queued (Seeding)",
            Self::StalledUP => "Stalled (Seeding)",
            Self::CheckingUP => "Checking",
            Self::ForcedUP => "Forced Seeding",
            Self::StoppedUP => "Seeding Complete",
            Self::Moving => "Moving",
            Self::Unknown => "Unknown",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TorrentInfo {
    pub hash: String,

    pub name: String,

    pub state: TorrentState,

    #[serde(default)]
    pub content_path: String,
}

#[derive(Debug, Clone)]
pub struct QBitClient {
    client: Client,
    config: QBitConfig,
}

impl QBitClient {
    pub fn new(mut config: QBitConfig, timeout: Duration) -> Result<Self> {
        config.base_url = trim_base(&config.base_url);
        Ok(Self {
            client: session_client(timeout)?,
            config,
        })
    }

    pub async fn login(&self) -> Result<()> {
        let url = format!("{}/api/v2/auth/login", self.config.base_url);

        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .header("Referer", &self.config.base_url)
            .form(&params)
            .send()
            .await
            .context("Failed to connect to qBittorrent")?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::OK && body.contains("Ok") {
            debug!("Successfully authenticated with qBittorrent");
            Ok(())
        } else if body.contains("Fails") {
            bail!("qBittorrent authentication failed: invalid credentials")
        } else {
            bail!("qBittorrent authentication failed: status={status}, body={body}")
        }
    }

    async fn ensure_auth(&self) -> Result<()> {
        if self.config.username.is_empty() {
            return Ok(());
        }

        let url = format!("{}/api/v2/app/version", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .header("Referer", &self.config.base_url)
            .send()
            .await
            .context("Failed to connect to qBittorrent")?;

        if response.status() == StatusCode::FORBIDDEN {
            debug!(reason = "session_expired", "Logging in...");
            self.login().await?;
        }

        Ok(())
    }

    /// Lists torrents, optionally narrowed by a qBittorrent state filter such
    /// as `completed`.
    pub async fn get_torrents(&self, filter: Option<&str>) -> Result<Vec<TorrentInfo>> {
        self.ensure_auth().await?;

        let mut url = Url::parse(&format!("{}/api/v2/torrents/info", self.config.base_url))?;
        if let Some(f) = filter {
            url.query_pairs_mut().append_pair("filter", f);
        }

        let response = self
            .client
            .get(url)
            .header("Referer", &self.config.base_url)
            .send()
            .await
            .context("Failed to connect to qBittorrent")?;

        let text = expect_success(response).await?.text().await?;

        let torrents: Vec<TorrentInfo> = match serde_json::from_str(&text) {
            Ok(t) => t,
            Err(e) => {
                let truncated = super::truncate(&text, 1000);
                debug!(error = %e, response = %truncated, "Failed to parse qBittorrent response");
                bail!("Failed to parse qBittorrent response: {e}");
            }
        };
        Ok(torrents)
    }

    /// qBittorrent answers 200 even for unknown hashes, so a missing torrent
    /// is indistinguishable from a removed one.
    pub async fn delete_torrent(&self, hash: &str, delete_files: bool) -> Result<DeleteOutcome> {
        self.ensure_auth().await?;

        let url = format!("{}/api/v2/torrents/delete", self.config.base_url);
        let params = [
            ("hashes", hash),
            ("deleteFiles", if delete_files { "true" } else { "false" }),
        ];

        let response = self
            .client
            .post(&url)
            .header("Referer", &self.config.base_url)
            .form(&params)
            .send()
            .await
            .context("Failed to connect to qBittorrent")?;

        expect_success(response).await?;
        Ok(DeleteOutcome::Deleted)
    }
}
