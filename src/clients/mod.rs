pub mod arr;
pub mod jellyfin;
pub mod jellyseerr;
pub mod qbittorrent;
pub mod registry;

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};

use crate::reconcile::{DeleteOutcome, ProviderError};

pub const USER_AGENT: &str = concat!("Reconcilarr/", env!("CARGO_PKG_VERSION"));

/// Builds a client whose every request is bounded by `timeout`.
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Like [`http_client`] but keeps cookies between requests.
pub fn session_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .cookie_store(true)
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

pub(crate) fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Passes a successful response through, turning anything else into a
/// [`ProviderError::Status`] carrying the (truncated) body.
pub(crate) async fn expect_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::status(status, truncate(&body, 500)).into())
}

/// Maps the status of a DELETE call. 404 means the record is already gone.
pub(crate) async fn delete_outcome(response: Response) -> Result<DeleteOutcome> {
    match response.status() {
        StatusCode::OK | StatusCode::ACCEPTED | StatusCode::NO_CONTENT => {
            Ok(DeleteOutcome::Deleted)
        }
        StatusCode::NOT_FOUND => Ok(DeleteOutcome::AlreadyAbsent),
        _ => expect_success(response).await.map(|_| DeleteOutcome::Deleted),
    }
}

pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("ééé", 3), "é...");
    }

    #[test]
    fn trim_base_drops_trailing_slash() {
        assert_eq!(trim_base("http://radarr:7878/"), "http://radarr:7878");
        assert_eq!(trim_base("http://radarr:7878"), "http://radarr:7878");
    }
}
