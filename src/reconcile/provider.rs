//! Capabilities the reconciler needs from the systems it compares.

use std::collections::HashSet;

use thiserror::Error;

use crate::domain::{Item, ItemId};

/// Failure talking to a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never produced a usable response.
    #[error("request failed: {0}")]
    Http(String),

    /// The response arrived but its body could not be read.
    #[error("invalid response: {0}")]
    Decode(String),

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    pub fn status(status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        Self::Status {
            status: status.as_u16(),
            body: body.into(),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

impl From<anyhow::Error> for ProviderError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<Self>() {
            Ok(provider) => return provider,
            Err(other) => other,
        };

        // Keep the context chain in the message, classify by the reqwest cause
        let message = format!("{err:#}");
        match err.chain().find_map(|e| e.downcast_ref::<reqwest::Error>()) {
            Some(http) if http.is_decode() => Self::Decode(message),
            Some(_) => Self::Http(message),
            None => Self::Other(message),
        }
    }
}

/// How a delete call ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The target was already gone. The desired end state holds.
    AlreadyAbsent,
}

/// A record whose existence could not be established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unverified {
    pub item: Item,
    pub reason: String,
}

/// Listing returned by a dependent provider.
///
/// `items` are orphan candidates. `unverified` entries are reported but never
/// compared against the desired set.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub items: Vec<Item>,
    pub unverified: Vec<Unverified>,
}

impl Inventory {
    #[must_use]
    pub const fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            unverified: Vec::new(),
        }
    }

    pub fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn push_unverified(&mut self, item: Item, reason: impl Into<String>) {
        self.unverified.push(Unverified {
            item,
            reason: reason.into(),
        });
    }
}

/// The system whose membership defines what should exist elsewhere.
///
/// Implementations must return `Err` when the service cannot be reached and
/// `Ok` with an empty set only when it really reports zero items.
#[async_trait::async_trait]
pub trait SourceOfTruth: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_desired_ids(&self) -> Result<HashSet<ItemId>, ProviderError>;
}

/// A system whose records should mirror the source of truth.
#[async_trait::async_trait]
pub trait DependentProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Full listing in the provider's natural order.
    async fn fetch_actual_items(&self) -> Result<Inventory, ProviderError>;

    /// Removes one record. Deleting a record that no longer exists must
    /// return [`DeleteOutcome::AlreadyAbsent`], not an error.
    async fn delete(&self, item: &Item, cascade_files: bool)
    -> Result<DeleteOutcome, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_display() {
        let err = ProviderError::status(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.to_string(), "unexpected status 502: upstream down");
    }

    #[test]
    fn typed_status_survives_anyhow() {
        let err = anyhow::Error::new(ProviderError::status(
            reqwest::StatusCode::NOT_FOUND,
            "missing",
        ));
        let provider: ProviderError = err.into();
        assert!(matches!(provider, ProviderError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn transport_failure_is_http() {
        // Nothing listens on port 9 on a test host
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:9/")
            .send()
            .await
            .unwrap_err();
        let provider: ProviderError = anyhow::Error::new(err)
            .context("Failed to connect to Radarr")
            .into();

        assert!(matches!(provider, ProviderError::Http(_)));
        assert!(provider.to_string().starts_with("request failed: Failed to connect to Radarr"));
    }

    #[test]
    fn anyhow_context_is_flattened() {
        let err = anyhow::anyhow!("connection refused").context("Failed to reach Radarr");
        let provider: ProviderError = err.into();
        assert_eq!(
            provider.to_string(),
            "Failed to reach Radarr: connection refused"
        );
    }
}
