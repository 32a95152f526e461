use std::collections::HashSet;

use tracing::debug;

use crate::clients::jellyseerr::JellyseerrClient;
use crate::domain::{Item, ItemId};
use crate::reconcile::{
    DeleteOutcome, DependentProvider, Inventory, ProviderError, SourceOfTruth,
};

/// Jellyseerr as the record of what users asked for.
///
/// Movies are keyed by TMDB id and series by TVDB id, matching how Radarr and
/// Sonarr identify them.
pub struct JellyseerrCatalog {
    client: JellyseerrClient,
}

impl JellyseerrCatalog {
    #[must_use]
    pub const fn new(client: JellyseerrClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl SourceOfTruth for JellyseerrCatalog {
    fn name(&self) -> &str {
        "jellyseerr"
    }

    async fn fetch_desired_ids(&self) -> Result<HashSet<ItemId>, ProviderError> {
        let media = self.client.list_media().await?;

        let mut ids = HashSet::new();
        let (mut movies, mut shows) = (0usize, 0usize);
        for entry in &media {
            if entry.is_movie()
                && let Some(tmdb) = entry.tmdb_id
            {
                ids.insert(ItemId::Tmdb(tmdb));
                movies += 1;
            } else if entry.is_tv()
                && let Some(tvdb) = entry.tvdb_id
            {
                ids.insert(ItemId::Tvdb(tvdb));
                shows += 1;
            }
        }

        debug!(movies, shows, "Jellyseerr tracking");
        Ok(ids)
    }
}

/// Jellyseerr media entries marked as available in Jellyfin.
///
/// Deleting one also drops its requests, so users can request it again.
pub struct JellyseerrRequests {
    client: JellyseerrClient,
}

impl JellyseerrRequests {
    #[must_use]
    pub const fn new(client: JellyseerrClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl DependentProvider for JellyseerrRequests {
    fn name(&self) -> &str {
        "jellyseerr"
    }

    async fn fetch_actual_items(&self) -> Result<Inventory, ProviderError> {
        let media = self.client.list_media().await?;

        let mut inventory = Inventory::default();
        for entry in media {
            if !entry.status().is_available() {
                continue;
            }
            let Some(jellyfin_id) = entry.jellyfin_media_id.as_deref().filter(|id| !id.is_empty())
            else {
                continue;
            };

            inventory.push(Item::new(
                ItemId::jellyfin(jellyfin_id),
                entry.label(),
                entry.id.to_string(),
            ));
        }

        Ok(inventory)
    }

    async fn delete(
        &self,
        item: &Item,
        _cascade_files: bool,
    ) -> Result<DeleteOutcome, ProviderError> {
        let media_id: i64 = item.native_id.parse().map_err(|_| {
            ProviderError::Other(format!("invalid Jellyseerr media id '{}'", item.native_id))
        })?;
        Ok(self.client.delete_media(media_id).await?)
    }
}
