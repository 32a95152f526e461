use crate::clients::arr::{ArrClient, ArrKind};
use crate::domain::{Item, ItemId};
use crate::reconcile::{DeleteOutcome, DependentProvider, Inventory, ProviderError};

/// Radarr movies or Sonarr series, keyed by their TMDB/TVDB id.
pub struct ArrLibrary {
    client: ArrClient,
}

impl ArrLibrary {
    #[must_use]
    pub const fn new(client: ArrClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl DependentProvider for ArrLibrary {
    fn name(&self) -> &str {
        self.client.kind().name()
    }

    async fn fetch_actual_items(&self) -> Result<Inventory, ProviderError> {
        let kind = self.client.kind();
        let media = self.client.list_media().await?;

        let mut inventory = Inventory::default();
        for entry in media {
            let title = entry.display_title();
            let native_id = entry.id.to_string();
            match (kind, entry.external_id(kind)) {
                (ArrKind::Radarr, Some(tmdb)) => {
                    inventory.push(Item::new(ItemId::Tmdb(tmdb), title, native_id));
                }
                (ArrKind::Sonarr, Some(tvdb)) => {
                    inventory.push(Item::new(ItemId::Tvdb(tvdb), title, native_id));
                }
                // Unset ids are reported as zero so the record still shows up
                (ArrKind::Radarr, None) => inventory.push_unverified(
                    Item::new(ItemId::Tmdb(0), title, native_id),
                    "movie has no TMDB id",
                ),
                (ArrKind::Sonarr, None) => inventory.push_unverified(
                    Item::new(ItemId::Tvdb(0), title, native_id),
                    "series has no TVDB id",
                ),
            }
        }

        Ok(inventory)
    }

    async fn delete(&self, item: &Item, cascade_files: bool) -> Result<DeleteOutcome, ProviderError> {
        let id: i64 = item.native_id.parse().map_err(|_| {
            ProviderError::Other(format!(
                "invalid {} id '{}'",
                self.client.kind().name(),
                item.native_id
            ))
        })?;
        Ok(self.client.delete_media(id, cascade_files).await?)
    }
}
