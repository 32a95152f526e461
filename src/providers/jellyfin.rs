use std::collections::HashSet;

use tracing::debug;

use super::PathMapper;
use crate::clients::jellyfin::JellyfinClient;
use crate::domain::{Item, ItemId};
use crate::reconcile::{
    DeleteOutcome, DependentProvider, Inventory, ProviderError, SourceOfTruth,
};

const FILE_ITEM_TYPES: &[&str] = &["Movie", "Episode"];
const CATALOG_ITEM_TYPES: &[&str] = &["Movie", "Series"];

/// Jellyfin library entries keyed by the host path of their media file.
///
/// Compared against a disk scan, so entries whose file was removed out of
/// band show up as orphans.
pub struct JellyfinFiles {
    client: JellyfinClient,
    paths: PathMapper,
}

impl JellyfinFiles {
    #[must_use]
    pub const fn new(client: JellyfinClient, paths: PathMapper) -> Self {
        Self { client, paths }
    }
}

#[async_trait::async_trait]
impl DependentProvider for JellyfinFiles {
    fn name(&self) -> &str {
        "jellyfin"
    }

    async fn fetch_actual_items(&self) -> Result<Inventory, ProviderError> {
        let items = self.client.list_items(FILE_ITEM_TYPES).await?;

        let mut inventory = Inventory::default();
        for entry in items {
            // Virtual items (missing episodes, boxsets) carry no path
            let Some(remote) = entry.path.as_deref() else {
                continue;
            };

            let label = format!("{} ({})", entry.name, entry.item_type);
            match self.paths.resolve(remote) {
                Ok(local) => inventory.push(Item::new(ItemId::path(local), label, entry.id)),
                Err(reason) => inventory.push_unverified(
                    Item::new(ItemId::path(remote), label, entry.id),
                    reason,
                ),
            }
        }

        Ok(inventory)
    }

    async fn delete(
        &self,
        item: &Item,
        _cascade_files: bool,
    ) -> Result<DeleteOutcome, ProviderError> {
        Ok(self.client.delete_item(&item.native_id).await?)
    }
}

/// Movies and series present in Jellyfin, keyed by Jellyfin id.
pub struct JellyfinCatalog {
    client: JellyfinClient,
}

impl JellyfinCatalog {
    #[must_use]
    pub const fn new(client: JellyfinClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl SourceOfTruth for JellyfinCatalog {
    fn name(&self) -> &str {
        "jellyfin"
    }

    async fn fetch_desired_ids(&self) -> Result<HashSet<ItemId>, ProviderError> {
        let items = self.client.list_items(CATALOG_ITEM_TYPES).await?;
        let ids: HashSet<ItemId> = items
            .iter()
            .map(|item| ItemId::jellyfin(&item.id))
            .collect();

        debug!(count = ids.len(), "Jellyfin catalog");
        Ok(ids)
    }
}
