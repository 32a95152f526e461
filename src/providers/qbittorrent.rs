use tracing::debug;

use super::PathMapper;
use crate::clients::qbittorrent::QBitClient;
use crate::domain::{Item, ItemId};
use crate::reconcile::{DeleteOutcome, DependentProvider, Inventory, ProviderError};

/// Completed torrents keyed by the host path of their content.
///
/// Torrents still downloading are left alone. With `cascade_files` the
/// downloaded data is removed along with the torrent.
pub struct TorrentInventory {
    client: QBitClient,
    paths: PathMapper,
}

impl TorrentInventory {
    #[must_use]
    pub const fn new(client: QBitClient, paths: PathMapper) -> Self {
        Self { client, paths }
    }
}

#[async_trait::async_trait]
impl DependentProvider for TorrentInventory {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn fetch_actual_items(&self) -> Result<Inventory, ProviderError> {
        let torrents = self.client.get_torrents(Some("completed")).await?;
        debug!(count = torrents.len(), "Completed torrents");

        let mut inventory = Inventory::default();
        for torrent in torrents {
            let label = if torrent.state.is_error() {
                format!("{} [{}]", torrent.name, torrent.state)
            } else {
                torrent.name.clone()
            };

            match self.paths.resolve(&torrent.content_path) {
                Ok(local) => {
                    inventory.push(Item::new(ItemId::path(local), label, torrent.hash));
                }
                Err(reason) => inventory.push_unverified(
                    Item::new(ItemId::path(&torrent.content_path), label, torrent.hash),
                    reason,
                ),
            }
        }

        Ok(inventory)
    }

    async fn delete(&self, item: &Item, cascade_files: bool) -> Result<DeleteOutcome, ProviderError> {
        Ok(self
            .client
            .delete_torrent(&item.native_id, cascade_files)
            .await?)
    }
}
