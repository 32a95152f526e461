use tracing::info;

use super::{arr_client, jellyseerr_client, qbit_client, run_pass};
use crate::clients::arr::ArrKind;
use crate::config::Config;
use crate::providers::{ArrLibrary, DiskInventory, JellyseerrCatalog, PathMapper, TorrentInventory};
use crate::reconcile::Dependent;

/// Two passes: Radarr/Sonarr against Jellyseerr, then completed torrents
/// against what is left in the download directories.
///
/// The passes are independent; the torrent pass still runs when the first
/// one aborts, and the command fails afterwards.
pub async fn cmd_media_cleanup(config: &Config) -> anyhow::Result<()> {
    let dry_run = config.general.dry_run;
    info!(dry_run, "Starting media cleanup");

    let catalog = JellyseerrCatalog::new(jellyseerr_client(config)?);
    let radarr = ArrLibrary::new(arr_client(config, ArrKind::Radarr)?);
    let sonarr = ArrLibrary::new(arr_client(config, ArrKind::Sonarr)?);

    let library_pass = run_pass(
        "Media cleanup: Radarr/Sonarr vs Jellyseerr",
        &catalog,
        &[Dependent::new(&radarr, true), Dependent::new(&sonarr, true)],
        dry_run,
    )
    .await;

    let qbit = &config.qbittorrent;
    let downloads = DiskInventory::new("downloads", &qbit.download_roots);
    let torrents = TorrentInventory::new(
        qbit_client(config)?,
        PathMapper::new(&qbit.path_mappings, &qbit.download_roots),
    );

    let torrent_pass = run_pass(
        "Media cleanup: qBittorrent vs download directories",
        &downloads,
        &[Dependent::new(&torrents, false)],
        dry_run,
    )
    .await;

    library_pass?;
    torrent_pass?;
    Ok(())
}
