use tracing::info;

use super::{jellyfin_client, run_pass};
use crate::config::Config;
use crate::providers::{DiskInventory, JellyfinFiles, PathMapper};
use crate::reconcile::Dependent;

pub async fn cmd_jellyfin_cleanup(config: &Config) -> anyhow::Result<()> {
    let dry_run = config.general.dry_run;
    info!(dry_run, "Starting Jellyfin cleanup");

    let jellyfin = &config.jellyfin;
    let library = DiskInventory::new("media library", &jellyfin.library_roots);
    let files = JellyfinFiles::new(
        jellyfin_client(config)?,
        PathMapper::new(&jellyfin.path_mappings, &jellyfin.library_roots),
    );

    run_pass(
        "Jellyfin cleanup: library items vs files on disk",
        &library,
        &[Dependent::new(&files, false)],
        dry_run,
    )
    .await?;

    Ok(())
}
