use tracing::info;

use super::{jellyfin_client, jellyseerr_client, run_pass};
use crate::config::Config;
use crate::providers::{JellyfinCatalog, JellyseerrRequests};
use crate::reconcile::Dependent;

pub async fn cmd_jellyseerr_cleanup(config: &Config) -> anyhow::Result<()> {
    let dry_run = config.general.dry_run;
    info!(dry_run, "Starting Jellyseerr cleanup");

    let catalog = JellyfinCatalog::new(jellyfin_client(config)?);
    let requests = JellyseerrRequests::new(jellyseerr_client(config)?);

    run_pass(
        "Jellyseerr cleanup: available media vs Jellyfin",
        &catalog,
        &[Dependent::new(&requests, false)],
        dry_run,
    )
    .await?;

    Ok(())
}
