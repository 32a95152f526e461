mod check_updates;
mod init;
mod jellyfin_cleanup;
mod jellyseerr_cleanup;
mod media_cleanup;
mod sync_formats;

pub use check_updates::cmd_check_updates;
pub use init::cmd_init;
pub use jellyfin_cleanup::cmd_jellyfin_cleanup;
pub use jellyseerr_cleanup::cmd_jellyseerr_cleanup;
pub use media_cleanup::cmd_media_cleanup;
pub use sync_formats::cmd_sync_formats;

use crate::clients::arr::{ArrClient, ArrKind};
use crate::clients::jellyfin::JellyfinClient;
use crate::clients::jellyseerr::JellyseerrClient;
use crate::clients::qbittorrent::{QBitClient, QBitConfig};
use crate::config::{Config, Service};
use crate::reconcile::{self, Dependent, ReconcileError, SourceOfTruth};
use crate::report;

/// Runs one pass and prints its report.
///
/// An aborted pass is printed too and handed back so the caller can decide
/// whether later passes still run.
async fn run_pass(
    title: &str,
    source: &dyn SourceOfTruth,
    dependents: &[Dependent<'_>],
    dry_run: bool,
) -> Result<(), ReconcileError> {
    match reconcile::reconcile(source, dependents, dry_run).await {
        Ok(result) => {
            report::print(title, &result);
            Ok(())
        }
        Err(e) => {
            report::print_aborted(title, &e);
            Err(e)
        }
    }
}

fn jellyseerr_client(config: &Config) -> anyhow::Result<JellyseerrClient> {
    let api_key = config.require_api_key(Service::Jellyseerr)?;
    JellyseerrClient::new(
        &config.jellyseerr.url,
        api_key,
        config.general.request_timeout(),
    )
}

fn jellyfin_client(config: &Config) -> anyhow::Result<JellyfinClient> {
    let api_key = config.require_api_key(Service::Jellyfin)?;
    JellyfinClient::new(&config.jellyfin.url, api_key, config.general.request_timeout())
}

fn arr_client(config: &Config, kind: ArrKind) -> anyhow::Result<ArrClient> {
    let (service, section) = match kind {
        ArrKind::Radarr => (Service::Radarr, &config.radarr),
        ArrKind::Sonarr => (Service::Sonarr, &config.sonarr),
    };
    let api_key = config.require_api_key(service)?;
    ArrClient::new(kind, &section.url, api_key, config.general.request_timeout())
}

fn qbit_client(config: &Config) -> anyhow::Result<QBitClient> {
    let qbit = &config.qbittorrent;
    QBitClient::new(
        QBitConfig {
            base_url: qbit.url.clone(),
            username: qbit.username.clone(),
            password: qbit.password.clone(),
        },
        config.general.request_timeout(),
    )
}
