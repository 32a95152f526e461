use std::path::Path;

use tracing::info;

use crate::clients::registry::RegistryClient;
use crate::config::Config;
use crate::updates::{self, UpdateSummary, compose};

pub async fn cmd_check_updates(config: &Config) -> anyhow::Result<()> {
    let dir = Path::new(&config.compose.directory);
    info!(directory = %dir.display(), "Starting Docker image update check");

    let images = compose::scan_images(dir, &config.compose.skip_images)?;
    info!(count = images.len(), "Found pinned images");

    println!("Docker image update check");
    println!("{:-<60}", "");

    let registry = RegistryClient::new(config.general.request_timeout())?;
    let reports = updates::check_all(&registry, &images).await;

    for report in &reports {
        println!("{}:{}", report.image, report.current);
        println!("  {}", report.status);
    }

    let summary = UpdateSummary::from_reports(&reports);
    info!(
        total = summary.total,
        updates_available = summary.updates_available,
        up_to_date = summary.up_to_date,
        check_failed = summary.check_failed,
        "Update check complete"
    );

    println!();
    println!("Summary:");
    println!("  Total images: {}", summary.total);
    println!("  Updates available: {}", summary.updates_available);
    println!("  Up to date: {}", summary.up_to_date);
    println!("  Check failed: {}", summary.check_failed);

    Ok(())
}
