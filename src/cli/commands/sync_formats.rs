use super::arr_client;
use crate::clients::arr::ArrKind;
use crate::config::Config;
use crate::formats::sync_custom_formats;

pub async fn cmd_sync_formats(config: &Config) -> anyhow::Result<()> {
    let dry_run = config.general.dry_run;
    let radarr = arr_client(config, ArrKind::Radarr)?;
    let sonarr = arr_client(config, ArrKind::Sonarr)?;

    let mode = if dry_run { "DRY RUN" } else { "LIVE" };
    println!("Custom format sync: Radarr -> Sonarr ({mode})");
    println!("{:-<60}", "");

    let summary = sync_custom_formats(&radarr, &sonarr, dry_run).await?;

    let verb = if dry_run { "Would create" } else { "✓ Created" };
    for name in &summary.created {
        println!("{verb}: {name}");
    }
    for (name, reason) in &summary.failed {
        println!("✗ {name}: {reason}");
    }

    println!();
    println!(
        "{} created, {} already present, {} failed",
        summary.created.len(),
        summary.skipped,
        summary.failed.len()
    );

    Ok(())
}
