//! Copies custom formats from Radarr to Sonarr.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::clients::arr::ArrClient;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub created: Vec<String>,
    pub skipped: usize,
    pub failed: Vec<(String, String)>,
}

fn format_name(format: &Value) -> Option<&str> {
    format.get("name").and_then(Value::as_str)
}

/// Creates every `source` format whose name is missing from `target`.
///
/// Formats are matched by name only; existing ones are never updated. A
/// failed create is recorded and the rest still run. With `dry_run` nothing
/// is written and `created` lists what would be.
pub async fn sync_custom_formats(
    source: &ArrClient,
    target: &ArrClient,
    dry_run: bool,
) -> anyhow::Result<SyncSummary> {
    let source_formats = source.list_custom_formats().await?;
    let target_formats = target.list_custom_formats().await?;

    let existing: HashSet<&str> = target_formats.iter().filter_map(format_name).collect();
    info!(
        source = source_formats.len(),
        target = target_formats.len(),
        "Fetched custom formats"
    );

    let mut summary = SyncSummary::default();
    for format in &source_formats {
        let Some(name) = format_name(format) else {
            continue;
        };
        if existing.contains(name) {
            summary.skipped += 1;
            continue;
        }

        if dry_run {
            info!(format = name, "[DRY RUN] Would create custom format");
            summary.created.push(name.to_string());
            continue;
        }

        let mut payload = format.clone();
        if let Some(fields) = payload.as_object_mut() {
            fields.remove("id");
        }

        match target.create_custom_format(&payload).await {
            Ok(()) => {
                info!(format = name, "Created custom format");
                summary.created.push(name.to_string());
            }
            Err(e) => {
                warn!(format = name, error = %e, "Failed to create custom format");
                summary.failed.push((name.to_string(), format!("{e:#}")));
            }
        }
    }

    Ok(summary)
}
