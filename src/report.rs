//! Human-readable and structured reporting of reconciliation passes.

use chrono::Local;
use tracing::info;

use crate::reconcile::{ProviderStatus, ReconcileError, ReconciliationResult};

/// Summary line: "N orphan(s) found, M deleted, K failed".
#[must_use]
pub fn count_line(result: &ReconciliationResult) -> String {
    let summary = result.summary();
    format!(
        "{} orphan(s) found, {} deleted, {} failed",
        summary.orphans, summary.deleted, summary.failed
    )
}

/// Renders a finished pass as the lines printed to the terminal.
#[must_use]
pub fn render(title: &str, result: &ReconciliationResult) -> Vec<String> {
    let mut lines = Vec::new();
    let mode = if result.dry_run() { "DRY RUN" } else { "LIVE" };
    lines.push(format!(
        "[{}] {title} ({mode})",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    lines.push(format!("{:-<60}", ""));

    for provider in result.providers() {
        match &provider.status {
            ProviderStatus::Reconciled { actual, orphans } => {
                lines.push(format!(
                    "✓ {}: {actual} item(s), {orphans} orphan(s)",
                    provider.name
                ));
            }
            ProviderStatus::Skipped { reason } => {
                lines.push(format!("⚠ {}: provider skipped: {reason}", provider.name));
            }
        }
        for entry in &provider.unverified {
            lines.push(format!("  ? {} left untouched: {}", entry.item, entry.reason));
        }
    }

    if !result.orphans().is_empty() {
        lines.push(String::new());
        let verb = if result.dry_run() {
            "Would delete"
        } else {
            "Orphans"
        };
        lines.push(format!("{verb}:"));
        for item in result.orphans() {
            lines.push(format!("  - {item}"));
        }
    }

    if !result.failed().is_empty() {
        lines.push(String::new());
        lines.push("Failed:".to_string());
        for failed in result.failed() {
            lines.push(format!("  ✗ {}: {}", failed.item, failed.reason));
        }
    }

    let unverified = result.unverified_count();
    if unverified > 0 {
        lines.push(String::new());
        lines.push(format!("{unverified} item(s) could not be verified and were skipped"));
    }

    lines.push(String::new());
    lines.push(count_line(result));
    lines
}

/// Emits the summary as a tracing event and prints the rendered report.
pub fn print(title: &str, result: &ReconciliationResult) {
    let summary = result.summary();
    info!(
        pass = title,
        dry_run = result.dry_run(),
        orphans = summary.orphans,
        deleted = summary.deleted,
        failed = summary.failed,
        skipped = summary.skipped,
        unverified = summary.unverified,
        "Reconciliation finished"
    );

    for line in render(title, result) {
        println!("{line}");
    }
    println!();
}

/// Prints why a pass did not run.
pub fn print_aborted(title: &str, err: &ReconcileError) {
    println!(
        "[{}] {title}: aborted",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    println!("✗ {err}");
    println!("No changes were made.");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Item, ItemId};
    use crate::reconcile::{FailedItem, ProviderOutcome};

    fn sample(dry_run: bool) -> ReconciliationResult {
        let orphan = Item::new(ItemId::Tmdb(1), "Heat (1995)", "10");
        let broken = Item::new(ItemId::Tmdb(2), "Ronin (1998)", "11");
        ReconciliationResult::new(
            dry_run,
            vec![orphan.clone(), broken.clone()],
            if dry_run { Vec::new() } else { vec![orphan] },
            if dry_run {
                Vec::new()
            } else {
                vec![FailedItem {
                    item: broken,
                    reason: "unexpected status 500: boom".to_string(),
                }]
            },
            vec![
                ProviderOutcome {
                    name: "radarr".to_string(),
                    status: ProviderStatus::Reconciled {
                        actual: 5,
                        orphans: 2,
                    },
                    unverified: Vec::new(),
                },
                ProviderOutcome {
                    name: "sonarr".to_string(),
                    status: ProviderStatus::Skipped {
                        reason: "connection refused".to_string(),
                    },
                    unverified: Vec::new(),
                },
            ],
        )
    }

    #[test]
    fn test_count_line() {
        assert_eq!(count_line(&sample(false)), "2 orphan(s) found, 1 deleted, 1 failed");
        assert_eq!(count_line(&sample(true)), "2 orphan(s) found, 0 deleted, 0 failed");
    }

    #[test]
    fn test_skipped_provider_is_explicit() {
        let lines = render("Media cleanup", &sample(false));
        assert!(lines.iter().any(|l| l.contains("sonarr: provider skipped: connection refused")));
        assert!(lines[0].contains("(LIVE)"));
    }

    #[test]
    fn test_dry_run_lists_would_delete() {
        let lines = render("Media cleanup", &sample(true));
        assert!(lines[0].contains("(DRY RUN)"));
        assert!(lines.iter().any(|l| l == "Would delete:"));
        assert!(lines.iter().any(|l| l.contains("Heat (1995) (tmdb:1)")));
    }
}
