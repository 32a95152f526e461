//! Set reconciliation between a source of truth and its dependents.
//!
//! A pass fetches the desired identifiers once, then handles each dependent
//! provider in turn: list its records, keep the ones whose identifier is not
//! desired, and delete them one by one. A provider that cannot be listed is
//! skipped and a failed delete is recorded. Neither stops the pass. The only
//! fatal condition is a source of truth that fails or reports nothing, since
//! acting on that would wipe every dependent.

mod provider;
mod result;

pub use provider::{
    DeleteOutcome, DependentProvider, Inventory, ProviderError, SourceOfTruth, Unverified,
};
pub use result::{FailedItem, ProviderOutcome, ProviderStatus, ReconciliationResult, Summary};

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{Item, ItemId};

#[derive(Debug, Error)]
pub enum SourceFailure {
    #[error("{0}")]
    Fetch(ProviderError),

    #[error("reported zero items")]
    Empty,
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Source of truth '{source_name}' unavailable: {cause}")]
    SourceUnavailable {
        source_name: String,
        cause: SourceFailure,
    },
}

/// A dependent provider plus how its deletes should be issued.
#[derive(Clone, Copy)]
pub struct Dependent<'a> {
    pub provider: &'a dyn DependentProvider,
    /// Also remove files and other downstream artifacts.
    pub cascade_files: bool,
}

impl<'a> Dependent<'a> {
    pub const fn new(provider: &'a dyn DependentProvider, cascade_files: bool) -> Self {
        Self {
            provider,
            cascade_files,
        }
    }
}

/// Items of `actual` whose id is not in `desired`, in their original order.
#[must_use]
pub fn orphans<'a>(desired: &HashSet<ItemId>, actual: &'a [Item]) -> Vec<&'a Item> {
    actual
        .iter()
        .filter(|item| !desired.contains(&item.id))
        .collect()
}

/// Runs one reconciliation pass.
///
/// With `dry_run` set, orphans are computed and reported but `delete` is
/// never called.
pub async fn reconcile(
    source: &dyn SourceOfTruth,
    dependents: &[Dependent<'_>],
    dry_run: bool,
) -> Result<ReconciliationResult, ReconcileError> {
    let desired = match source.fetch_desired_ids().await {
        Ok(ids) if ids.is_empty() => {
            warn!(
                source = source.name(),
                "Source of truth reported no items, aborting to prevent accidental deletion"
            );
            return Err(ReconcileError::SourceUnavailable {
                source_name: source.name().to_string(),
                cause: SourceFailure::Empty,
            });
        }
        Ok(ids) => ids,
        Err(e) => {
            warn!(source = source.name(), error = %e, "Failed to fetch source of truth");
            return Err(ReconcileError::SourceUnavailable {
                source_name: source.name().to_string(),
                cause: SourceFailure::Fetch(e),
            });
        }
    };

    info!(
        source = source.name(),
        desired = desired.len(),
        dry_run,
        "Fetched desired state"
    );

    let mut all_orphans = Vec::new();
    let mut deleted = Vec::new();
    let mut failed = Vec::new();
    let mut outcomes = Vec::with_capacity(dependents.len());

    for dependent in dependents {
        let provider = dependent.provider;
        let name = provider.name();

        let inventory = match provider.fetch_actual_items().await {
            Ok(inventory) => inventory,
            Err(e) => {
                warn!(provider = name, error = %e, "Provider skipped: listing unavailable");
                outcomes.push(ProviderOutcome {
                    name: name.to_string(),
                    status: ProviderStatus::Skipped {
                        reason: e.to_string(),
                    },
                    unverified: Vec::new(),
                });
                continue;
            }
        };

        for entry in &inventory.unverified {
            warn!(
                provider = name,
                item = %entry.item,
                reason = %entry.reason,
                "Existence could not be verified, leaving untouched"
            );
        }

        let candidates = orphans(&desired, &inventory.items);
        info!(
            provider = name,
            actual = inventory.items.len(),
            orphans = candidates.len(),
            "Computed orphans"
        );

        for item in &candidates {
            all_orphans.push((*item).clone());

            if dry_run {
                info!(provider = name, item = %item, "[DRY RUN] Would delete");
                continue;
            }

            match provider.delete(item, dependent.cascade_files).await {
                Ok(DeleteOutcome::Deleted) => {
                    info!(provider = name, item = %item, "Deleted");
                    deleted.push((*item).clone());
                }
                Ok(DeleteOutcome::AlreadyAbsent) => {
                    debug!(provider = name, item = %item, "Already absent");
                    deleted.push((*item).clone());
                }
                Err(e) => {
                    warn!(provider = name, item = %item, error = %e, "Failed to delete");
                    failed.push(FailedItem {
                        item: (*item).clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        outcomes.push(ProviderOutcome {
            name: name.to_string(),
            status: ProviderStatus::Reconciled {
                actual: inventory.items.len(),
                orphans: candidates.len(),
            },
            unverified: inventory.unverified,
        });
    }

    Ok(ReconciliationResult::new(
        dry_run,
        all_orphans,
        deleted,
        failed,
        outcomes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSource {
        ids: Result<HashSet<ItemId>, String>,
    }

    impl FakeSource {
        fn with(ids: &[i64]) -> Self {
            Self {
                ids: Ok(ids.iter().copied().map(ItemId::Tmdb).collect()),
            }
        }

        fn failing() -> Self {
            Self {
                ids: Err("connection refused".to_string()),
            }
        }
    }

    #[async_trait::async_trait]
    impl SourceOfTruth for FakeSource {
        fn name(&self) -> &str {
            "fake-source"
        }

        async fn fetch_desired_ids(&self) -> Result<HashSet<ItemId>, ProviderError> {
            self.ids.clone().map_err(ProviderError::Other)
        }
    }

    /// In-memory dependent that forgets items it deletes.
    struct FakeDependent {
        name: String,
        items: Mutex<Vec<Item>>,
        unverified: Vec<Unverified>,
        listing_fails: bool,
        fail_on: HashSet<ItemId>,
        absent_on: HashSet<ItemId>,
        delete_calls: AtomicUsize,
        cascade_seen: Mutex<Vec<bool>>,
    }

    impl FakeDependent {
        fn new(name: &str, ids: &[i64]) -> Self {
            let items = ids
                .iter()
                .map(|id| Item::new(ItemId::Tmdb(*id), format!("Movie {id}"), id.to_string()))
                .collect();
            Self {
                name: name.to_string(),
                items: Mutex::new(items),
                unverified: Vec::new(),
                listing_fails: false,
                fail_on: HashSet::new(),
                absent_on: HashSet::new(),
                delete_calls: AtomicUsize::new(0),
                cascade_seen: Mutex::new(Vec::new()),
            }
        }

        fn failing_listing(mut self) -> Self {
            self.listing_fails = true;
            self
        }

        fn failing_delete(mut self, id: i64) -> Self {
            self.fail_on.insert(ItemId::Tmdb(id));
            self
        }

        fn absent_on_delete(mut self, id: i64) -> Self {
            self.absent_on.insert(ItemId::Tmdb(id));
            self
        }

        fn calls(&self) -> usize {
            self.delete_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl DependentProvider for FakeDependent {
        fn name(&self) -> &str {
            &self.name
        }

        async fn fetch_actual_items(&self) -> Result<Inventory, ProviderError> {
            if self.listing_fails {
                return Err(ProviderError::Other("timed out".to_string()));
            }
            Ok(Inventory {
                items: self.items.lock().unwrap().clone(),
                unverified: self.unverified.clone(),
            })
        }

        async fn delete(
            &self,
            item: &Item,
            cascade_files: bool,
        ) -> Result<DeleteOutcome, ProviderError> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            self.cascade_seen.lock().unwrap().push(cascade_files);
            if self.fail_on.contains(&item.id) {
                return Err(ProviderError::Status {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            self.items.lock().unwrap().retain(|i| i.id != item.id);
            if self.absent_on.contains(&item.id) {
                return Ok(DeleteOutcome::AlreadyAbsent);
            }
            Ok(DeleteOutcome::Deleted)
        }
    }

    fn ids(items: &[Item]) -> Vec<ItemId> {
        items.iter().map(|i| i.id.clone()).collect()
    }

    #[test]
    fn orphans_is_set_difference_in_fetch_order() {
        let desired: HashSet<ItemId> = [2, 4].into_iter().map(ItemId::Tmdb).collect();
        let actual: Vec<Item> = [5, 4, 1, 2, 3]
            .into_iter()
            .map(|id| Item::new(ItemId::Tmdb(id), "x", id.to_string()))
            .collect();

        let found: Vec<ItemId> = orphans(&desired, &actual)
            .into_iter()
            .map(|i| i.id.clone())
            .collect();
        assert_eq!(
            found,
            vec![ItemId::Tmdb(5), ItemId::Tmdb(1), ItemId::Tmdb(3)]
        );
    }

    #[test]
    fn orphans_independent_of_order() {
        let desired: HashSet<ItemId> = [1].into_iter().map(ItemId::Tmdb).collect();
        let forward: Vec<Item> = [1, 2, 3]
            .into_iter()
            .map(|id| Item::new(ItemId::Tmdb(id), "x", ""))
            .collect();
        let mut backward = forward.clone();
        backward.reverse();

        let a: HashSet<ItemId> = orphans(&desired, &forward)
            .into_iter()
            .map(|i| i.id.clone())
            .collect();
        let b: HashSet<ItemId> = orphans(&desired, &backward)
            .into_iter()
            .map(|i| i.id.clone())
            .collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }

    #[tokio::test]
    async fn dry_run_reports_without_deleting() {
        let source = FakeSource::with(&[1]);
        let radarr = FakeDependent::new("radarr", &[1, 2, 3]);

        let result = reconcile(&source, &[Dependent::new(&radarr, true)], true)
            .await
            .unwrap();

        assert!(result.dry_run());
        assert_eq!(ids(result.orphans()), vec![ItemId::Tmdb(2), ItemId::Tmdb(3)]);
        assert!(result.deleted().is_empty());
        assert_eq!(radarr.calls(), 0);
    }

    #[tokio::test]
    async fn empty_source_aborts_before_any_delete() {
        let source = FakeSource::with(&[]);
        let radarr = FakeDependent::new("radarr", &[1, 2]);
        let sonarr = FakeDependent::new("sonarr", &[3]);

        let err = reconcile(
            &source,
            &[Dependent::new(&radarr, true), Dependent::new(&sonarr, true)],
            false,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::SourceUnavailable {
                cause: SourceFailure::Empty,
                ..
            }
        ));
        assert_eq!(radarr.calls() + sonarr.calls(), 0);
    }

    #[tokio::test]
    async fn unreachable_source_aborts() {
        let source = FakeSource::failing();
        let radarr = FakeDependent::new("radarr", &[1]);

        let err = reconcile(&source, &[Dependent::new(&radarr, true)], false)
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Source of truth 'fake-source' unavailable: connection refused"
        );
        assert_eq!(radarr.calls(), 0);
    }

    #[tokio::test]
    async fn partial_failure_processes_every_orphan() {
        let source = FakeSource::with(&[1]);
        let radarr = FakeDependent::new("radarr", &[1, 2, 3]).failing_delete(2);

        let result = reconcile(&source, &[Dependent::new(&radarr, true)], false)
            .await
            .unwrap();

        assert_eq!(radarr.calls(), 2);
        assert_eq!(ids(result.deleted()), vec![ItemId::Tmdb(3)]);
        assert_eq!(result.failed().len(), 1);
        assert_eq!(result.failed()[0].item.id, ItemId::Tmdb(2));
        assert_eq!(result.failed()[0].reason, "unexpected status 500: boom");
        assert!(!result.is_clean());
    }

    #[tokio::test]
    async fn failing_provider_does_not_block_others() {
        let source = FakeSource::with(&[1]);
        let radarr = FakeDependent::new("radarr", &[1, 2]).failing_listing();
        let sonarr = FakeDependent::new("sonarr", &[1, 5]);

        let result = reconcile(
            &source,
            &[Dependent::new(&radarr, true), Dependent::new(&sonarr, true)],
            false,
        )
        .await
        .unwrap();

        assert_eq!(ids(result.deleted()), vec![ItemId::Tmdb(5)]);
        let skipped: Vec<&str> = result.skipped().map(|p| p.name.as_str()).collect();
        assert_eq!(skipped, vec!["radarr"]);
        assert_eq!(
            result.providers()[1].status,
            ProviderStatus::Reconciled {
                actual: 2,
                orphans: 1
            }
        );
        assert_eq!(result.summary().skipped, 1);
    }

    #[tokio::test]
    async fn already_absent_counts_as_deleted() {
        let source = FakeSource::with(&[1]);
        let radarr = FakeDependent::new("radarr", &[1, 9]).absent_on_delete(9);

        let result = reconcile(&source, &[Dependent::new(&radarr, true)], false)
            .await
            .unwrap();

        assert_eq!(ids(result.deleted()), vec![ItemId::Tmdb(9)]);
        assert!(result.failed().is_empty());
    }

    #[tokio::test]
    async fn second_pass_finds_nothing() {
        let source = FakeSource::with(&[1, 2]);
        let radarr = FakeDependent::new("radarr", &[1, 2, 3, 4]);

        let first = reconcile(&source, &[Dependent::new(&radarr, true)], false)
            .await
            .unwrap();
        assert_eq!(first.orphans().len(), 2);

        let second = reconcile(&source, &[Dependent::new(&radarr, true)], false)
            .await
            .unwrap();
        assert!(second.orphans().is_empty());
        assert!(second.is_clean());
    }

    #[tokio::test]
    async fn unverified_items_are_never_deleted() {
        let source = FakeSource::with(&[1]);
        let mut jellyfin = FakeDependent::new("jellyfin", &[1]);
        jellyfin.unverified.push(Unverified {
            item: Item::new(ItemId::Tmdb(77), "Odd Path", "77"),
            reason: "path outside mapped roots".to_string(),
        });

        let result = reconcile(&source, &[Dependent::new(&jellyfin, false)], false)
            .await
            .unwrap();

        assert!(result.orphans().is_empty());
        assert_eq!(jellyfin.calls(), 0);
        assert_eq!(result.unverified_count(), 1);
        assert_eq!(result.summary().unverified, 1);
    }

    #[tokio::test]
    async fn cascade_flag_is_forwarded_per_provider() {
        let source = FakeSource::with(&[1]);
        let radarr = FakeDependent::new("radarr", &[2]);
        let qbit = FakeDependent::new("qbittorrent", &[3]);

        reconcile(
            &source,
            &[Dependent::new(&radarr, true), Dependent::new(&qbit, false)],
            false,
        )
        .await
        .unwrap();

        assert_eq!(*radarr.cascade_seen.lock().unwrap(), vec![true]);
        assert_eq!(*qbit.cascade_seen.lock().unwrap(), vec![false]);
    }
}
