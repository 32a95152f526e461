use serde::Serialize;

use crate::domain::Item;
use crate::reconcile::provider::Unverified;

/// An orphan whose delete call failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    pub item: Item,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProviderStatus {
    Reconciled { actual: usize, orphans: usize },
    /// The listing could not be fetched; no orphans were computed.
    Skipped { reason: String },
}

/// What happened to one dependent provider during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderOutcome {
    pub name: String,
    pub status: ProviderStatus,
    #[serde(skip)]
    pub unverified: Vec<Unverified>,
}

impl ProviderOutcome {
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self.status, ProviderStatus::Skipped { .. })
    }
}

/// Outcome of one reconciliation pass. Built once, read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationResult {
    dry_run: bool,
    orphans: Vec<Item>,
    deleted: Vec<Item>,
    failed: Vec<FailedItem>,
    providers: Vec<ProviderOutcome>,
}

impl ReconciliationResult {
    pub(crate) const fn new(
        dry_run: bool,
        orphans: Vec<Item>,
        deleted: Vec<Item>,
        failed: Vec<FailedItem>,
        providers: Vec<ProviderOutcome>,
    ) -> Self {
        Self {
            dry_run,
            orphans,
            deleted,
            failed,
            providers,
        }
    }

    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.dry_run
    }

    #[must_use]
    pub fn orphans(&self) -> &[Item] {
        &self.orphans
    }

    #[must_use]
    pub fn deleted(&self) -> &[Item] {
        &self.deleted
    }

    #[must_use]
    pub fn failed(&self) -> &[FailedItem] {
        &self.failed
    }

    /// One entry per dependent, in the order they were passed in.
    #[must_use]
    pub fn providers(&self) -> &[ProviderOutcome] {
        &self.providers
    }

    pub fn skipped(&self) -> impl Iterator<Item = &ProviderOutcome> {
        self.providers.iter().filter(|p| p.is_skipped())
    }

    #[must_use]
    pub fn unverified_count(&self) -> usize {
        self.providers.iter().map(|p| p.unverified.len()).sum()
    }

    /// True when every provider was reachable and every delete succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.skipped().next().is_none()
    }

    #[must_use]
    pub fn summary(&self) -> Summary {
        Summary {
            orphans: self.orphans.len(),
            deleted: self.deleted.len(),
            failed: self.failed.len(),
            skipped: self.skipped().count(),
            unverified: self.unverified_count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub orphans: usize,
    pub deleted: usize,
    pub failed: usize,
    pub skipped: usize,
    pub unverified: usize,
}
