use std::collections::HashSet;
use std::path::PathBuf;

use tracing::debug;
use walkdir::WalkDir;

use crate::domain::ItemId;
use crate::reconcile::{ProviderError, SourceOfTruth};

/// Every file and directory below a set of roots.
///
/// Symbolic links are followed, so a library folder linked in from another
/// disk is listed under the path that points at it. An unreadable entry or a
/// link loop fails the whole listing: a partial walk would make the skipped
/// files look deleted.
pub struct DiskInventory {
    name: String,
    roots: Vec<PathBuf>,
}

impl DiskInventory {
    pub fn new<S: AsRef<str>>(name: impl Into<String>, roots: &[S]) -> Self {
        Self {
            name: name.into(),
            roots: roots.iter().map(|r| PathBuf::from(r.as_ref())).collect(),
        }
    }
}

fn walk(name: &str, roots: &[PathBuf]) -> Result<HashSet<ItemId>, ProviderError> {
    if roots.is_empty() {
        return Err(ProviderError::Other("no directories configured".to_string()));
    }

    let mut paths = HashSet::new();
    for root in roots {
        if !root.is_dir() {
            return Err(ProviderError::Other(format!(
                "directory '{}' is missing or not mounted",
                root.display()
            )));
        }

        for entry in WalkDir::new(root).follow_links(true).min_depth(1) {
            let entry = entry.map_err(|e| {
                ProviderError::Other(format!("failed to scan '{}': {e}", root.display()))
            })?;
            paths.insert(ItemId::path(entry.path()));
        }
    }

    debug!(source = name, entries = paths.len(), "Scanned directories");
    Ok(paths)
}

#[async_trait::async_trait]
impl SourceOfTruth for DiskInventory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_desired_ids(&self) -> Result<HashSet<ItemId>, ProviderError> {
        let name = self.name.clone();
        let roots = self.roots.clone();
        tokio::task::spawn_blocking(move || walk(&name, &roots))
            .await
            .map_err(|e| ProviderError::Other(format!("directory scan aborted: {e}")))?
    }
}
