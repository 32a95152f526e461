//! Adapters that expose services and the filesystem to the reconciler.

pub mod arr;
pub mod disk;
pub mod jellyfin;
pub mod jellyseerr;
pub mod qbittorrent;

pub use arr::ArrLibrary;
pub use disk::DiskInventory;
pub use jellyfin::{JellyfinCatalog, JellyfinFiles};
pub use jellyseerr::{JellyseerrCatalog, JellyseerrRequests};
pub use qbittorrent::TorrentInventory;

use std::path::{Component, Path, PathBuf};

/// Translates paths reported by a containerised service into host paths and
/// checks they fall under a directory this host actually scans.
///
/// A path that cannot be placed is not guessed at: callers report it as
/// unverified instead of treating it as present or missing.
#[derive(Debug, Clone, Default)]
pub struct PathMapper {
    mappings: Vec<(PathBuf, PathBuf)>,
    roots: Vec<PathBuf>,
}

impl PathMapper {
    pub fn new<S: AsRef<str>>(mappings: &[(S, S)], roots: &[S]) -> Self {
        Self {
            mappings: mappings
                .iter()
                .map(|(remote, local)| {
                    (
                        PathBuf::from(remote.as_ref()),
                        PathBuf::from(local.as_ref()),
                    )
                })
                .collect(),
            roots: roots.iter().map(|r| PathBuf::from(r.as_ref())).collect(),
        }
    }

    /// Host path for `remote`, or the reason it could not be resolved.
    pub fn resolve(&self, remote: &str) -> Result<PathBuf, String> {
        if remote.trim().is_empty() {
            return Err("no path reported".to_string());
        }

        let remote_path = Path::new(remote);
        if remote_path
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(format!("path '{remote}' is not normalised"));
        }

        let local = if self.mappings.is_empty() {
            remote_path.to_path_buf()
        } else {
            self.mappings
                .iter()
                .find_map(|(from, to)| {
                    remote_path
                        .strip_prefix(from)
                        .ok()
                        .map(|rest| to.join(rest))
                })
                .ok_or_else(|| format!("path '{remote}' matches no path mapping"))?
        };

        if self.roots.iter().any(|root| local.starts_with(root)) {
            Ok(local)
        } else {
            Err(format!(
                "path '{}' is outside the scanned roots",
                local.display()
            ))
        }
    }
}
