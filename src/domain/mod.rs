//! Domain types shared by every reconciliation pass.
//!
//! Identifiers are namespaced so that two providers can only ever match when
//! they speak about the same external catalog. A TMDB id of `42` and a TVDB
//! id of `42` are different items.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Shared key used to match an item across two systems.
///
/// # Examples
///
/// ```rust
/// use reconcilarr::domain::ItemId;
///
/// assert_ne!(ItemId::Tmdb(42), ItemId::Tvdb(42));
/// assert_eq!(
///     ItemId::jellyfin("A1B2-C3D4"),
///     ItemId::jellyfin("a1b2c3d4"),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ItemId {
    /// The Movie Database id (movies).
    Tmdb(i64),
    /// TheTVDB id (series).
    Tvdb(i64),
    /// Jellyfin library item id, normalised.
    Jellyfin(String),
    /// Absolute path as seen from this host.
    Path(PathBuf),
}

impl ItemId {
    /// Builds a Jellyfin id, lowercased and with dashes removed.
    ///
    /// Jellyfin reports ids as bare hex while Jellyseerr sometimes keeps the
    /// dashed GUID form.
    #[must_use]
    pub fn jellyfin(raw: &str) -> Self {
        let normalized: String = raw
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::Jellyfin(normalized)
    }

    #[must_use]
    pub fn path(path: impl AsRef<Path>) -> Self {
        Self::Path(path.as_ref().to_path_buf())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tmdb(id) => write!(f, "tmdb:{id}"),
            Self::Tvdb(id) => write!(f, "tvdb:{id}"),
            Self::Jellyfin(id) => write!(f, "jellyfin:{id}"),
            Self::Path(path) => write!(f, "path:{}", path.display()),
        }
    }
}

/// A provider-local record.
///
/// `id` is the shared key compared against the source of truth, while
/// `native_id` is whatever the owning service needs to address the record
/// (a Radarr movie id, a torrent hash, a Jellyseerr media id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub display_name: String,
    pub native_id: String,
}

impl Item {
    pub fn new(id: ItemId, display_name: impl Into<String>, native_id: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            native_id: native_id.into(),
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn namespaces_never_collide() {
        let mut set = HashSet::new();
        set.insert(ItemId::Tmdb(7));
        assert!(!set.contains(&ItemId::Tvdb(7)));
        assert!(set.contains(&ItemId::Tmdb(7)));
    }

    #[test]
    fn jellyfin_ids_are_normalized() {
        let dashed = ItemId::jellyfin("5D4B3A2C-0000-1111-2222-ABCDEFABCDEF");
        let bare = ItemId::jellyfin("5d4b3a2c000011112222abcdefabcdef");
        assert_eq!(dashed, bare);
    }

    #[test]
    fn display_includes_namespace() {
        assert_eq!(ItemId::Tvdb(81189).to_string(), "tvdb:81189");
        let item = Item::new(ItemId::Tmdb(603), "The Matrix", "12");
        assert_eq!(item.to_string(), "The Matrix (tmdb:603)");
    }
}
