//! Pinned image discovery in Docker Compose files.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Result, bail};
use regex::Regex;
use tracing::warn;
use walkdir::WalkDir;

fn image_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"image:\s+([^:\s]+):([^\s]+)").expect("Invalid regex"))
}

/// Collects `image -> tag` from every `*.yml`/`*.yaml` below `dir`.
///
/// Files are visited in path order and a later file overrides an earlier
/// one for the same image. Images containing any of `skip` are ignored.
pub fn scan_images(dir: &Path, skip: &[String]) -> Result<BTreeMap<String, String>> {
    if !dir.is_dir() {
        bail!("Compose directory not found: {}", dir.display());
    }

    let mut images = BTreeMap::new();
    let files = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yml" || ext == "yaml")
        });

    for entry in files {
        let content = match std::fs::read_to_string(entry.path()) {
            Ok(content) => content,
            Err(e) => {
                warn!(file = %entry.path().display(), error = %e, "Failed to read compose file");
                continue;
            }
        };

        for caps in image_line().captures_iter(&content) {
            let image = &caps[1];
            if skip.iter().any(|s| image.contains(s.as_str())) {
                continue;
            }
            images.insert(image.to_string(), caps[2].to_string());
        }
    }

    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("reconcilarr-compose-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_scan_pinned_images() {
        let dir = temp_dir();
        fs::write(
            dir.join("a-media.yml"),
            "services:\n  sonarr:\n    image: lscr.io/linuxserver/sonarr:4.0.9-ls250\n  portal:\n    image: homeserver-portal:1.0\n",
        )
        .unwrap();
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(
            dir.join("nested/b-db.yaml"),
            "services:\n  db:\n    image: postgres:16\n  sonarr:\n    image: lscr.io/linuxserver/sonarr:4.0.10-ls251\n",
        )
        .unwrap();
        fs::write(dir.join("notes.txt"), "image: ignored:1").unwrap();

        let images = scan_images(&dir, &["homeserver-portal".to_string()]).unwrap();

        assert_eq!(images.len(), 2);
        assert_eq!(images["postgres"], "16");
        assert_eq!(images["lscr.io/linuxserver/sonarr"], "4.0.10-ls251");

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_unpinned_images_are_ignored() {
        let dir = temp_dir();
        fs::write(dir.join("c.yml"), "services:\n  app:\n    image: nginx\n").unwrap();
        assert!(scan_images(&dir, &[]).unwrap().is_empty());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_missing_directory_fails() {
        let dir = std::env::temp_dir().join("reconcilarr-no-such-compose-dir");
        assert!(scan_images(&dir, &[]).is_err());
    }
}
