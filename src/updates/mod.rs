//! Checks pinned compose images against the tags their registry publishes.

pub mod compose;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clients::registry::{ImageRef, RegistryClient};
use crate::reconcile::ProviderError;

fn ls_build() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-ls(\d+)").expect("Invalid regex"))
}

fn build_number(tag: &str) -> Option<u64> {
    ls_build()
        .captures(tag)
        .and_then(|caps| caps[1].parse().ok())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageStatus {
    /// The image name does not map to a supported registry.
    Unresolvable,
    TagsUnavailable { reason: String },
    /// The pinned tag is no longer published, which usually means it is old.
    NotInRegistry,
    UpdateAvailable { latest: String },
    UpToDate,
}

impl ImageStatus {
    #[must_use]
    pub const fn is_update(&self) -> bool {
        matches!(self, Self::NotInRegistry | Self::UpdateAvailable { .. })
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Unresolvable | Self::TagsUnavailable { .. })
    }
}

impl fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolvable => write!(f, "⚠ Cannot determine registry"),
            Self::TagsUnavailable { reason } => write!(f, "⚠ Failed to fetch tags: {reason}"),
            Self::NotInRegistry => write!(f, "⚠ Version not found in registry, may be outdated"),
            Self::UpdateAvailable { latest } => write!(f, "✨ Update available: {latest}"),
            Self::UpToDate => write!(f, "✓ Up to date"),
        }
    }
}

/// Classifies a pinned tag against the published tag list.
///
/// LinuxServer tags carry a `-lsNNN` build counter; a higher counter on any
/// published tag counts as an update. Other images are up to date as long as
/// their tag is still published.
#[must_use]
pub fn classify(current: &str, tags: &[String]) -> ImageStatus {
    if !tags.iter().any(|t| t == current) {
        return ImageStatus::NotInRegistry;
    }

    let Some(current_build) = build_number(current) else {
        return ImageStatus::UpToDate;
    };

    let newest = tags
        .iter()
        .filter_map(|t| build_number(t).map(|n| (n, t)))
        .max_by_key(|(n, _)| *n);

    match newest {
        Some((build, tag)) if build > current_build => ImageStatus::UpdateAvailable {
            latest: tag.clone(),
        },
        _ => ImageStatus::UpToDate,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageReport {
    pub image: String,
    pub current: String,
    pub status: ImageStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateSummary {
    pub total: usize,
    pub updates_available: usize,
    pub up_to_date: usize,
    pub check_failed: usize,
}

impl UpdateSummary {
    #[must_use]
    pub fn from_reports(reports: &[ImageReport]) -> Self {
        let mut summary = Self {
            total: reports.len(),
            ..Self::default()
        };
        for report in reports {
            if report.status.is_failure() {
                summary.check_failed += 1;
            } else if report.status.is_update() {
                summary.updates_available += 1;
            } else {
                summary.up_to_date += 1;
            }
        }
        summary
    }
}

/// Checks one image. Never fails: problems become a failed status.
pub async fn check_image(registry: &RegistryClient, image: &str, current: &str) -> ImageStatus {
    let Some(reference) = ImageRef::resolve(image) else {
        warn!(image, "Cannot determine registry");
        return ImageStatus::Unresolvable;
    };

    match registry.list_tags(&reference).await {
        Ok(tags) if tags.is_empty() => {
            warn!(image, "Registry returned no tags");
            ImageStatus::TagsUnavailable {
                reason: "no tags published".to_string(),
            }
        }
        Ok(tags) => classify(current, &tags),
        Err(e) => {
            let auth_required = matches!(
                e.downcast_ref::<ProviderError>(),
                Some(ProviderError::Status { status: 401, .. })
            );
            if auth_required {
                debug!(image, registry = %reference.registry, "Registry requires authentication");
            } else {
                warn!(image, registry = %reference.registry, error = %e, "Failed to fetch tags");
            }
            ImageStatus::TagsUnavailable {
                reason: format!("{e:#}"),
            }
        }
    }
}

/// Checks every image in name order.
pub async fn check_all(
    registry: &RegistryClient,
    images: &BTreeMap<String, String>,
) -> Vec<ImageReport> {
    let mut reports = Vec::with_capacity(images.len());
    for (image, current) in images {
        debug!(image = %image, current_version = %current, "Checking image");
        let status = check_image(registry, image, current).await;
        info!(
            image = %image,
            current_version = %current,
            update_available = status.is_update(),
            "{status}"
        );
        reports.push(ImageReport {
            image: image.clone(),
            current: current.clone(),
            status,
        });
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_missing_tag_is_not_in_registry() {
        assert_eq!(
            classify("1.2.3", &tags(&["1.2.4", "latest"])),
            ImageStatus::NotInRegistry
        );
    }

    #[test]
    fn test_higher_ls_build_is_update() {
        let status = classify(
            "4.0.9-ls250",
            &tags(&["4.0.9-ls250", "4.0.10-ls252", "4.0.10-ls251", "latest"]),
        );
        assert_eq!(
            status,
            ImageStatus::UpdateAvailable {
                latest: "4.0.10-ls252".to_string()
            }
        );
    }

    #[test]
    fn test_current_ls_build_is_up_to_date() {
        assert_eq!(
            classify("4.0.10-ls252", &tags(&["4.0.9-ls250", "4.0.10-ls252"])),
            ImageStatus::UpToDate
        );
    }

    #[test]
    fn test_plain_tag_present_is_up_to_date() {
        assert_eq!(classify("16", &tags(&["15", "16", "17"])), ImageStatus::UpToDate);
    }

    #[test]
    fn test_summary_counts() {
        let report = |status| ImageReport {
            image: "x".to_string(),
            current: "1".to_string(),
            status,
        };
        let reports = vec![
            report(ImageStatus::UpToDate),
            report(ImageStatus::NotInRegistry),
            report(ImageStatus::UpdateAvailable {
                latest: "2".to_string(),
            }),
            report(ImageStatus::Unresolvable),
            report(ImageStatus::TagsUnavailable {
                reason: "401".to_string(),
            }),
        ];

        assert_eq!(
            UpdateSummary::from_reports(&reports),
            UpdateSummary {
                total: 5,
                updates_available: 2,
                up_to_date: 1,
                check_failed: 2,
            }
        );
    }
}
