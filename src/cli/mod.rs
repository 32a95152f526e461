//! CLI module - Command-line interface for Reconcilarr
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::*;

/// Reconcilarr - keeps a self-hosted media stack consistent
/// Deletes records that no longer have a counterpart in their source of truth
#[derive(Parser)]
#[command(name = "reconcilarr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default search paths
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Report what would be deleted without deleting anything
    #[arg(long, global = true, conflicts_with = "live")]
    pub dry_run: bool,

    /// Actually delete orphans
    #[arg(long, global = true)]
    pub live: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Mode requested on the command line, if any.
    #[must_use]
    pub const fn dry_run_override(&self) -> Option<bool> {
        if self.dry_run {
            Some(true)
        } else if self.live {
            Some(false)
        } else {
            None
        }
    }
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Remove Radarr/Sonarr media no longer tracked by Jellyseerr, then
    /// completed torrents whose data is gone
    #[command(alias = "media")]
    MediaCleanup,

    /// Remove Jellyfin items whose file no longer exists on disk
    #[command(alias = "jellyfin")]
    JellyfinCleanup,

    /// Remove Jellyseerr media entries whose Jellyfin item is gone
    #[command(alias = "jellyseerr")]
    JellyseerrCleanup,

    /// Report pinned compose images with newer tags available
    #[command(alias = "updates")]
    CheckUpdates,

    /// Copy Radarr custom formats missing from Sonarr
    #[command(alias = "formats")]
    SyncFormats,

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}
