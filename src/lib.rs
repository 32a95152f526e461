pub mod cli;
pub mod clients;
pub mod config;
pub mod domain;
pub mod formats;
pub mod providers;
pub mod reconcile;
pub mod report;
pub mod updates;

use std::io::IsTerminal;

use anyhow::Context;
use cli::{
    Cli, Commands, cmd_check_updates, cmd_init, cmd_jellyfin_cleanup, cmd_jellyseerr_cleanup,
    cmd_media_cleanup, cmd_sync_formats,
};
pub use config::Config;
use config::LogFormat;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    if cli.command == Commands::Init {
        return cmd_init(cli.config.as_deref());
    }

    config.validate()?;
    init_tracing(&config)?;
    config.log_origin();

    match cli.command {
        Commands::MediaCleanup => cmd_media_cleanup(&config).await,
        Commands::JellyfinCleanup => cmd_jellyfin_cleanup(&config).await,
        Commands::JellyseerrCleanup => cmd_jellyseerr_cleanup(&config).await,
        Commands::CheckUpdates => cmd_check_updates(&config).await,
        Commands::SyncFormats => cmd_sync_formats(&config).await,
        Commands::Init => Ok(()),
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let json = match config.general.log_format {
        LogFormat::Json => true,
        LogFormat::Pretty => false,
        LogFormat::Auto => !std::io::stdout().is_terminal(),
    };
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json());
    let pretty_layer = (!json).then(|| tracing_subscriber::fmt::layer());

    let loki_layer = if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder();
        for (key, value) in &config.observability.loki_labels {
            builder = builder.label(key.as_str(), value.as_str())?;
        }
        let (layer, task) = builder
            .extra_field("host", hostname())?
            .build_url(url)?;

        tokio::spawn(task);
        Some(layer)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .with(loki_layer)
        .init();

    if config.observability.loki_enabled {
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    }

    Ok(())
}

fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}
