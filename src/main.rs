use clap::Parser;
use reconcilarr::cli::{Cli, Commands};
use reconcilarr::{Config, run};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // init writes the file --config points at, so there is nothing to load yet
    let mut config = if cli.command == Commands::Init {
        Config::default()
    } else {
        Config::load(cli.config.as_deref())?
    };
    if let Some(dry_run) = cli.dry_run_override() {
        config.general.dry_run = dry_run;
    }
    let worker_threads = config.general.worker_threads;

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();

    if worker_threads > 0 {
        builder.worker_threads(worker_threads);
    }

    let runtime = builder.build()?;
    runtime.block_on(run(cli, config))
}
