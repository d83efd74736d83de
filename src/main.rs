//! album-sync: mirror public shared albums into a self-hosted library.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use core_runtime::config::AppConfig;
use core_runtime::logging::{init_logging, redact_if_sensitive, LogFormat, LoggingConfig};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "album-sync")]
#[command(about = "Mirror shared photo albums into Immich")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "ALBUM_SYNC_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Run one pass per album and exit
    #[arg(long)]
    once: bool,

    /// Log output format: pretty, compact or json
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// Verbose logging (same as `debug = true` in the config file)
    #[arg(long)]
    debug: bool,

    /// Explicit tracing filter, e.g. `core_sync=trace,provider_immich=debug`.
    /// Takes precedence over `RUST_LOG`.
    #[arg(long)]
    log_filter: Option<String>,
}

impl Cli {
    fn logging(&self, debug: bool) -> LoggingConfig {
        let config = LoggingConfig::default()
            .with_format(self.log_format.unwrap_or_default())
            .with_debug(debug);
        match &self.log_filter {
            Some(filter) => config.with_filter(filter.as_str()).with_env_filter(false),
            None => config,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    config
        .apply_env_overrides()
        .context("Invalid environment override")?;
    config.debug |= cli.debug;

    init_logging(cli.logging(config.debug))?;

    info!(
        config_file = %cli.config.display(),
        albums = config.albums.len(),
        workers = config.workers,
        api_url = %config.destination.api_url,
        api_key = %redact_if_sensitive("api_key", &config.destination.api_key),
        "Configuration loaded"
    );

    let service = core_service::bootstrap(config).context("Failed to start")?;

    if cli.once {
        let results = service.run_once().await?;
        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            bail!("{} of {} albums failed to sync", failed, results.len());
        }
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                return;
            }
            info!("Shutdown signal received, finishing running passes");
            shutdown.cancel();
        });
    }

    service.run(shutdown).await?;
    info!("Stopped");
    Ok(())
}
