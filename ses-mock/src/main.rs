use anyhow::Context;
use clap::Parser;
use ses_mock::api::{ApiServer, AppState};
use ses_mock::config::{Config, LoggingConfig, StorageBackend};
use ses_mock::rate_limit::LimitSource;
use ses_mock::storage::{MemoryStorage, SqliteStorage, Storage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Mock cloud email-sending API
#[derive(Parser, Debug)]
#[command(name = "ses-mock", version, about)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen address
    #[arg(short, long)]
    listen: Option<String>,

    /// Override the database URL
    #[arg(long)]
    database_url: Option<String>,
}

fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("ses_mock={},tower_http=info", config.level))
    });
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match (&config.file, config.format.as_str()) {
        (Some(path), format) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            let writer = Arc::new(file);

            if format == "json" {
                builder.json().with_writer(writer).try_init()
            } else {
                builder.with_ansi(false).with_writer(writer).try_init()
            }
        }
        (None, "json") => builder.json().try_init(),
        (None, _) => builder.pretty().try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let dotenv = dotenvy::dotenv();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None if Path::new("config.toml").exists() => Config::from_file("config.toml")?,
        None => Config::default(),
    };

    if let Some(listen) = args.listen {
        config.server.listen_addr = listen;
    }
    if let Some(url) = args.database_url {
        config.storage.database_url = url;
    }

    init_logging(&config.logging)?;

    info!("Starting ses-mock v{}", env!("CARGO_PKG_VERSION"));
    if let Err(e) = dotenv {
        warn!("No .env file loaded: {}", e);
    }

    let limits = config.limit_source();
    info!("Configuration loaded");
    info!("  Listening on: {}", config.server.listen_addr);
    info!("  Storage backend: {:?}", config.storage.backend);
    info!("  Hourly send limit per sender: {}", limits.limit_per_hour());

    let storage: Arc<dyn Storage> = match config.storage.backend {
        StorageBackend::Sqlite => Arc::new(
            SqliteStorage::connect(&config.storage.database_url)
                .await
                .context("Failed to open database")?,
        ),
        StorageBackend::Memory => {
            warn!("Using in-memory storage; nothing survives a restart");
            Arc::new(MemoryStorage::new())
        }
    };

    let state = AppState::new(storage, limits, config.limits.release_expired_cooldowns);
    let server = ApiServer::new(state, config.server.listen_addr.clone());
    server.run().await?;

    Ok(())
}
