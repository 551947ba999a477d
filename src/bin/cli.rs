//! border-sync CLI
//!
//! Runs one incremental sync of MLTD ranking border data.

use std::path::PathBuf;

use border_sync::{
    error::{AppError, Result},
    models::{Config, StorageConfig, StorageMode},
    pipeline::{self, IncrementalWriter},
    services::MatsuriClient,
    storage::{Layout, LocalStorage, Storage},
};
use clap::{Parser, Subcommand, ValueEnum};

/// Incremental MLTD ranking border sync
#[derive(Parser, Debug)]
#[command(name = "border-sync", version, about = "Sync MLTD ranking borders")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Storage backend, overrides `storage.mode`
    #[arg(short, long, value_enum)]
    storage: Option<StorageArg>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch new events and border logs, then advance the watermark
    Sync,

    /// Validate the configuration file
    Validate,

    /// Show the persisted watermark
    Info,

    /// Copy every stored object into a local directory
    Mirror {
        /// Directory to download into
        #[arg(short, long, default_value = "r2data")]
        dest: PathBuf,

        /// Only copy keys starting with this prefix
        #[arg(short, long, default_value = "")]
        prefix: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StorageArg {
    Local,
    S3,
}

impl From<StorageArg> for StorageMode {
    fn from(arg: StorageArg) -> Self {
        match arg {
            StorageArg::Local => StorageMode::Local,
            StorageArg::S3 => StorageMode::S3,
        }
    }
}

/// Initialize logging; `RUST_LOG` wins over the configured level.
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

async fn build_storage(config: &StorageConfig) -> Result<Box<dyn Storage>> {
    match config.mode {
        StorageMode::Local => Ok(Box::new(LocalStorage::new(&config.root))),
        #[cfg(feature = "s3")]
        StorageMode::S3 => Ok(Box::new(
            border_sync::storage::S3Storage::from_env(config).await?,
        )),
        #[cfg(not(feature = "s3"))]
        StorageMode::S3 => Err(AppError::config(
            "s3 storage requires the `s3` feature",
        )),
    }
}

async fn run(cli: Cli, mut config: Config) -> Result<()> {
    if let Some(mode) = cli.storage {
        config.storage.mode = mode.into();
    }
    let layout = Layout::from_config(&config.storage);

    match cli.command {
        Command::Sync => {
            config.validate()?;
            let storage = build_storage(&config.storage).await?;
            storage.prepare(&layout).await?;

            let source = MatsuriClient::new(&config.api)?;
            pipeline::run_sync(&source, storage.as_ref(), &layout, &config.sync).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            config.validate()?;
            log::info!("Config OK: {}", cli.config.display());
        }

        Command::Info => {
            let storage = build_storage(&config.storage).await?;
            let writer = IncrementalWriter::new(storage.as_ref(), &layout);
            let watermark = writer.load_watermark().await?;

            log::info!(
                "Watermark location: {}",
                storage.location(&layout.watermark_key())
            );
            if watermark.is_empty() {
                log::info!("No event synced yet.");
            } else {
                log::info!("Last synced event: {}", watermark.event_id);
            }
            for (border, at) in &watermark.last_aggregated_at_by_border {
                log::info!("    border {}: {}", border, at.to_rfc3339());
            }

            let event_log = layout.event_log_key();
            if storage.exists(&event_log).await? {
                log::info!("Event log: exists ({})", storage.location(&event_log));
            } else {
                log::info!("Event log: not found");
            }
        }

        Command::Mirror { dest, prefix } => {
            let source = build_storage(&config.storage).await?;
            let dest = LocalStorage::new(dest);

            let stats = pipeline::mirror_objects(source.as_ref(), &dest, &prefix).await?;
            if stats.failed > 0 {
                log::warn!("{} objects could not be copied", stats.failed);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // read before logging is set up so the configured level applies
    let loaded = Config::load(&cli.config);
    let level = match (&loaded, cli.verbose) {
        (_, true) => "debug".to_string(),
        (Ok(config), false) => config.logging.level.clone(),
        (Err(_), false) => "info".to_string(),
    };
    init_logging(&level);

    let config = loaded.unwrap_or_else(|e: AppError| {
        log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            cli.config.display(),
            e
        );
        Config::default()
    });

    match run(cli, config).await {
        Ok(()) => log::info!("Job completed successfully"),
        Err(e) => {
            log::error!("Job failed: {}", e);
            std::process::exit(1);
        }
    }
}
