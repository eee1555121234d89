//! File Gateway - read-through file server

use clap::Parser;
use fsg_cli::{run_server_with_shutdown, server::shutdown_signal, GatewayConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "file-gateway")]
#[command(about = "Read-through gateway serving cached files with storage node fallback")]
#[command(version)]
struct Args {
    /// Configuration file (toml, yaml or json)
    #[arg(short, long, env = "FSG_CONFIG")]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Base directory for the local cache (files go under <base-dir>/data)
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Redis URL of the metadata store
    #[arg(long)]
    redis_url: Option<String>,

    /// Storage node URL
    #[arg(long)]
    node_url: Option<String>,

    /// Use empty in-memory metadata and node backends. Nothing can be added at
    /// runtime, so only health checks succeed; every file request answers
    /// ErrorGetFileMetadata. Meant for smoke-testing the server itself
    #[arg(long)]
    memory_store: bool,

    /// Share one storage node fetch between concurrent misses of a file
    #[arg(long)]
    coalesce: bool,

    /// Answer logical errors with status 200
    #[arg(long)]
    legacy_status: bool,

    /// Enable debug logging
    #[arg(short, long, env = "FSG_DEBUG")]
    debug: bool,

    /// Emit logs as JSON
    #[arg(long, env = "FSG_JSON_LOGS")]
    json_logs: bool,
}

impl Args {
    fn apply(self, mut config: GatewayConfig) -> GatewayConfig {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(base_dir) = self.base_dir {
            config.base_dir = base_dir;
        }
        if let Some(redis_url) = self.redis_url {
            config.redis_url = redis_url;
        }
        if let Some(node_url) = self.node_url {
            config.node_url = node_url;
        }
        config.use_memory_store |= self.memory_store;
        config.coalesce_fetches |= self.coalesce;
        config.legacy_status |= self.legacy_status;
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "fsg_cli={0},fsg_storage={0},tower_http=debug",
            log_level
        )
        .into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if args.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let config = GatewayConfig::load(args.config.as_deref())?;
    let config = args.apply(config);

    tracing::info!("Starting file gateway on {}:{}", config.host, config.port);
    tracing::info!("Cache directory: {}", config.base_dir.join("data").display());

    if config.use_memory_store {
        tracing::warn!("Using empty in-memory backends - file requests will fail metadata lookup");
    } else {
        tracing::info!("Metadata store: {}", config.redis_url);
        tracing::info!("Storage node: {}", config.node_url);
    }

    if config.coalesce_fetches {
        tracing::info!("Concurrent cache misses will share one node fetch");
    }

    if config.legacy_status {
        tracing::warn!("Legacy status mode: errors are answered with status 200");
    }

    run_server_with_shutdown(config, shutdown_signal()).await
}
