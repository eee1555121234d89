//! Gateway configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix for configuration environment variables (`FSG_PORT`, ...)
pub const ENV_PREFIX: &str = "FSG";

/// Gateway server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Base directory; cached files live under `<base_dir>/data`
    pub base_dir: PathBuf,
    /// Redis URL for the metadata store
    pub redis_url: String,
    /// Prefix prepended to metadata keys
    pub redis_key_prefix: String,
    /// Storage node URL used on cache misses
    pub node_url: String,
    /// Storage node request timeout (seconds)
    pub remote_timeout_secs: u64,
    /// Use in-memory metadata and node backends (for testing/development)
    pub use_memory_store: bool,
    /// Share one remote fetch between concurrent misses of the same file
    pub coalesce_fetches: bool,
    /// Answer logical errors with status 200, as older clients expect
    pub legacy_status: bool,
    /// Rate limit (requests per second per client, 0 disables)
    pub rate_limit_rps: u32,
    /// Enable CORS
    pub cors_enabled: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            base_dir: default_base_dir(),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            redis_key_prefix: String::new(),
            node_url: "http://localhost:9100".to_string(),
            remote_timeout_secs: 30,
            use_memory_store: false,
            coalesce_fetches: false,
            legacy_status: false,
            rate_limit_rps: 0,
            cors_enabled: true,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from defaults, an optional file and `FSG_*` env vars
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder =
            ::config::Config::builder().add_source(::config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }

        let settings = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Storage node request timeout
    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }
}

/// Directory holding the running executable, or the working directory
fn default_base_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}
