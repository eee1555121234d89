//! Application state

use crate::coalesce::FetchCoalescer;
use crate::config::GatewayConfig;
use async_trait::async_trait;
use fsg_storage::{
    FileMetadata, LocalCache, MemoryFetcher, MemoryMetadataStore, MetadataStore, NodeConfig,
    NodeFetcher, RedisConfig, RedisMetadataStore, RemoteFetcher, StorageError,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared across handlers
pub struct AppState {
    /// Gateway configuration
    pub config: GatewayConfig,
    /// Metadata store (Redis or memory)
    pub metadata: Arc<dyn MetadataStore>,
    /// Storage node client used on cache misses
    pub remote: Arc<dyn RemoteFetcher>,
    /// Local file cache
    pub cache: LocalCache,
    /// In-flight fetch map, present when coalescing is enabled
    pub coalescer: Option<FetchCoalescer>,
}

impl AppState {
    /// Create application state, connecting backends from configuration
    pub async fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let (metadata, remote): (Arc<dyn MetadataStore>, Arc<dyn RemoteFetcher>) =
            if config.use_memory_store {
                info!("Using empty in-memory metadata store and node");
                let metadata: Arc<dyn MetadataStore> = Arc::new(MemoryMetadataStore::new());
                let remote: Arc<dyn RemoteFetcher> = Arc::new(MemoryFetcher::new());
                (metadata, remote)
            } else {
                let metadata: Arc<dyn MetadataStore> = match Self::connect_redis(&config).await {
                    Ok(store) => {
                        info!("Connected to metadata store at {}", config.redis_url);
                        Arc::new(store)
                    }
                    Err(e) => {
                        warn!(
                            "Failed to connect to metadata store ({}), every lookup will fail until restart",
                            e
                        );
                        Arc::new(UnavailableMetadataStore::new(e.to_string()))
                    }
                };

                let node = NodeFetcher::new(
                    NodeConfig::with_url(&config.node_url).with_timeout(config.remote_timeout()),
                )?;
                info!("Storage node: {}", config.node_url);

                let remote: Arc<dyn RemoteFetcher> = Arc::new(node);
                (metadata, remote)
            };

        Ok(Self::with_backends(config, metadata, remote))
    }

    /// Create application state around already constructed backends
    pub fn with_backends(
        config: GatewayConfig,
        metadata: Arc<dyn MetadataStore>,
        remote: Arc<dyn RemoteFetcher>,
    ) -> Self {
        let cache = LocalCache::new(&config.base_dir);
        info!("Local cache root: {}", cache.root().display());

        let coalescer = config.coalesce_fetches.then(FetchCoalescer::new);

        Self {
            config,
            metadata,
            remote,
            cache,
            coalescer,
        }
    }

    async fn connect_redis(config: &GatewayConfig) -> fsg_storage::Result<RedisMetadataStore> {
        let redis_config =
            RedisConfig::with_url(&config.redis_url).with_key_prefix(&config.redis_key_prefix);
        RedisMetadataStore::new(redis_config).await
    }
}

/// Metadata store standing in for one that could not be reached at startup
pub struct UnavailableMetadataStore {
    reason: String,
}

impl UnavailableMetadataStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl MetadataStore for UnavailableMetadataStore {
    async fn get(&self, _bucket: &str, _file_name: &str) -> fsg_storage::Result<FileMetadata> {
        Err(StorageError::MetadataUnavailable(self.reason.clone()))
    }
}
