//! Redis-backed metadata store

use crate::metadata::{metadata_key, FileMetadata};
use crate::{MetadataStore, Result, StorageError};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::instrument;

/// Configuration for the Redis metadata store
#[derive(Clone, Debug)]
pub struct RedisConfig {
    /// Connection URL (e.g., "redis://127.0.0.1:6379/0")
    pub url: String,
    /// Prefix prepended to every key
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: String::new(),
        }
    }
}

impl RedisConfig {
    /// Create with a custom URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }
}

/// Metadata store reading JSON values from Redis
#[derive(Clone)]
pub struct RedisMetadataStore {
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisMetadataStore {
    /// Connect to Redis
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| StorageError::Configuration(format!("invalid redis url: {}", e)))?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self {
            conn,
            key_prefix: config.key_prefix,
        })
    }

    fn build_key(&self, bucket: &str, file_name: &str) -> String {
        format!("{}{}", self.key_prefix, metadata_key(bucket, file_name))
    }
}

#[async_trait]
impl MetadataStore for RedisMetadataStore {
    #[instrument(skip(self))]
    async fn get(&self, bucket: &str, file_name: &str) -> Result<FileMetadata> {
        let key = self.build_key(bucket, file_name);
        let mut conn = self.conn.clone();
        let raw: Option<Vec<u8>> = conn.get(&key).await?;
        match raw {
            Some(raw) => FileMetadata::decode(&key, &raw),
            None => Err(StorageError::MetadataNotFound(key)),
        }
    }
}
