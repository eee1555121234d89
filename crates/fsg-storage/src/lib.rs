//! # FSG Storage
//!
//! Storage layer for the file server gateway.
//!
//! This crate provides:
//! - **Metadata**: `FileMetadata` records kept in a key-value store (Redis)
//! - **Local cache**: On-disk copies of files under `<base_dir>/data`
//! - **Remote fetch**: Download client for the storage nodes holding the
//!   authoritative bytes
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             Gateway Handler             │
//! ├─────────────┬─────────────┬─────────────┤
//! │ MetadataStore│  LocalCache │RemoteFetcher│
//! ├─────────────┼─────────────┼─────────────┤
//! │    Redis    │  Local disk │ Storage node│
//! └─────────────┴─────────────┴─────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use fsg_storage::{LocalCache, NodeFetcher, RemoteFetcher};
//!
//! let cache = LocalCache::new("/srv/gateway");
//! let node = NodeFetcher::from_url("http://storage-node:9100")?;
//! if !cache.exists("photos", "cat.png").await {
//!     let data = node.download("photos", "cat.png").await?;
//!     cache.write("photos", "cat.png", &data).await?;
//! }
//! ```

pub mod cache;
pub mod error;
pub mod memory;
pub mod metadata;
pub mod node;
pub mod redis_store;

pub use cache::{ByteStream, LocalCache};
pub use error::{Result, StorageError};
pub use memory::{MemoryFetcher, MemoryMetadataStore};
pub use metadata::{metadata_key, FileMetadata};
pub use node::{NodeConfig, NodeFetcher};
pub use redis_store::{RedisConfig, RedisMetadataStore};

use async_trait::async_trait;
use bytes::Bytes;

/// Trait for metadata store backends
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Look up metadata stored under `bucket/file_name`
    ///
    /// A missing key is `MetadataNotFound`, an unreachable store is
    /// `MetadataUnavailable` and an undecodable value is `MetadataCorrupt`.
    async fn get(&self, bucket: &str, file_name: &str) -> Result<FileMetadata>;
}

/// Trait for fetching file content from a remote storage node
///
/// Implementations do not retry. Dropping the returned future abandons the
/// request.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Download the full content of `bucket/file_name`
    async fn download(&self, bucket: &str, file_name: &str) -> Result<Bytes>;
}
