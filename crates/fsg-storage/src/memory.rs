//! In-memory metadata store and remote fetcher for testing and development

use crate::metadata::{metadata_key, FileMetadata};
use crate::{MetadataStore, RemoteFetcher, Result, StorageError};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// An in-memory metadata store holding raw JSON values
#[derive(Clone, Default)]
pub struct MemoryMetadataStore {
    entries: Arc<DashMap<String, Vec<u8>>>,
}

impl MemoryMetadataStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store metadata for a file
    pub fn insert(&self, bucket: &str, file_name: &str, metadata: &FileMetadata) {
        self.entries
            .insert(metadata_key(bucket, file_name), metadata.encode());
    }

    /// Store a raw value, bypassing encoding
    pub fn insert_raw(&self, bucket: &str, file_name: &str, raw: impl Into<Vec<u8>>) {
        self.entries.insert(metadata_key(bucket, file_name), raw.into());
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn get(&self, bucket: &str, file_name: &str) -> Result<FileMetadata> {
        let key = metadata_key(bucket, file_name);
        let raw = self
            .entries
            .get(&key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StorageError::MetadataNotFound(key.clone()))?;
        FileMetadata::decode(&key, &raw)
    }
}

/// An in-memory stand-in for a storage node
///
/// Counts download calls so callers can assert how often the remote was hit.
#[derive(Clone, Default)]
pub struct MemoryFetcher {
    files: Arc<DashMap<String, Bytes>>,
    downloads: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl MemoryFetcher {
    /// Create a new empty fetcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep before answering each download
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make a file available for download
    pub fn insert(&self, bucket: &str, file_name: &str, content: impl Into<Bytes>) {
        self.files
            .insert(metadata_key(bucket, file_name), content.into());
    }

    /// Number of download calls served so far, including failures
    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteFetcher for MemoryFetcher {
    async fn download(&self, bucket: &str, file_name: &str) -> Result<Bytes> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let key = metadata_key(bucket, file_name);
        self.files
            .get(&key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StorageError::DownloadFailed(format!("file not found on node: {}", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_metadata_roundtrip() {
        let store = MemoryMetadataStore::new();
        let meta = FileMetadata::new("etag-1", 12).with_header("Content-Type:text/plain");
        store.insert("docs", "a.txt", &meta);

        assert_eq!(store.get("docs", "a.txt").await.unwrap(), meta);
    }

    #[tokio::test]
    async fn test_memory_metadata_not_found() {
        let store = MemoryMetadataStore::new();
        let result = store.get("docs", "missing.txt").await;
        assert!(matches!(result, Err(StorageError::MetadataNotFound(ref k)) if k == "docs/missing.txt"));
    }

    #[tokio::test]
    async fn test_memory_metadata_corrupt() {
        let store = MemoryMetadataStore::new();
        store.insert_raw("docs", "bad.txt", "{not json");
        let result = store.get("docs", "bad.txt").await;
        assert!(matches!(result, Err(StorageError::MetadataCorrupt { .. })));
    }

    #[tokio::test]
    async fn test_memory_fetcher_counts_calls() {
        let fetcher = MemoryFetcher::new();
        fetcher.insert("b", "f.bin", Bytes::from_static(b"payload"));

        assert_eq!(fetcher.download("b", "f.bin").await.unwrap().as_ref(), b"payload");
        assert!(fetcher.download("b", "other.bin").await.is_err());
        assert_eq!(fetcher.download_count(), 2);
    }
}
