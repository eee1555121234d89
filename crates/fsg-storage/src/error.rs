//! Error types for the fsg-storage crate

use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur while resolving file metadata or content
#[derive(Error, Debug)]
pub enum StorageError {
    /// Metadata key is absent from the store
    #[error("metadata not found: {0}")]
    MetadataNotFound(String),

    /// Metadata store is unreachable or not configured
    #[error("metadata store unavailable: {0}")]
    MetadataUnavailable(String),

    /// Stored metadata value could not be decoded
    #[error("metadata corrupt for {key}: {reason}")]
    MetadataCorrupt { key: String, reason: String },

    /// Cached file could not be opened
    #[error("failed to open {path}: {source}")]
    FileOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Cached file failed while being read
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Cache file could not be created
    #[error("failed to create {path}: {source}")]
    FileCreate {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Cache file could not be written
    #[error("failed to write {path}: {source}")]
    FileWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Storage node download failed
    #[error("download failed: {0}")]
    DownloadFailed(String),

    /// Path segment would escape the cache root
    #[error("illegal path: {0}")]
    IllegalPath(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StorageError::DownloadFailed(format!("request timed out: {}", err))
        } else if err.is_connect() {
            StorageError::DownloadFailed(format!("connection error: {}", err))
        } else {
            StorageError::DownloadFailed(err.to_string())
        }
    }
}

impl From<redis::RedisError> for StorageError {
    fn from(err: redis::RedisError) -> Self {
        StorageError::MetadataUnavailable(err.to_string())
    }
}
