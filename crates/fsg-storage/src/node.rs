//! HTTP client for remote storage nodes

use crate::{RemoteFetcher, Result, StorageError};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

/// Configuration for the storage node connection
#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// Storage node base URL (e.g., "http://localhost:9100")
    pub node_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_url: "http://localhost:9100".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl NodeConfig {
    /// Create with a custom node URL
    pub fn with_url(node_url: impl Into<String>) -> Self {
        Self {
            node_url: node_url.into(),
            ..Default::default()
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Download request sent to the storage node
#[derive(Debug, Serialize)]
pub struct DownloadInfo<'a> {
    /// Whether the caller already holds the file
    pub exist: bool,
    pub bucket: &'a str,
    pub file_name: &'a str,
}

/// Download response from the storage node
#[derive(Debug, Deserialize)]
pub struct DownloadResponse {
    pub chunk: Chunk,
}

/// File content chunk, base64 encoded on the wire
#[derive(Debug, Deserialize)]
pub struct Chunk {
    #[serde(default)]
    pub content: String,
}

/// Remote fetcher calling a storage node's download endpoint
#[derive(Clone)]
pub struct NodeFetcher {
    client: Client,
    config: NodeConfig,
}

impl NodeFetcher {
    /// Create a new node client
    pub fn new(config: NodeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StorageError::Configuration(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create from URL string
    pub fn from_url(url: &str) -> Result<Self> {
        Self::new(NodeConfig::with_url(url))
    }

    fn download_url(&self) -> String {
        format!("{}/download", self.config.node_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl RemoteFetcher for NodeFetcher {
    #[instrument(skip(self))]
    async fn download(&self, bucket: &str, file_name: &str) -> Result<Bytes> {
        let request = DownloadInfo {
            exist: false,
            bucket,
            file_name,
        };

        let response = self
            .client
            .post(self.download_url())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(StorageError::DownloadFailed(format!(
                "node returned {}: {}",
                status, error
            )));
        }

        let body: DownloadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::DownloadFailed(format!("invalid response: {}", e)))?;

        let content = general_purpose::STANDARD
            .decode(body.chunk.content.as_bytes())
            .map_err(|e| StorageError::DownloadFailed(format!("invalid content encoding: {}", e)))?;

        Ok(Bytes::from(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_download_decodes_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/download"))
            .and(body_json(serde_json::json!({
                "exist": false,
                "bucket": "photos/2024",
                "file_name": "cat.png",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "chunk": { "content": general_purpose::STANDARD.encode(b"meow") }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = NodeFetcher::from_url(&server.uri()).unwrap();
        let data = fetcher.download("photos/2024", "cat.png").await.unwrap();
        assert_eq!(data.as_ref(), b"meow");
    }

    #[tokio::test]
    async fn test_download_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/download"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let fetcher = NodeFetcher::from_url(&server.uri()).unwrap();
        let err = fetcher.download("b", "f").await.unwrap_err();
        assert!(matches!(err, StorageError::DownloadFailed(ref msg) if msg.contains("boom")));
    }

    #[tokio::test]
    async fn test_download_bad_base64() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/download"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "chunk": { "content": "***" }
            })))
            .mount(&server)
            .await;

        let fetcher = NodeFetcher::from_url(&server.uri()).unwrap();
        assert!(matches!(
            fetcher.download("b", "f").await,
            Err(StorageError::DownloadFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_download_unreachable_node() {
        let fetcher = NodeFetcher::new(
            NodeConfig::with_url("http://127.0.0.1:1").with_timeout(Duration::from_secs(2)),
        )
        .unwrap();
        assert!(matches!(
            fetcher.download("b", "f").await,
            Err(StorageError::DownloadFailed(_))
        ));
    }
}
