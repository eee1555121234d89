//! File metadata records

use crate::{Result, StorageError};
use serde::{Deserialize, Serialize};

/// Descriptive metadata for a stored file
///
/// Written by the upload path and read-only to the gateway. Stored as JSON
/// under the key `<bucket>/<file_name>`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMetadata {
    /// Checksum tag of the content
    #[serde(rename = "e_tag", alias = "e_tage")]
    pub etag: String,
    /// Custom header, e.g. `Content-Type:image/png`
    pub header: String,
    /// Size in bytes as recorded at upload time
    pub file_size: i64,
    /// Extension recorded at upload time
    pub file_extension: String,
}

impl FileMetadata {
    /// Create metadata with an etag and size
    pub fn new(etag: impl Into<String>, file_size: i64) -> Self {
        Self {
            etag: etag.into(),
            file_size,
            ..Default::default()
        }
    }

    /// Set the custom header
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    /// Set the file extension
    pub fn with_extension(mut self, ext: impl Into<String>) -> Self {
        self.file_extension = ext.into();
        self
    }

    /// Decode a stored value
    pub fn decode(key: &str, raw: &[u8]) -> Result<Self> {
        serde_json::from_slice(raw).map_err(|e| StorageError::MetadataCorrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Encode for storage
    pub fn encode(&self) -> Vec<u8> {
        // A struct of strings and integers always serializes
        serde_json::to_vec(self).unwrap_or_default()
    }
}

/// Build the metadata store key for a file
pub fn metadata_key(bucket: &str, file_name: &str) -> String {
    format!("{}/{}", bucket, file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_record() {
        let raw = br#"{"e_tag":"abc","header":"Content-Type:image/png","file_size":42,"file_extension":".png"}"#;
        let meta = FileMetadata::decode("b/f.png", raw).unwrap();
        assert_eq!(meta.etag, "abc");
        assert_eq!(meta.header, "Content-Type:image/png");
        assert_eq!(meta.file_size, 42);
        assert_eq!(meta.file_extension, ".png");
    }

    #[test]
    fn test_decode_legacy_etag_and_missing_fields() {
        let meta = FileMetadata::decode("b/f", br#"{"e_tage":"old"}"#).unwrap();
        assert_eq!(meta.etag, "old");
        assert!(meta.header.is_empty());
        assert_eq!(meta.file_size, 0);
    }

    #[test]
    fn test_decode_garbage_is_corrupt() {
        let err = FileMetadata::decode("b/f", b"not json").unwrap_err();
        assert!(matches!(err, StorageError::MetadataCorrupt { ref key, .. } if key == "b/f"));
    }

    #[test]
    fn test_metadata_key() {
        assert_eq!(metadata_key("a/b", "c.txt"), "a/b/c.txt");
    }
}
