//! Request path resolution

use crate::{ApiError, GatewayErrorCode};

/// A file request split into bucket and file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPath {
    /// Everything before the last segment; may contain `/`
    pub bucket: String,
    /// The last path segment
    pub file_name: String,
}

impl RequestPath {
    /// Split a request path on `/`
    ///
    /// The last segment is the file name and every segment before it,
    /// rejoined and with leading slashes trimmed, is the bucket. Nothing
    /// else about the segments is validated here.
    pub fn parse(path: &str) -> Result<Self, ApiError> {
        let segments: Vec<&str> = path.split('/').collect();
        if segments.len() < 2 {
            return Err(ApiError::new(
                GatewayErrorCode::IllegalParameter,
                format!("path must contain a bucket and a file name: {:?}", path),
            ));
        }

        let (file_name, bucket) = segments
            .split_last()
            .ok_or_else(|| ApiError::new(GatewayErrorCode::IllegalParameter, "empty path"))?;

        Ok(Self {
            bucket: bucket.join("/").trim_start_matches('/').to_string(),
            file_name: file_name.to_string(),
        })
    }

    /// Metadata store key, `<bucket>/<file_name>`
    pub fn metadata_key(&self) -> String {
        fsg_storage::metadata_key(&self.bucket, &self.file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/photos/cat.png", "photos", "cat.png")]
    #[case("/a/b/c/report.pdf", "a/b/c", "report.pdf")]
    #[case("//double/x.gif", "double", "x.gif")]
    #[case("/only", "", "only")]
    #[case("bucket/file", "bucket", "file")]
    #[case("/bucket/", "bucket", "")]
    fn test_parse(#[case] input: &str, #[case] bucket: &str, #[case] file_name: &str) {
        let parsed = RequestPath::parse(input).unwrap();
        assert_eq!(parsed.bucket, bucket);
        assert_eq!(parsed.file_name, file_name);
    }

    #[rstest]
    #[case("")]
    #[case("no-slash")]
    fn test_parse_rejects_single_segment(#[case] input: &str) {
        let err = RequestPath::parse(input).unwrap_err();
        assert_eq!(err.error_code(), GatewayErrorCode::IllegalParameter);
    }

    #[test]
    fn test_metadata_key() {
        let parsed = RequestPath::parse("/a/b/c.txt").unwrap();
        assert_eq!(parsed.metadata_key(), "a/b/c.txt");
    }
}
