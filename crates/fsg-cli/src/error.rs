//! Error types and gateway error codes

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fsg_storage::StorageError;
use serde::Serialize;
use thiserror::Error;

/// Gateway error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorCode {
    InternalError,
    IllegalParameter,
    SlowDown,
    ErrorGetFileMetadata,
    ErrorFileOpen,
    ErrorFileRead,
    ErrorDownloadFile,
    ErrorCreateFile,
    ErrorWriteFile,
}

impl GatewayErrorCode {
    /// Get the error name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InternalError => "InternalError",
            Self::IllegalParameter => "IllegalParameter",
            Self::SlowDown => "SlowDown",
            Self::ErrorGetFileMetadata => "ErrorGetFileMetadata",
            Self::ErrorFileOpen => "ErrorFileOpen",
            Self::ErrorFileRead => "ErrorFileRead",
            Self::ErrorDownloadFile => "ErrorDownloadFile",
            Self::ErrorCreateFile => "ErrorCreateFile",
            Self::ErrorWriteFile => "ErrorWriteFile",
        }
    }

    /// Get the numeric code used in the JSON envelope
    pub fn code(&self) -> u32 {
        match self {
            Self::InternalError => 10000,
            Self::IllegalParameter => 10001,
            Self::SlowDown => 10002,
            Self::ErrorGetFileMetadata => 20001,
            Self::ErrorFileOpen => 20002,
            Self::ErrorFileRead => 20003,
            Self::ErrorDownloadFile => 20004,
            Self::ErrorCreateFile => 20005,
            Self::ErrorWriteFile => 20006,
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::IllegalParameter => StatusCode::BAD_REQUEST,
            Self::SlowDown => StatusCode::TOO_MANY_REQUESTS,
            Self::ErrorGetFileMetadata
            | Self::ErrorFileOpen
            | Self::ErrorFileRead
            | Self::ErrorDownloadFile => StatusCode::NOT_FOUND,
            Self::InternalError | Self::ErrorCreateFile | Self::ErrorWriteFile => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{}: {message}", .code.as_str())]
    Gateway {
        code: GatewayErrorCode,
        message: String,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Create a new gateway error
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self::Gateway {
            code,
            message: message.into(),
        }
    }

    /// Get the error code
    pub fn error_code(&self) -> GatewayErrorCode {
        match self {
            Self::Gateway { code, .. } => *code,
            Self::Internal(_) => GatewayErrorCode::InternalError,
            Self::Storage(e) => match e {
                StorageError::MetadataNotFound(_)
                | StorageError::MetadataUnavailable(_)
                | StorageError::MetadataCorrupt { .. } => GatewayErrorCode::ErrorGetFileMetadata,
                StorageError::FileOpen { .. } => GatewayErrorCode::ErrorFileOpen,
                StorageError::FileRead { .. } => GatewayErrorCode::ErrorFileRead,
                StorageError::FileCreate { .. } => GatewayErrorCode::ErrorCreateFile,
                StorageError::FileWrite { .. } => GatewayErrorCode::ErrorWriteFile,
                StorageError::DownloadFailed(_) => GatewayErrorCode::ErrorDownloadFile,
                StorageError::IllegalPath(_) => GatewayErrorCode::IllegalParameter,
                StorageError::Configuration(_) => GatewayErrorCode::InternalError,
            },
        }
    }

    /// Detail string carried in the envelope's `data` field
    pub fn detail(&self) -> String {
        match self {
            Self::Gateway { message, .. } => message.clone(),
            Self::Storage(e) => e.to_string(),
            Self::Internal(msg) => msg.clone(),
        }
    }
}

/// JSON body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub code: u32,
    pub message: &'static str,
    pub data: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.error_code();
        let envelope = ErrorEnvelope {
            code: code.code(),
            message: code.as_str(),
            data: self.detail(),
        };

        (
            code.status_code(),
            [("x-error-code", code.as_str())],
            Json(envelope),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_errors_collapse() {
        let errors = [
            StorageError::MetadataNotFound("b/f".into()),
            StorageError::MetadataUnavailable("down".into()),
            StorageError::MetadataCorrupt {
                key: "b/f".into(),
                reason: "eof".into(),
            },
        ];
        for e in errors {
            let api = ApiError::from(e);
            assert_eq!(api.error_code(), GatewayErrorCode::ErrorGetFileMetadata);
            assert_eq!(api.error_code().status_code(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn test_download_failure_code() {
        let api = ApiError::from(StorageError::DownloadFailed("timeout".into()));
        assert_eq!(api.error_code(), GatewayErrorCode::ErrorDownloadFile);
        assert_eq!(api.detail(), "download failed: timeout");
    }

    #[test]
    fn test_illegal_path_maps_to_bad_request() {
        let api = ApiError::from(StorageError::IllegalPath("../x".into()));
        assert_eq!(api.error_code().status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_envelope_response() {
        let response = ApiError::new(GatewayErrorCode::IllegalParameter, "bad path").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()["x-error-code"], "IllegalParameter");
        assert_eq!(response.headers()["content-type"], "application/json");
    }
}
