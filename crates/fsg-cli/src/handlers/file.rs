//! File read-through handler
//!
//! Resolves `GET /<bucket...>/<file_name>` by loading metadata, serving the
//! local cached copy when present, and otherwise downloading from the
//! storage node, persisting the payload and returning it in one pass.

use crate::content_type::resolve_content_type;
use crate::path::RequestPath;
use crate::{ApiError, AppState, GatewayErrorCode};
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderName, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use fsg_storage::FileMetadata;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Response header carrying the metadata etag
pub const HEADER_ETAG: &str = "e_tag";
/// Response header carrying the raw custom header
pub const HEADER_CUSTOM: &str = "header_custom";
/// Response header carrying the recorded file size
pub const HEADER_FILE_SIZE: &str = "file_size";
/// Response header carrying the recorded file extension
pub const HEADER_FILE_EXTENSION: &str = "file_extension";

/// GET /{*path} - Serve a file from cache or storage node
pub async fn get_file(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    match serve_file(&state, uri.path()).await {
        Ok(response) => response,
        Err(e) => error_response(&state, e),
    }
}

/// HEAD /{*path} - Metadata headers only, never touches the storage node
pub async fn head_file(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    match describe_file(&state, uri.path()).await {
        Ok((_, headers)) => file_response(headers, Body::empty()),
        Err(e) => error_response(&state, e),
    }
}

/// Parse the path, load metadata and build the file headers
async fn describe_file(
    state: &AppState,
    raw_path: &str,
) -> Result<(RequestPath, Vec<(HeaderName, HeaderValue)>), ApiError> {
    let decoded = urlencoding::decode(raw_path).map_err(|_| {
        ApiError::new(GatewayErrorCode::IllegalParameter, "path is not valid UTF-8")
    })?;
    let request = RequestPath::parse(&decoded)?;

    let metadata = state
        .metadata
        .get(&request.bucket, &request.file_name)
        .await
        .map_err(|e| {
            warn!(key = %request.metadata_key(), error = %e, "Failed to load file metadata");
            ApiError::from(e)
        })?;

    let headers = file_headers(&metadata, &request.file_name);

    // Refuse names that would resolve outside the cache root.
    state.cache.path_for(&request.bucket, &request.file_name)?;

    Ok((request, headers))
}

/// Resolve a request path into a file response
pub async fn serve_file(state: &AppState, raw_path: &str) -> Result<Response, ApiError> {
    let (request, headers) = describe_file(state, raw_path).await?;

    if state.cache.exists(&request.bucket, &request.file_name).await {
        debug!(key = %request.metadata_key(), "Serving from local cache");
        return serve_cached(state, &request, headers).await;
    }

    fetch_from_node(state, &request, headers).await
}

/// Stream the cached copy
async fn serve_cached(
    state: &AppState,
    request: &RequestPath,
    headers: Vec<(HeaderName, HeaderValue)>,
) -> Result<Response, ApiError> {
    let stream = state
        .cache
        .open(&request.bucket, &request.file_name)
        .await
        .map_err(|e| {
            error!(key = %request.metadata_key(), error = %e, "Failed to open cached file");
            ApiError::from(e)
        })?;

    Ok(file_response(headers, Body::from_stream(stream)))
}

/// Download, persist and return a file missing from the cache
async fn fetch_from_node(
    state: &AppState,
    request: &RequestPath,
    headers: Vec<(HeaderName, HeaderValue)>,
) -> Result<Response, ApiError> {
    let key = request.metadata_key();

    let _guard = match &state.coalescer {
        Some(coalescer) => {
            let guard = coalescer.acquire(&key).await;
            // Another request may have filled the cache while we waited.
            if state.cache.exists(&request.bucket, &request.file_name).await {
                debug!(key = %key, "Cache filled by concurrent fetch");
                return serve_cached(state, request, headers).await;
            }
            Some(guard)
        }
        None => None,
    };

    let payload = state
        .remote
        .download(&request.bucket, &request.file_name)
        .await
        .map_err(|e| {
            warn!(key = %key, error = %e, "Storage node download failed");
            ApiError::from(e)
        })?;

    state
        .cache
        .write(&request.bucket, &request.file_name, &payload)
        .await
        .map_err(|e| {
            error!(key = %key, error = %e, "Failed to persist downloaded file");
            ApiError::from(e)
        })?;

    info!(key = %key, size = payload.len(), "Cached file from storage node");

    Ok(file_response(headers, Body::from(payload)))
}

/// Headers describing the file, derived from its metadata
///
/// Values that cannot be carried in a header are dropped.
pub fn file_headers(metadata: &FileMetadata, file_name: &str) -> Vec<(HeaderName, HeaderValue)> {
    let content_type = resolve_content_type(&metadata.header, file_name);
    let candidates = [
        (header::CONTENT_TYPE, content_type),
        (HeaderName::from_static(HEADER_ETAG), metadata.etag.clone()),
        (HeaderName::from_static(HEADER_CUSTOM), metadata.header.clone()),
        (
            HeaderName::from_static(HEADER_FILE_SIZE),
            metadata.file_size.to_string(),
        ),
        (
            HeaderName::from_static(HEADER_FILE_EXTENSION),
            metadata.file_extension.clone(),
        ),
    ];

    candidates
        .into_iter()
        .filter_map(|(name, value)| match HeaderValue::from_str(&value) {
            Ok(value) => Some((name, value)),
            Err(_) => {
                warn!(header = %name, "Dropping header with invalid value");
                None
            }
        })
        .collect()
}

fn file_response(headers: Vec<(HeaderName, HeaderValue)>, body: Body) -> Response {
    let mut response = (StatusCode::OK, body).into_response();
    response.headers_mut().extend(headers);
    response
}

/// Render an error, keeping status 200 when legacy status mode is on
pub fn error_response(state: &AppState, err: ApiError) -> Response {
    let mut response = err.into_response();
    if state.config.legacy_status {
        *response.status_mut() = StatusCode::OK;
    }
    response
}
