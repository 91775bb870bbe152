//! HTTP request handlers for the image gateway.
//!
//! # Endpoints
//!
//! - `GET /healthz` - Readiness probe (public)
//! - `GET /livez` - Liveness probe (public)
//! - `GET /list` - List stored images
//! - `POST /upload` - Upload an image (multipart field `file`)
//! - `GET /images/{filename}` - Stream a stored image
//!
//! Everything except the probes runs behind the auth middleware in
//! [`super::pipeline`], so the handlers here only see authorized requests.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info, warn};

use crate::auth::CredentialVerifier;
use crate::error::{GatewayError, StoreError};
use crate::media::{generate_object_key, resolve_content_type};
use crate::store::{ImageSummary, ObjectStore};

/// Name of the multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "file";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state, built once at startup.
///
/// Holds the object store and the credential verifier. Both are behind `Arc`
/// so cloning the state per request is cheap.
pub struct AppState<S: ObjectStore, V: CredentialVerifier> {
    /// Object store holding the images
    pub store: Arc<S>,

    /// Verifier consulted for every protected request
    pub verifier: Arc<V>,
}

impl<S: ObjectStore, V: CredentialVerifier> AppState<S, V> {
    /// Create a new application state.
    pub fn new(store: S, verifier: V) -> Self {
        Self {
            store: Arc::new(store),
            verifier: Arc::new(verifier),
        }
    }
}

impl<S: ObjectStore, V: CredentialVerifier> Clone for AppState<S, V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            verifier: Arc::clone(&self.verifier),
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
///
/// `detail` is the field clients display to users.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "missing_token", "not_found")
    pub error: String,

    /// Human-readable error detail
    pub detail: String,

    /// HTTP status code (included for convenience)
    pub status: u16,
}

impl ErrorResponse {
    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        detail: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            detail: detail.into(),
            status: status.as_u16(),
        }
    }
}

/// Health and liveness probe response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Probe status ("ok" or "alive")
    pub status: String,

    /// Service version
    pub version: String,
}

/// Response from the list endpoint.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    /// Every object in the bucket
    pub images: Vec<ImageSummary>,

    /// Number of entries in `images`
    pub count: usize,
}

/// Response from the upload endpoint.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Fixed confirmation message
    pub message: String,

    /// Generated object key (`<uuid>_<original name>`)
    pub filename: String,

    /// Number of bytes stored
    pub size: u64,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert GatewayError to HTTP response.
///
/// Only a short fixed detail reaches the client; store error details are
/// logged at ERROR level alongside the 5xx status.
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, error_type, detail) = match &self {
            GatewayError::MissingCredential => (
                StatusCode::UNAUTHORIZED,
                "missing_token",
                "Missing token".to_string(),
            ),
            GatewayError::InvalidCredential => (
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Invalid token".to_string(),
            ),
            GatewayError::AuthUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "auth_unavailable",
                "Auth service unavailable".to_string(),
            ),
            GatewayError::InvalidUpload(reason) => {
                (StatusCode::BAD_REQUEST, "invalid_upload", reason.clone())
            }
            GatewayError::UploadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
                "Upload exceeds the size limit".to_string(),
            ),
            GatewayError::Store(store_err) => match store_err {
                StoreError::NotFound(key) => (
                    StatusCode::NOT_FOUND,
                    "not_found",
                    format!("Image not found: {}", key),
                ),
                StoreError::Write(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "upload_failed",
                    "Upload failed".to_string(),
                ),
                StoreError::Read(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "read_failed",
                    "Failed to read image".to_string(),
                ),
                StoreError::List(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "list_failed",
                    "Failed to list images".to_string(),
                ),
                StoreError::Bucket(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_error",
                    "Storage unavailable".to_string(),
                ),
            },
        };

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                self
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                detail
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                detail
            );
        }

        let error_response = ErrorResponse::with_status(error_type, detail, status);
        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle readiness probes.
///
/// `GET /healthz` → `200 {"status": "ok", "version": "..."}`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle liveness probes.
///
/// `GET /livez` → `200 {"status": "alive", "version": "..."}`
pub async fn liveness_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "alive".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle list requests.
///
/// # Endpoint
///
/// `GET /list`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "images": [
///     {"filename": "<uuid>_cat.png", "size": 1024, "last_modified": "2024-05-01T10:00:00Z"}
///   ],
///   "count": 1
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `503 Service Unavailable`: Auth service unreachable
/// - `500 Internal Server Error`: Storage error
pub async fn list_handler<S: ObjectStore, V: CredentialVerifier>(
    State(state): State<AppState<S, V>>,
) -> Result<Json<ListResponse>, GatewayError> {
    let images = state.store.list().await?;
    let count = images.len();

    Ok(Json(ListResponse { images, count }))
}

/// Handle image uploads.
///
/// # Endpoint
///
/// `POST /upload` with a `multipart/form-data` body containing a `file`
/// field. The field's file name becomes the suffix of the generated key.
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {"message": "Uploaded successfully", "filename": "<uuid>_cat.png", "size": 1024}
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Not a multipart body, no `file` field, or no file name
/// - `401 Unauthorized`: Missing or invalid token
/// - `413 Payload Too Large`: Body exceeds the configured upload limit
/// - `503 Service Unavailable`: Auth service unreachable
/// - `500 Internal Server Error`: Storage error
pub async fn upload_handler<S: ObjectStore, V: CredentialVerifier>(
    State(state): State<AppState<S, V>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, GatewayError> {
    let multipart =
        multipart.map_err(|rejection| GatewayError::InvalidUpload(rejection.body_text()))?;

    let (file_name, data) = read_upload_field(multipart).await?;

    let key = generate_object_key(&file_name);
    let size = state.store.put(&key, data).await?;

    info!(key = %key, size = size, "Image uploaded");

    Ok(Json(UploadResponse {
        message: "Uploaded successfully".to_string(),
        filename: key,
        size,
    }))
}

/// Read the first `file` field of a multipart body into memory.
///
/// Returns the client-supplied file name and the field contents.
async fn read_upload_field(mut multipart: Multipart) -> Result<(String, Bytes), GatewayError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return Err(GatewayError::InvalidUpload(
                    "Missing file name".to_string(),
                ))
            }
        };

        let data = field.bytes().await.map_err(multipart_error)?;
        return Ok((file_name, data));
    }

    Err(GatewayError::InvalidUpload("No file uploaded".to_string()))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> GatewayError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        GatewayError::UploadTooLarge
    } else {
        GatewayError::InvalidUpload(err.body_text())
    }
}

/// Handle image retrieval.
///
/// # Endpoint
///
/// `GET /images/{filename}` where `filename` is an object key as returned by
/// the upload or list endpoints.
///
/// # Response
///
/// `200 OK` streaming the object body.
///
/// # Headers
///
/// - `Content-Type`: resolved from the key's extension
/// - `Content-Disposition: inline; filename="{filename}"`
/// - `Content-Length`: when the store reports it
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `404 Not Found`: No object under this key
/// - `503 Service Unavailable`: Auth service unreachable
/// - `500 Internal Server Error`: Storage error
pub async fn image_handler<S: ObjectStore, V: CredentialVerifier>(
    State(state): State<AppState<S, V>>,
    Path(filename): Path<String>,
) -> Result<Response, GatewayError> {
    let object = state.store.get(&filename).await?;

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, resolve_content_type(&filename));

    // Keys carry the client's original name, which may not be a valid header value
    match HeaderValue::from_bytes(format!("inline; filename=\"{}\"", filename).as_bytes()) {
        Ok(value) => builder = builder.header(header::CONTENT_DISPOSITION, value),
        Err(_) => debug!(key = %filename, "Key is not a valid header value, omitting Content-Disposition"),
    }

    if let Some(len) = object.content_length {
        builder = builder.header(header::CONTENT_LENGTH, len);
    }

    let body = Body::from_stream(ReaderStream::new(object.body.into_async_read()));

    builder
        .body(body)
        .map_err(|e| GatewayError::Store(StoreError::Read(e.to_string())))
}

// =============================================================================
// Tests
// =============================================================================
