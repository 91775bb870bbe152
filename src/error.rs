use thiserror::Error;

/// Errors reported by the object store layer.
///
/// Every SDK failure is normalized into one of these kinds at the point where
/// it occurs, so callers never inspect raw S3 errors.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The requested key does not exist in the bucket
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Writing an object failed
    #[error("Write failed: {0}")]
    Write(String),

    /// Reading an object failed for a reason other than a missing key
    #[error("Read failed: {0}")]
    Read(String),

    /// Listing the bucket failed
    #[error("List failed: {0}")]
    List(String),

    /// The bucket could not be checked or created
    #[error("Bucket provisioning failed: {0}")]
    Bucket(String),
}

/// Errors surfaced to clients by the request pipeline.
///
/// Each variant maps to exactly one HTTP status (see the `IntoResponse`
/// implementation in the server layer).
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// No usable `Authorization` header on the request
    #[error("Missing token")]
    MissingCredential,

    /// The auth collaborator answered with a non-200 status
    #[error("Invalid token")]
    InvalidCredential,

    /// The auth collaborator timed out or could not be reached
    #[error("Auth service unavailable")]
    AuthUnavailable,

    /// The upload request body was not a usable multipart form
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    /// The upload body exceeded the configured size limit
    #[error("Upload exceeds the size limit")]
    UploadTooLarge,

    /// An object store operation failed
    #[error(transparent)]
    Store(#[from] StoreError),
}
