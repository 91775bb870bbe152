//! # Image Gateway
//!
//! An authenticated gateway for images stored in S3-compatible object storage.
//!
//! Clients upload, list and fetch images through this service instead of
//! talking to the bucket directly. The gateway holds the storage credentials
//! and delegates every credential check to an external auth service.
//!
//! ## Features
//!
//! - **Delegated auth**: Each protected request is verified against the auth
//!   service's `/verify` endpoint, with a bounded timeout and no caching
//! - **Collision-free keys**: Uploads are stored as `<uuid-v4>_<file name>`
//! - **Streaming retrieval**: Objects are streamed from the store with a
//!   content type derived from the key's extension
//! - **Startup provisioning**: The bucket is created if missing
//!
//! ## Architecture
//!
//! - [`media`] - Key generation and content type resolution
//! - [`auth`] - Credential verification against the auth service
//! - [`store`] - Object store contract and S3 implementation
//! - [`server`] - Axum handlers, auth pipeline and router
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use image_gateway::{create_router, create_s3_client, HttpAuthGate, RouterConfig, S3ObjectStore};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = create_s3_client("minio:9000", "us-east-1", "access", "secret").await;
//!     let store = S3ObjectStore::new(client, "images", "us-east-1");
//!     let verifier = HttpAuthGate::new("http://auth-service:4000", Duration::from_secs(2)).unwrap();
//!
//!     let router = create_router(store, verifier, RouterConfig::default());
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod media;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use auth::{CredentialVerifier, HttpAuthGate, VerificationOutcome, DEFAULT_AUTH_TIMEOUT};
pub use config::{BackendConfig, CheckConfig, Cli, Command, ServeConfig};
pub use error::{GatewayError, StoreError};
pub use media::{generate_object_key, resolve_content_type, DEFAULT_CONTENT_TYPE};
pub use server::{
    auth_middleware, create_router, health_handler, image_handler, list_handler,
    liveness_handler, upload_handler, AppState, ErrorResponse, HealthResponse, ListResponse,
    RouterConfig, UploadResponse,
};
pub use store::{
    create_s3_client, provision_bucket, BucketStatus, ImageSummary, ObjectStore, S3ObjectStore,
    StoredObject,
};
