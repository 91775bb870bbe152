//! HTTP server layer for the image gateway.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          HTTP Layer                             │
//! │        /healthz  /livez  /list  /upload  /images/{filename}     │
//! │                                                                 │
//! │  ┌─────────────┐  ┌──────────────────┐  ┌────────────────────┐  │
//! │  │  handlers   │  │     pipeline     │  │       routes       │  │
//! │  │ (requests)  │  │ (auth + access   │  │  (router config)   │  │
//! │  │             │  │       log)       │  │                    │  │
//! │  └─────────────┘  └──────────────────┘  └────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//!            │                    │
//!            ▼                    ▼
//!      ObjectStore        CredentialVerifier
//! ```

pub mod handlers;
pub mod pipeline;
pub mod routes;

pub use handlers::{
    health_handler, image_handler, list_handler, liveness_handler, upload_handler, AppState,
    ErrorResponse, HealthResponse, ListResponse, UploadResponse, UPLOAD_FIELD,
};
pub use pipeline::{auth_middleware, authorize, extract_credential};
pub use routes::{create_router, RouterConfig, DEFAULT_MAX_UPLOAD_BYTES};
