//! Router configuration for the image gateway.
//!
//! # Route Structure
//!
//! ```text
//! /healthz              - Readiness probe (public, not access-logged)
//! /livez                - Liveness probe (public, not access-logged)
//! /list                 - List images (protected)
//! /upload               - Upload an image (protected)
//! /images/{filename}    - Retrieve an image (protected)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use image_gateway::server::routes::{create_router, RouterConfig};
//!
//! let router = create_router(store, verifier, RouterConfig::default());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(
//!     listener,
//!     router.into_make_service_with_connect_info::<std::net::SocketAddr>(),
//! )
//! .await?;
//! ```

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    health_handler, image_handler, list_handler, liveness_handler, upload_handler, AppState,
};
use super::pipeline::{auth_middleware, log_access, make_access_span};
use crate::auth::CredentialVerifier;
use crate::store::ObjectStore;

/// Default upload size limit (25 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Maximum accepted request body size for uploads, in bytes
    pub max_upload_bytes: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cors_origins: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl RouterConfig {
    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Set the upload size limit in bytes.
    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router.
///
/// Protected routes are wrapped, outermost first, by the access log, the
/// auth middleware, and the upload body limit. The probes sit outside all
/// three.
pub fn create_router<S, V>(store: S, verifier: V, config: RouterConfig) -> Router
where
    S: ObjectStore,
    V: CredentialVerifier,
{
    let app_state = AppState::new(store, verifier);
    let cors = build_cors_layer(&config);

    let protected_routes = Router::new()
        .route("/list", get(list_handler::<S, V>))
        .route("/upload", post(upload_handler::<S, V>))
        .route("/images/{filename}", get(image_handler::<S, V>))
        .route_layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware::<S, V>,
        ))
        .route_layer(
            TraceLayer::new_for_http()
                .make_span_with(make_access_span)
                .on_response(log_access)
                .on_failure(()),
        )
        .with_state(app_state);

    let public_routes = Router::new()
        .route("/healthz", get(health_handler))
        .route("/livez", get(liveness_handler));

    Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .layer(cors)
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
