//! Per-request auth pipeline and access logging.
//!
//! Every protected request walks the same state machine before a handler
//! runs:
//!
//! ```text
//! Received ─► CredentialCheck ──(no header)──────────────► 401 missing_token
//!                   │
//!                   ▼
//!          VerificationPending ──(unreachable/timeout)──► 503 auth_unavailable
//!                   │          ──(non-200)──────────────► 401 invalid_token
//!                   ▼
//!             OperationDispatch ─► handler
//! ```
//!
//! The access log span wraps the whole machine, so rejected requests are
//! logged with their final status just like successful ones.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{info, info_span, Span};

use super::handlers::AppState;
use crate::auth::{CredentialVerifier, VerificationOutcome};
use crate::error::GatewayError;
use crate::store::ObjectStore;

/// Extract the bearer credential from the request headers.
///
/// The header value is returned verbatim. A missing, empty, or non-text
/// header yields `None`.
pub fn extract_credential(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

/// Run the credential check and verification steps for one request.
///
/// The verifier is only consulted when a credential is present.
pub async fn authorize<V: CredentialVerifier>(
    verifier: &V,
    headers: &HeaderMap,
) -> Result<(), GatewayError> {
    let credential = extract_credential(headers).ok_or(GatewayError::MissingCredential)?;

    match verifier.verify(credential).await {
        VerificationOutcome::Authorized => Ok(()),
        VerificationOutcome::Rejected { .. } => Err(GatewayError::InvalidCredential),
        VerificationOutcome::Unavailable { .. } => Err(GatewayError::AuthUnavailable),
    }
}

/// Axum middleware gating protected routes on the auth collaborator's verdict.
///
/// ```ignore
/// let protected = Router::new()
///     .route("/list", get(list_handler::<S, V>))
///     .route_layer(middleware::from_fn_with_state(state, auth_middleware::<S, V>));
/// ```
pub async fn auth_middleware<S: ObjectStore, V: CredentialVerifier>(
    State(state): State<AppState<S, V>>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    authorize(state.verifier.as_ref(), request.headers()).await?;

    Ok(next.run(request).await)
}

/// Build the access log span for a request.
///
/// The client address is only known when the server was started with
/// `into_make_service_with_connect_info`; otherwise it is logged as `-`.
pub fn make_access_span(request: &Request<Body>) -> Span {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());

    info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        client = %client,
    )
}

/// Log the outcome of a request inside its access span.
pub fn log_access(response: &Response<Body>, latency: Duration, _span: &Span) {
    info!(
        status = response.status().as_u16(),
        elapsed_ms = latency.as_millis() as u64,
        "request completed"
    );
}
