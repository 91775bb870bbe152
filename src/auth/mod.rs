//! Credential verification against the external auth collaborator.
//!
//! The gateway never inspects credentials itself. Each request's bearer
//! string is handed to a [`CredentialVerifier`], which reports one of three
//! outcomes:
//!
//! ```text
//!   credential ──► CredentialVerifier::verify ──► Authorized
//!                                              ├─► Rejected
//!                                              └─► Unavailable
//! ```
//!
//! [`HttpAuthGate`] is the production verifier. Tests substitute their own
//! implementation through the trait.

mod http_gate;

use async_trait::async_trait;

pub use http_gate::{service_url, HttpAuthGate, DEFAULT_AUTH_TIMEOUT, HEALTH_PATH, VERIFY_PATH};

/// Result of a single verification round trip.
///
/// Produced fresh for every request and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The collaborator answered 200
    Authorized,

    /// The collaborator answered with any other status
    Rejected {
        /// HTTP status returned by the collaborator
        status: u16,
    },

    /// The collaborator timed out or the request failed in transport
    Unavailable {
        /// Transport error description (never contains the credential)
        reason: String,
    },
}

/// A source of verification verdicts for bearer credentials.
///
/// Implementations must be safe to call concurrently from many requests.
/// Callers guarantee `credential` is non-empty.
#[async_trait]
pub trait CredentialVerifier: Send + Sync + 'static {
    /// Verify a credential exactly once.
    async fn verify(&self, credential: &str) -> VerificationOutcome;
}
