//! HTTP implementation of [`CredentialVerifier`].

use std::time::Duration;

use async_trait::async_trait;
use http::header::AUTHORIZATION;
use http::StatusCode;
use tracing::{info, warn};
use url::Url;

use super::{CredentialVerifier, VerificationOutcome};

/// Default timeout for a verification round trip.
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(2);

/// Path of the verification endpoint on the auth collaborator.
pub const VERIFY_PATH: &str = "verify";

/// Path of the auth collaborator's health endpoint.
pub const HEALTH_PATH: &str = "healthz";

/// Verifies credentials by calling `GET {base}/verify` on the auth service.
///
/// The credential is forwarded verbatim in the `Authorization` header. Each
/// call is bounded by the configured timeout and is never retried.
#[derive(Clone)]
pub struct HttpAuthGate {
    client: reqwest::Client,
    verify_url: Url,
}

impl HttpAuthGate {
    /// Create a gate for the auth service at `base_url`.
    ///
    /// Fails if `base_url` is not an absolute URL or the HTTP client cannot
    /// be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, String> {
        let verify_url = service_url(base_url, VERIFY_PATH)?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("failed to build auth client: {}", e))?;

        Ok(Self { client, verify_url })
    }

    /// The full URL of the verification endpoint.
    pub fn verify_url(&self) -> &Url {
        &self.verify_url
    }
}

/// Join an endpoint path onto the auth service base URL, keeping any base
/// path.
///
/// ```ignore
/// let url = service_url("https://host/auth", HEALTH_PATH)?; // https://host/auth/healthz
/// ```
pub fn service_url(base_url: &str, endpoint: &str) -> Result<Url, String> {
    let mut base = Url::parse(base_url).map_err(|e| format!("invalid auth URL: {}", e))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(format!("auth URL must be http or https, got {}", base.scheme()));
    }

    // Url::join drops the last path segment unless the base ends with '/'
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join(endpoint)
        .map_err(|e| format!("invalid auth URL: {}", e))
}

#[async_trait]
impl CredentialVerifier for HttpAuthGate {
    async fn verify(&self, credential: &str) -> VerificationOutcome {
        let result = self
            .client
            .get(self.verify_url.clone())
            .header(AUTHORIZATION, credential)
            .send()
            .await;

        match result {
            Ok(response) if response.status() == StatusCode::OK => {
                info!("Credential verified");
                VerificationOutcome::Authorized
            }
            Ok(response) => {
                let status = response.status().as_u16();
                warn!(status = status, "Credential rejected by auth service");
                VerificationOutcome::Rejected { status }
            }
            Err(e) => {
                let reason = if e.is_timeout() {
                    "timed out".to_string()
                } else {
                    e.without_url().to_string()
                };
                warn!(reason = %reason, "Auth service unavailable");
                VerificationOutcome::Unavailable { reason }
            }
        }
    }
}
