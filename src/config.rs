//! Configuration management for the image gateway.
//!
//! Configuration comes from command-line arguments via clap, with every
//! option also readable from the environment. The binary has two
//! subcommands:
//!
//! - `serve` runs the gateway
//! - `check` validates configuration and probes both collaborators
//!
//! # Environment Variables
//!
//! - `HOST` - Server bind address (default: 0.0.0.0)
//! - `PORT` - Server port (default: 5000)
//! - `AUTH_SERVICE_URL` - Base URL of the auth service (required)
//! - `AUTH_TIMEOUT_MS` - Verification timeout in milliseconds (default: 2000)
//! - `MINIO_ENDPOINT` - S3-compatible endpoint, `host:port` or full URL (required)
//! - `MINIO_ACCESS_KEY` - Storage access key (required)
//! - `MINIO_SECRET_KEY` - Storage secret key (required)
//! - `MINIO_BUCKET` - Bucket holding the images (required)
//! - `S3_REGION` - Storage region (default: us-east-1)
//! - `MAX_UPLOAD_BYTES` - Upload body size limit (default: 25 MiB)
//! - `CORS_ORIGINS` - Comma-separated allowed origins (default: any)

use std::fmt;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use url::Url;

use crate::server::DEFAULT_MAX_UPLOAD_BYTES;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default storage region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default auth verification timeout in milliseconds.
pub const DEFAULT_AUTH_TIMEOUT_MS: u64 = 2000;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Image Gateway - authenticated access to images in S3-compatible storage.
#[derive(Parser, Debug)]
#[command(name = "image-gateway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Consume the parsed arguments and return the selected command.
    pub fn into_command(self) -> Command {
        self.command
    }
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the gateway HTTP server
    Serve(ServeConfig),

    /// Validate configuration and test connectivity to storage and auth
    Check(CheckConfig),
}

/// Connection settings for the two external collaborators.
#[derive(Args, Clone)]
pub struct BackendConfig {
    /// Base URL of the auth service (its `/verify` endpoint is called).
    #[arg(long, env = "AUTH_SERVICE_URL")]
    pub auth_url: String,

    /// Timeout for a single verification call, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_AUTH_TIMEOUT_MS, env = "AUTH_TIMEOUT_MS")]
    pub auth_timeout_ms: u64,

    /// S3-compatible endpoint (e.g. `minio:9000` or `https://s3.example.com`).
    #[arg(long, env = "MINIO_ENDPOINT")]
    pub s3_endpoint: String,

    /// Storage access key.
    #[arg(long, env = "MINIO_ACCESS_KEY")]
    pub s3_access_key: String,

    /// Storage secret key.
    #[arg(long, env = "MINIO_SECRET_KEY", hide_env_values = true)]
    pub s3_secret_key: String,

    /// Bucket holding the images. Created at startup if missing.
    #[arg(long, env = "MINIO_BUCKET")]
    pub s3_bucket: String,

    /// Storage region.
    #[arg(long, default_value = DEFAULT_REGION, env = "S3_REGION")]
    pub s3_region: String,
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("auth_url", &self.auth_url)
            .field("auth_timeout_ms", &self.auth_timeout_ms)
            .field("s3_endpoint", &self.s3_endpoint)
            .field("s3_access_key", &self.s3_access_key)
            .field("s3_secret_key", &"<redacted>")
            .field("s3_bucket", &self.s3_bucket)
            .field("s3_region", &self.s3_region)
            .finish()
    }
}

impl BackendConfig {
    /// Validate the collaborator settings.
    pub fn validate(&self) -> Result<(), String> {
        let auth_url = Url::parse(&self.auth_url).map_err(|e| {
            format!(
                "AUTH_SERVICE_URL must be an absolute URL ({}). Set --auth-url or AUTH_SERVICE_URL",
                e
            )
        })?;
        if !matches!(auth_url.scheme(), "http" | "https") {
            return Err(format!(
                "AUTH_SERVICE_URL must use http or https, got {}",
                auth_url.scheme()
            ));
        }

        if self.auth_timeout_ms == 0 {
            return Err("auth_timeout_ms must be greater than 0".to_string());
        }

        if self.s3_endpoint.is_empty() {
            return Err(
                "S3 endpoint is required. Set --s3-endpoint or MINIO_ENDPOINT".to_string(),
            );
        }

        if self.s3_access_key.is_empty() || self.s3_secret_key.is_empty() {
            return Err(
                "Storage credentials are required. Set MINIO_ACCESS_KEY and MINIO_SECRET_KEY"
                    .to_string(),
            );
        }

        if self.s3_bucket.is_empty() {
            return Err("S3 bucket name is required. Set --s3-bucket or MINIO_BUCKET".to_string());
        }

        Ok(())
    }

    /// Timeout applied to each verification call.
    pub fn auth_timeout(&self) -> Duration {
        Duration::from_millis(self.auth_timeout_ms)
    }
}

/// Configuration for the `serve` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    #[command(flatten)]
    pub backends: BackendConfig,

    /// Maximum upload body size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES, env = "MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: usize,

    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.backends.validate()?;

        if self.max_upload_bytes == 0 {
            return Err("max_upload_bytes must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration for the `check` subcommand.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    #[command(flatten)]
    pub backends: BackendConfig,

    /// Also list the objects currently in the bucket.
    #[arg(long, default_value_t = false)]
    pub list_images: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// =============================================================================
// Tests
// =============================================================================
