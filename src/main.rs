//! Image Gateway - authenticated access to images in S3-compatible storage.
//!
//! This binary starts the HTTP server and configures all components.

use std::net::SocketAddr;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use image_gateway::{
    auth::{service_url, HEALTH_PATH},
    config::{BackendConfig, CheckConfig, Cli, Command, ServeConfig},
    create_router, create_s3_client,
    store::{normalize_endpoint, provision_bucket},
    HttpAuthGate, ObjectStore, RouterConfig, S3ObjectStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Check(config) => run_check(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let backends = &config.backends;

    info!("Image Gateway v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Auth service: {}", backends.auth_url);
    info!("  Auth timeout: {}ms", backends.auth_timeout_ms);
    info!("  S3 endpoint: {}", normalize_endpoint(&backends.s3_endpoint));
    info!("  S3 bucket: {}", backends.s3_bucket);
    info!("  S3 region: {}", backends.s3_region);
    info!("  Upload limit: {} bytes", config.max_upload_bytes);

    let store = build_store(backends).await;
    provision_bucket(&store).await;

    let verifier = match HttpAuthGate::new(&backends.auth_url, backends.auth_timeout()) {
        Ok(gate) => gate,
        Err(e) => {
            error!("Failed to create auth client: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("Verifying credentials at {}", verifier.verify_url());

    let router = create_router(store, verifier, build_router_config(&config));

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on http://{}", addr);
    info!("  GET  /healthz            - Readiness probe");
    info!("  GET  /livez              - Liveness probe");
    info!("  GET  /list               - List images");
    info!("  POST /upload             - Upload an image");
    info!("  GET  /images/{{filename}}  - Retrieve an image");

    let service = router.into_make_service_with_connect_info::<SocketAddr>();
    if let Err(e) = axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Server stopped");
    ExitCode::SUCCESS
}

async fn build_store(backends: &BackendConfig) -> S3ObjectStore {
    let client = create_s3_client(
        &backends.s3_endpoint,
        &backends.s3_region,
        &backends.s3_access_key,
        &backends.s3_secret_key,
    )
    .await;

    S3ObjectStore::new(client, backends.s3_bucket.clone(), backends.s3_region.clone())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "image_gateway=debug,tower_http=debug"
    } else {
        "image_gateway=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::default().with_max_upload_bytes(config.max_upload_bytes);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    println!("Image Gateway Configuration Check");
    println!("═════════════════════════════════");
    println!();

    let backends = &config.backends;

    if let Err(e) = backends.validate() {
        println!("✗ Configuration: {}", e);
        return ExitCode::FAILURE;
    }
    println!("✓ Auth service: {}", backends.auth_url);
    println!("✓ Endpoint: {}", normalize_endpoint(&backends.s3_endpoint));
    println!("✓ Bucket: {}", backends.s3_bucket);
    println!("✓ Region: {}", backends.s3_region);
    println!();

    let mut ok = true;

    print!("Testing storage connection... ");
    let store = build_store(backends).await;
    match store
        .client()
        .head_bucket()
        .bucket(store.bucket())
        .send()
        .await
    {
        Ok(_) => println!("✓ bucket reachable"),
        Err(e) => {
            ok = false;
            println!("✗ failed");
            println!();
            println!("Error: {}", aws_sdk_s3::error::DisplayErrorContext(&e));
            println!();
            println!("Please check:");
            println!("  - The storage credentials are correct");
            println!("  - The endpoint is reachable");
            println!(
                "  - The bucket '{}' exists (serve creates it on startup)",
                backends.s3_bucket
            );
        }
    }

    print!("Testing auth service... ");
    match probe_auth_service(backends).await {
        Ok(()) => println!("✓ healthy"),
        Err(e) => {
            ok = false;
            println!("✗ {}", e);
        }
    }

    if config.list_images && ok {
        println!();
        println!("Images in bucket:");
        println!("─────────────────");

        match store.list().await {
            Ok(images) if images.is_empty() => println!("  (no images found)"),
            Ok(images) => {
                for image in &images {
                    println!("  {} ({} bytes)", image.key, image.size);
                }
                println!();
                println!("Total: {} image(s)", images.len());
            }
            Err(e) => println!("  Error listing images: {}", e),
        }
    }

    println!();
    println!("═════════════════════════════════");
    if ok {
        println!("✓ All checks passed!");
        ExitCode::SUCCESS
    } else {
        println!("✗ Some checks failed");
        ExitCode::FAILURE
    }
}

/// Call the auth service's health endpoint with the verification timeout.
async fn probe_auth_service(backends: &BackendConfig) -> Result<(), String> {
    let url = service_url(&backends.auth_url, HEALTH_PATH)?;

    let client = reqwest::Client::builder()
        .timeout(backends.auth_timeout())
        .build()
        .map_err(|e| e.to_string())?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| format!("unreachable: {}", e.without_url()))?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("unhealthy (status {})", response.status()))
    }
}
