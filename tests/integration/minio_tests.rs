//! Storage tests against a real MinIO instance.
//!
//! # Requirements
//!
//! A MinIO server on `localhost:9000` with the default `minioadmin`
//! credentials:
//!
//! ```bash
//! docker run -p 9000:9000 minio/minio server /data
//! ```
//!
//! # Running the tests
//!
//! ```bash
//! cargo test --test integration minio -- --ignored
//! ```
//!
//! These tests are marked as `#[ignore]` by default because they require an
//! external service to be running.

use std::time::Duration;

use axum::http::StatusCode;
use bytes::Bytes;
use tower::ServiceExt;
use uuid::Uuid;

use image_gateway::error::StoreError;
use image_gateway::{
    create_router, create_s3_client, BucketStatus, ObjectStore, RouterConfig, S3ObjectStore,
};

use super::test_utils::{
    body_bytes, body_json, get_request, upload_file_request, ScriptedVerifier, VALID_TOKEN,
};

const MINIO_ENDPOINT: &str = "localhost:9000";
const MINIO_ACCESS_KEY: &str = "minioadmin";
const MINIO_SECRET_KEY: &str = "minioadmin";

/// Check if the MinIO service is reachable
async fn is_minio_available() -> bool {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
    {
        Ok(c) => c,
        Err(_) => return false,
    };

    client
        .get(format!("http://{}/minio/health/live", MINIO_ENDPOINT))
        .send()
        .await
        .map(|r| r.status().is_success())
        .unwrap_or(false)
}

/// A store on a bucket no other test uses.
async fn fresh_store() -> S3ObjectStore {
    let client =
        create_s3_client(MINIO_ENDPOINT, "us-east-1", MINIO_ACCESS_KEY, MINIO_SECRET_KEY).await;
    let bucket = format!("gateway-test-{}", Uuid::new_v4().simple());
    S3ObjectStore::new(client, bucket, "us-east-1")
}

/// Helper to skip test with a message
macro_rules! skip_unless_minio {
    () => {
        if !is_minio_available().await {
            eprintln!("SKIPPED: MinIO is not available at {}", MINIO_ENDPOINT);
            return;
        }
    };
}

#[tokio::test]
#[ignore]
async fn test_minio_ensure_bucket() {
    skip_unless_minio!();
    let store = fresh_store().await;

    assert_eq!(store.ensure_bucket().await.unwrap(), BucketStatus::Created);
    assert_eq!(store.ensure_bucket().await.unwrap(), BucketStatus::Existing);
}

#[tokio::test]
#[ignore]
async fn test_minio_put_get_list() {
    skip_unless_minio!();
    let store = fresh_store().await;
    store.ensure_bucket().await.unwrap();

    assert!(store.list().await.unwrap().is_empty());

    let size = store
        .put("k_cat.png", Bytes::from_static(b"not really a png"))
        .await
        .unwrap();
    assert_eq!(size, 16);

    let object = store.get("k_cat.png").await.unwrap();
    assert_eq!(object.content_length, Some(16));
    let data = object.body.collect().await.unwrap().into_bytes();
    assert_eq!(data.as_ref(), b"not really a png");

    let images = store.list().await.unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].key, "k_cat.png");
    assert_eq!(images[0].size, 16);
    assert!(images[0].last_modified.is_some());
}

#[tokio::test]
#[ignore]
async fn test_minio_missing_key() {
    skip_unless_minio!();
    let store = fresh_store().await;
    store.ensure_bucket().await.unwrap();

    assert!(matches!(
        store.get("missing.png").await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
#[ignore]
async fn test_minio_list_paginates() {
    skip_unless_minio!();
    let store = fresh_store().await;
    store.ensure_bucket().await.unwrap();

    // More than one 1000-key page
    for i in 0..1005 {
        store
            .put(&format!("k_{:04}.png", i), Bytes::from_static(b"x"))
            .await
            .unwrap();
    }

    assert_eq!(store.list().await.unwrap().len(), 1005);
}

#[tokio::test]
#[ignore]
async fn test_minio_through_router() {
    skip_unless_minio!();
    let store = fresh_store().await;
    store.ensure_bucket().await.unwrap();
    let router = create_router(store, ScriptedVerifier::authorized(), RouterConfig::default());

    let response = router
        .clone()
        .oneshot(upload_file_request(Some(VALID_TOKEN), "cat.png", b"pixels"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let key = body_json(response).await["filename"].as_str().unwrap().to_string();

    let response = router
        .clone()
        .oneshot(get_request(&format!("/images/{}", key), Some(VALID_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await.as_ref(), b"pixels");

    let response = router
        .oneshot(get_request("/list", Some(VALID_TOKEN)))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["count"], 1);
}
