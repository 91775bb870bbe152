//! Test utilities for integration tests.
//!
//! Provides an in-memory object store, a scripted credential verifier and
//! helpers for building requests against the router.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use axum::body::Body;
use axum::http::{header, Request};
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use tokio::sync::RwLock;

use image_gateway::error::StoreError;
use image_gateway::{
    create_router, BucketStatus, CredentialVerifier, ImageSummary, ObjectStore, RouterConfig,
    StoredObject, VerificationOutcome,
};

/// Timestamp reported for every object in the memory store.
pub const FIXED_TIMESTAMP: &str = "2024-01-01T00:00:00Z";

/// Token the default verifier accepts.
pub const VALID_TOKEN: &str = "Bearer valid-token";

// =============================================================================
// In-Memory Object Store
// =============================================================================

/// An object store backed by a shared in-memory map.
///
/// Clones share the same objects, so a test can keep a handle after passing
/// the store to the router.
#[derive(Clone, Default)]
pub struct MemoryStore {
    objects: Arc<RwLock<BTreeMap<String, Bytes>>>,
    fail_writes: Arc<AtomicBool>,
    fail_reads: Arc<AtomicBool>,
    fail_lists: Arc<AtomicBool>,
    fail_bucket: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_object(self, key: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.objects.write().await.insert(key.into(), data.into());
        self
    }

    pub fn failing_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_reads(self) -> Self {
        self.fail_reads.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_lists(self) -> Self {
        self.fail_lists.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_bucket(self) -> Self {
        self.fail_bucket.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_everything(self) -> Self {
        self.failing_writes().failing_reads().failing_lists()
    }

    pub async fn object(&self, key: &str) -> Option<Bytes> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Number of store operations performed (bucket provisioning excluded).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        "memory"
    }

    async fn ensure_bucket(&self) -> Result<BucketStatus, StoreError> {
        if self.fail_bucket.load(Ordering::SeqCst) {
            return Err(StoreError::Bucket("access denied".to_string()));
        }
        Ok(BucketStatus::Existing)
    }

    async fn put(&self, key: &str, body: Bytes) -> Result<u64, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Write("connection reset by peer".to_string()));
        }

        let size = body.len() as u64;
        self.objects.write().await.insert(key.to_string(), body);
        Ok(size)
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Read("connection reset by peer".to_string()));
        }

        match self.objects.read().await.get(key) {
            Some(data) => Ok(StoredObject {
                content_length: Some(data.len() as u64),
                body: ByteStream::from(data.clone()),
            }),
            None => Err(StoreError::NotFound(key.to_string())),
        }
    }

    async fn list(&self) -> Result<Vec<ImageSummary>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(StoreError::List("connection reset by peer".to_string()));
        }

        Ok(self
            .objects
            .read()
            .await
            .iter()
            .map(|(key, data)| ImageSummary {
                key: key.clone(),
                size: data.len() as u64,
                last_modified: Some(FIXED_TIMESTAMP.to_string()),
            })
            .collect())
    }
}

// =============================================================================
// Scripted Verifier
// =============================================================================

/// A verifier returning a fixed outcome and recording what it was asked.
#[derive(Clone)]
pub struct ScriptedVerifier {
    outcome: VerificationOutcome,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl ScriptedVerifier {
    pub fn new(outcome: VerificationOutcome) -> Self {
        Self {
            outcome,
            calls: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn authorized() -> Self {
        Self::new(VerificationOutcome::Authorized)
    }

    pub fn rejected(status: u16) -> Self {
        Self::new(VerificationOutcome::Rejected { status })
    }

    pub fn unavailable() -> Self {
        Self::new(VerificationOutcome::Unavailable {
            reason: "timed out".to_string(),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_credentials(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CredentialVerifier for ScriptedVerifier {
    async fn verify(&self, credential: &str) -> VerificationOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(credential.to_string());
        self.outcome.clone()
    }
}

// =============================================================================
// Router and Request Helpers
// =============================================================================

pub fn test_router(store: MemoryStore, verifier: ScriptedVerifier) -> Router {
    create_router(store, verifier, RouterConfig::default())
}

pub const BOUNDARY: &str = "image-gateway-test-boundary";

/// Build a multipart/form-data body with a single field.
pub fn multipart_body(field: &str, file_name: Option<&str>, data: &[u8]) -> Vec<u8> {
    let disposition = match file_name {
        Some(name) => format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, name
        ),
        None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", field),
    };

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(disposition.as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn upload_request(token: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    builder.body(Body::from(body)).unwrap()
}

pub fn upload_file_request(token: Option<&str>, file_name: &str, data: &[u8]) -> Request<Body> {
    upload_request(token, multipart_body("file", Some(file_name), data))
}

pub async fn body_bytes(response: axum::response::Response) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
