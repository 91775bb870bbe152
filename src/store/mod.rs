//! Object storage layer.
//!
//! All image bytes live in a single S3-compatible bucket. This module defines
//! the [`ObjectStore`] contract the request handlers depend on, and the
//! [`S3ObjectStore`] implementation backed by `aws-sdk-s3`.
//!
//! Every operation normalizes its failures into a [`StoreError`] kind so the
//! HTTP layer can map them to statuses without looking at SDK types.
//!
//! Storage calls carry no client-side timeout; a slow store stalls the
//! request until the SDK or the peer gives up.

mod s3;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::StoreError;

pub use s3::{create_s3_client, normalize_endpoint, S3ObjectStore};

/// Summary of one stored object, as reported by the bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSummary {
    /// Object key
    #[serde(rename = "filename")]
    pub key: String,

    /// Object size in bytes
    pub size: u64,

    /// Last modification time as an RFC 3339 string
    pub last_modified: Option<String>,
}

/// An object fetched from the store.
pub struct StoredObject {
    /// Object contents, streamed from the store
    pub body: ByteStream,

    /// Content length reported by the store, if any
    pub content_length: Option<u64>,
}

/// What [`ObjectStore::ensure_bucket`] found at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStatus {
    /// The bucket was already there
    Existing,

    /// The bucket was missing and has been created
    Created,
}

/// Operations the gateway needs from the object store.
///
/// Implementations are shared across all in-flight requests and must be
/// safe for concurrent use.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Name of the bucket every operation targets.
    fn bucket(&self) -> &str;

    /// Make sure the bucket exists, creating it when it is absent.
    async fn ensure_bucket(&self) -> Result<BucketStatus, StoreError>;

    /// Store `body` under `key`, returning the number of bytes written.
    async fn put(&self, key: &str, body: Bytes) -> Result<u64, StoreError>;

    /// Fetch the object stored under `key`.
    async fn get(&self, key: &str) -> Result<StoredObject, StoreError>;

    /// List every object in the bucket.
    async fn list(&self) -> Result<Vec<ImageSummary>, StoreError>;
}

/// Create the bucket if needed, once at startup.
///
/// Failure is logged and swallowed: the gateway stays reachable and storage
/// operations report their own errors until the bucket exists. Returns the
/// bucket status when provisioning succeeded.
pub async fn provision_bucket<S: ObjectStore + ?Sized>(store: &S) -> Option<BucketStatus> {
    match store.ensure_bucket().await {
        Ok(status) => {
            match status {
                BucketStatus::Existing => info!(bucket = store.bucket(), "Bucket exists"),
                BucketStatus::Created => info!(bucket = store.bucket(), "Bucket created"),
            }
            Some(status)
        }
        Err(e) => {
            error!(bucket = store.bucket(), "Could not provision bucket: {}", e);
            warn!("Continuing without a verified bucket; storage requests may fail");
            None
        }
    }
}
