use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::{ByteStream, DateTimeFormat};
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::debug;

use super::{BucketStatus, ImageSummary, ObjectStore, StoredObject};
use crate::error::StoreError;

/// Region S3 treats as the default; buckets there take no location constraint.
const DEFAULT_S3_REGION: &str = "us-east-1";

/// S3-backed implementation of [`ObjectStore`].
///
/// Works against AWS S3 or any S3-compatible service (MinIO, etc.). The
/// client is cheap to clone and safe to share between requests.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    region: String,
}

impl S3ObjectStore {
    /// Create a store for `bucket` using an already configured client.
    pub fn new(client: Client, bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            region: region.into(),
        }
    }

    /// Get the underlying S3 client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn create_bucket_configuration(&self) -> Option<CreateBucketConfiguration> {
        if self.region == DEFAULT_S3_REGION {
            return None;
        }
        Some(
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                .build(),
        )
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn ensure_bucket(&self) -> Result<BucketStatus, StoreError> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => return Ok(BucketStatus::Existing),
            Err(e) => {
                debug!(
                    bucket = %self.bucket,
                    error = %DisplayErrorContext(&e),
                    "Bucket check failed, attempting to create it"
                );
            }
        }

        let result = self
            .client
            .create_bucket()
            .bucket(&self.bucket)
            .set_create_bucket_configuration(self.create_bucket_configuration())
            .send()
            .await;

        match result {
            Ok(_) => Ok(BucketStatus::Created),
            Err(e) => {
                let already_ours = e
                    .as_service_error()
                    .map(|se| se.is_bucket_already_owned_by_you())
                    .unwrap_or(false);

                if already_ours {
                    Ok(BucketStatus::Existing)
                } else {
                    Err(StoreError::Bucket(DisplayErrorContext(&e).to_string()))
                }
            }
        }
    }

    async fn put(&self, key: &str, body: Bytes) -> Result<u64, StoreError> {
        let size = body.len() as u64;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_length(size as i64)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StoreError::Write(DisplayErrorContext(&e).to_string()))?;

        Ok(size)
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StoreError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let is_no_such_key = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);

                // Some S3-compatible services answer 404 without a NoSuchKey code
                let status_is_404 = e
                    .raw_response()
                    .map(|r| r.status().as_u16() == 404)
                    .unwrap_or(false);

                if is_no_such_key || status_is_404 {
                    StoreError::NotFound(key.to_string())
                } else {
                    StoreError::Read(DisplayErrorContext(&e).to_string())
                }
            })?;

        let content_length = output
            .content_length()
            .and_then(|len| u64::try_from(len).ok());

        Ok(StoredObject {
            body: output.body,
            content_length,
        })
    }

    async fn list(&self) -> Result<Vec<ImageSummary>, StoreError> {
        let mut images = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(&self.bucket);

            if let Some(token) = continuation_token {
                request = request.continuation_token(token);
            }

            let result = request
                .send()
                .await
                .map_err(|e| StoreError::List(DisplayErrorContext(&e).to_string()))?;

            for obj in result.contents() {
                let Some(key) = obj.key() else {
                    continue;
                };

                images.push(ImageSummary {
                    key: key.to_string(),
                    size: obj.size().and_then(|s| u64::try_from(s).ok()).unwrap_or(0),
                    last_modified: obj
                        .last_modified()
                        .and_then(|t| t.fmt(DateTimeFormat::DateTime).ok()),
                });
            }

            if result.is_truncated() == Some(true) {
                continuation_token = result.next_continuation_token().map(|s| s.to_string());
                if continuation_token.is_none() {
                    break;
                }
            } else {
                break;
            }
        }

        Ok(images)
    }
}

/// Prepend `http://` to endpoints given as bare `host:port`.
pub fn normalize_endpoint(endpoint: &str) -> String {
    if endpoint.contains("://") {
        endpoint.trim_end_matches('/').to_string()
    } else {
        format!("http://{}", endpoint.trim_end_matches('/'))
    }
}

/// Create an S3 client for an S3-compatible endpoint with static credentials.
///
/// Path-style addressing is forced, as MinIO and most self-hosted services
/// require it.
///
/// ```ignore
/// let client = create_s3_client("minio:9000", "us-east-1", "access", "secret").await;
/// ```
pub async fn create_s3_client(
    endpoint: &str,
    region: &str,
    access_key: &str,
    secret_key: &str,
) -> Client {
    let credentials = aws_sdk_s3::config::Credentials::new(
        access_key,
        secret_key,
        None, // session token
        None, // expiry
        "image-gateway",
    );

    let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(region.to_string()))
        .endpoint_url(normalize_endpoint(endpoint))
        .credentials_provider(credentials)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(true)
        .build();

    Client::from_conf(s3_config)
}
