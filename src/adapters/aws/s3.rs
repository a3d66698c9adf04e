//! S3 object store

use crate::adapters::cloud::{ObjectRef, ObjectStore};
use crate::config::AwsConfig;
use crate::domain::{ExternalServiceError, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

/// Object store backed by an S3 bucket
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Create a store for `config.bucket`
    ///
    /// # Arguments
    ///
    /// * `sdk_config` - Shared AWS configuration
    /// * `config` - Bucket, endpoint and addressing style
    pub fn new(sdk_config: &SdkConfig, config: &AwsConfig) -> Self {
        let mut builder =
            aws_sdk_s3::config::Builder::from(sdk_config).force_path_style(config.force_path_style);
        if let Some(ref endpoint) = config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: Option<&str>) -> Result<ObjectRef> {
        tracing::debug!(
            bucket = %self.bucket,
            key = %key,
            size = bytes.len(),
            "Uploading object to S3"
        );

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes));
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }

        request.send().await.map_err(|e| {
            ExternalServiceError::UploadFailed(format!(
                "s3://{}/{}: {}",
                self.bucket,
                key,
                DisplayErrorContext(&e)
            ))
        })?;

        Ok(ObjectRef::new(self.bucket.clone(), key))
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                ExternalServiceError::DownloadFailed(format!(
                    "s3://{}/{}: {}",
                    bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        let data = output.body.collect().await.map_err(|e| {
            ExternalServiceError::DownloadFailed(format!("s3://{}/{}: {}", bucket, key, e))
        })?;

        Ok(data.into_bytes())
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
