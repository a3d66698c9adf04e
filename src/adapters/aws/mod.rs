//! AWS implementations of the cloud traits
//!
//! - [`S3ObjectStore`] - audio uploads and result artifacts
//! - [`TranscribeBackend`] - asynchronous speech-to-text jobs
//! - [`ComprehendMedicalExtractor`] - medical entity recognition
//!
//! Credentials come from the AWS default provider chain. A custom
//! `aws.endpoint_url` (LocalStack, MinIO) is applied to every client.

pub mod comprehend;
pub mod s3;
pub mod transcribe;

pub use comprehend::ComprehendMedicalExtractor;
pub use s3::S3ObjectStore;
pub use transcribe::TranscribeBackend;

use crate::config::AwsConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Loads the shared SDK configuration for the configured region
pub async fn load_sdk_config(config: &AwsConfig) -> SdkConfig {
    tracing::info!(
        region = %config.region,
        endpoint = config.endpoint_url.as_deref().unwrap_or("default"),
        "Loading AWS configuration"
    );

    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .load()
        .await
}
