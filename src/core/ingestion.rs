//! Audio ingestion
//!
//! Stores an uploaded recording in the object store under a time-prefixed
//! key and returns the reference the transcription backend needs.

use crate::adapters::cloud::ObjectStore;
use crate::domain::{NextMedError, Result};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Instant;

/// Prefix of every uploaded audio key
pub const UPLOAD_PREFIX: &str = "uploads";

/// An audio file received from a client
#[derive(Debug, Clone)]
pub struct AudioUpload {
    /// Client-supplied file name
    pub file_name: String,

    /// Client-supplied MIME type
    pub content_type: Option<String>,

    /// Raw audio bytes
    pub bytes: Bytes,
}

impl AudioUpload {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    /// Checks the upload before anything is stored
    ///
    /// # Errors
    ///
    /// Returns `NextMedError::Validation` if the file is empty, unnamed, or
    /// larger than `max_bytes`.
    pub fn validate(&self, max_bytes: usize) -> Result<()> {
        if self.bytes.is_empty() {
            return Err(NextMedError::Validation("No file uploaded.".to_string()));
        }
        if self.file_name.trim().is_empty() {
            return Err(NextMedError::Validation(
                "Uploaded file has no name".to_string(),
            ));
        }
        if self.bytes.len() > max_bytes {
            return Err(NextMedError::Validation(format!(
                "Uploaded file is {} bytes; the limit is {} bytes",
                self.bytes.len(),
                max_bytes
            )));
        }
        Ok(())
    }
}

/// Where an ingested recording was stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioReference {
    pub bucket: String,
    pub key: String,

    /// Media URI for the transcription backend
    pub uri: String,

    /// Hex SHA-256 of the audio bytes
    pub sha256: String,

    pub size_bytes: usize,
}

/// Object key for an upload: `uploads/{unix_millis}_{file_name}`
///
/// Directory components and control characters are removed from the client
/// name so the key always lands directly under the upload prefix.
pub fn object_key_for(file_name: &str, now: DateTime<Utc>) -> String {
    let base = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>();
    let base = base.trim();
    let base = if base.is_empty() || base == "." || base == ".." {
        "audio"
    } else {
        base
    };
    format!("{}/{}_{}", UPLOAD_PREFIX, now.timestamp_millis(), base)
}

/// Stores uploaded audio
pub struct AudioIngestor {
    store: Arc<dyn ObjectStore>,
    max_upload_bytes: usize,
}

impl AudioIngestor {
    pub fn new(store: Arc<dyn ObjectStore>, max_upload_bytes: usize) -> Self {
        Self {
            store,
            max_upload_bytes,
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Validate and store an upload
    ///
    /// # Errors
    ///
    /// Returns `NextMedError::Validation` for a bad upload and
    /// `ExternalServiceError::UploadFailed` if the store rejects it. Nothing
    /// is retried.
    pub async fn ingest(&self, upload: &AudioUpload) -> Result<AudioReference> {
        upload.validate(self.max_upload_bytes)?;

        let started = Instant::now();
        let key = object_key_for(&upload.file_name, Utc::now());
        let sha256 = format!("{:x}", Sha256::digest(&upload.bytes));
        let size_bytes = upload.bytes.len();

        let object = self
            .store
            .put(&key, upload.bytes.clone(), upload.content_type.as_deref())
            .await?;

        crate::log_pipeline_stage!(
            "ingestion",
            started,
            key = %object.key,
            size_bytes = size_bytes
        );

        Ok(AudioReference {
            bucket: object.bucket,
            key: object.key,
            uri: object.uri,
            sha256,
            size_bytes,
        })
    }
}
