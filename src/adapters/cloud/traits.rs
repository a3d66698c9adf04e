//! Cloud collaborator traits
//!
//! The pipeline talks to three external services: an object store for audio
//! and result artifacts, an asynchronous speech-to-text backend, and a
//! medical entity recognizer. Each is a trait so the pipeline can be driven
//! by fakes in tests.

use crate::domain::ids::JobName;
use crate::domain::transcription::ExtractedEntity;
use crate::domain::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;

/// Location of a stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    /// Bucket holding the object
    pub bucket: String,

    /// Object key within the bucket
    pub key: String,

    /// Media URI handed to the transcription backend (`s3://bucket/key`)
    pub uri: String,
}

impl ObjectRef {
    /// Builds a reference with the conventional `s3://` URI
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        let bucket = bucket.into();
        let key = key.into();
        let uri = format!("s3://{}/{}", bucket, key);
        Self { bucket, key, uri }
    }
}

/// Object storage for uploaded audio and transcription artifacts
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` under `key` in the configured audio bucket
    ///
    /// # Errors
    ///
    /// Returns `ExternalServiceError::UploadFailed` if the store rejects the write.
    async fn put(&self, key: &str, bytes: Bytes, content_type: Option<&str>) -> Result<ObjectRef>;

    /// Reads a whole object
    ///
    /// # Errors
    ///
    /// Returns `ExternalServiceError::DownloadFailed` if the object cannot be read.
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes>;

    /// Bucket that receives uploads
    fn bucket(&self) -> &str;
}

/// Parameters of one transcription job submission
#[derive(Debug, Clone)]
pub struct TranscriptionJobRequest {
    /// Caller-assigned job name
    pub job_name: JobName,

    /// Language code, e.g. `en-US`
    pub language_code: String,

    /// Media encoding, e.g. `mp3`
    pub media_format: String,

    /// Location of the audio
    pub media_uri: String,

    /// Bucket that receives `{job_name}.json`
    pub output_bucket: String,
}

/// Lifecycle state reported by the transcription backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Queued,
    InProgress,
    Completed,
    Failed,
}

impl JobState {
    /// Whether the backend will not change the state again
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Queued => "QUEUED",
            JobState::InProgress => "IN_PROGRESS",
            JobState::Completed => "COMPLETED",
            JobState::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Result of one status poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatusReport {
    pub status: JobState,

    /// Set by the backend when `status` is `Failed`
    pub failure_reason: Option<String>,
}

impl JobStatusReport {
    pub fn new(status: JobState) -> Self {
        Self {
            status,
            failure_reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: JobState::Failed,
            failure_reason: Some(reason.into()),
        }
    }
}

/// Asynchronous speech-to-text service
///
/// Jobs are identified by the caller-assigned name; on success the backend
/// writes `{job_name}.json` into the requested output bucket.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Submits a job
    ///
    /// # Errors
    ///
    /// Returns `ExternalServiceError::JobSubmissionFailed` if the backend rejects the job.
    async fn submit_job(&self, request: &TranscriptionJobRequest) -> Result<()>;

    /// Reads the current state of a job
    ///
    /// # Errors
    ///
    /// Returns `ExternalServiceError::JobStatusFailed` if the status cannot be read.
    async fn job_status(&self, job_name: &JobName) -> Result<JobStatusReport>;
}

/// Entity type vocabulary produced by an extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityVocabulary {
    /// Medical types: `NAME`, `AGE`, `DX_NAME`, `TEST_NAME`, ...
    Medical,
}

/// Entities found in a transcript
#[derive(Debug, Clone, Default)]
pub struct EntityDetection {
    /// Entities in the order the service returned them
    pub entities: Vec<ExtractedEntity>,

    /// Raw service response, persisted as the audit payload
    pub raw: serde_json::Value,
}

/// Entity recognition over transcript text
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    /// Detects entities in `text`
    ///
    /// # Errors
    ///
    /// Returns `ExternalServiceError::EntityDetectionFailed` if the call fails.
    async fn detect_entities(&self, text: &str) -> Result<EntityDetection>;

    /// Vocabulary of the `entity_type` values this extractor emits
    fn vocabulary(&self) -> EntityVocabulary;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_ref_uri() {
        let object = ObjectRef::new("nextmed-audio", "uploads/1_visit.mp3");
        assert_eq!(object.uri, "s3://nextmed-audio/uploads/1_visit.mp3");
    }

    #[test]
    fn test_job_state_terminal() {
        assert!(!JobState::Queued.is_terminal());
        assert!(!JobState::InProgress.is_terminal());
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert_eq!(JobState::InProgress.to_string(), "IN_PROGRESS");
    }

    #[test]
    fn test_failed_report_carries_reason() {
        let report = JobStatusReport::failed("Unsupported media");
        assert_eq!(report.status, JobState::Failed);
        assert_eq!(report.failure_reason.as_deref(), Some("Unsupported media"));
    }
}
