//! Amazon Transcribe backend

use crate::adapters::cloud::{
    JobState, JobStatusReport, TranscriptionBackend, TranscriptionJobRequest,
};
use crate::config::AwsConfig;
use crate::domain::ids::JobName;
use crate::domain::{ExternalServiceError, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_transcribe::error::DisplayErrorContext;
use aws_sdk_transcribe::types::{LanguageCode, Media, MediaFormat, TranscriptionJobStatus};
use aws_sdk_transcribe::Client;

/// Transcription backend using `StartTranscriptionJob` / `GetTranscriptionJob`
pub struct TranscribeBackend {
    client: Client,
}

impl TranscribeBackend {
    pub fn new(sdk_config: &SdkConfig, config: &AwsConfig) -> Self {
        let mut builder = aws_sdk_transcribe::config::Builder::from(sdk_config);
        if let Some(ref endpoint) = config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }
}

fn map_status(status: Option<&TranscriptionJobStatus>) -> JobState {
    match status {
        Some(TranscriptionJobStatus::Completed) => JobState::Completed,
        Some(TranscriptionJobStatus::Failed) => JobState::Failed,
        Some(TranscriptionJobStatus::Queued) => JobState::Queued,
        // Unknown future states are treated as still running
        _ => JobState::InProgress,
    }
}

#[async_trait]
impl TranscriptionBackend for TranscribeBackend {
    async fn submit_job(&self, request: &TranscriptionJobRequest) -> Result<()> {
        tracing::info!(
            job_name = %request.job_name,
            media_uri = %request.media_uri,
            language_code = %request.language_code,
            "Starting transcription job"
        );

        self.client
            .start_transcription_job()
            .transcription_job_name(request.job_name.as_str())
            .language_code(LanguageCode::from(request.language_code.as_str()))
            .media_format(MediaFormat::from(request.media_format.as_str()))
            .media(Media::builder().media_file_uri(&request.media_uri).build())
            .output_bucket_name(&request.output_bucket)
            .send()
            .await
            .map_err(|e| {
                ExternalServiceError::JobSubmissionFailed(format!(
                    "{}: {}",
                    request.job_name,
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(())
    }

    async fn job_status(&self, job_name: &JobName) -> Result<JobStatusReport> {
        let output = self
            .client
            .get_transcription_job()
            .transcription_job_name(job_name.as_str())
            .send()
            .await
            .map_err(|e| {
                ExternalServiceError::JobStatusFailed(format!(
                    "{}: {}",
                    job_name,
                    DisplayErrorContext(&e)
                ))
            })?;

        let job = output.transcription_job().ok_or_else(|| {
            ExternalServiceError::JobStatusFailed(format!("{job_name}: job missing from response"))
        })?;

        Ok(JobStatusReport {
            status: map_status(job.transcription_job_status()),
            failure_reason: job.failure_reason().map(str::to_string),
        })
    }
}
