//! Transcription job orchestrator
//!
//! Submits a job for stored audio, polls until the backend reports a
//! terminal state, then fetches and parses the result artifact.

use crate::adapters::cloud::{
    JobState, ObjectStore, TranscriptionBackend, TranscriptionJobRequest,
};
use crate::config::NextMedConfig;
use crate::core::ingestion::AudioReference;
use crate::core::transcription::artifact::extract_transcript;
use crate::domain::ids::JobName;
use crate::domain::{ExternalServiceError, NextMedError, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Fixed job parameters and wait bounds
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub language_code: String,
    pub media_format: String,
    pub output_bucket: String,
    pub poll_interval: Duration,
    pub job_timeout: Duration,
}

impl OrchestratorSettings {
    pub fn from_config(config: &NextMedConfig) -> Self {
        Self {
            language_code: config.transcription.language_code.clone(),
            media_format: config.transcription.media_format.clone(),
            output_bucket: config.output_bucket().to_string(),
            poll_interval: Duration::from_secs(config.transcription.poll_interval_seconds),
            job_timeout: Duration::from_secs(config.transcription.job_timeout_seconds),
        }
    }
}

/// A finished transcription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionOutcome {
    pub job_name: JobName,
    pub transcript: String,
}

/// Drives one transcription job to completion
pub struct TranscriptionOrchestrator {
    backend: Arc<dyn TranscriptionBackend>,
    store: Arc<dyn ObjectStore>,
    settings: OrchestratorSettings,
}

impl TranscriptionOrchestrator {
    pub fn new(
        backend: Arc<dyn TranscriptionBackend>,
        store: Arc<dyn ObjectStore>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            backend,
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Transcribe stored audio
    ///
    /// # Arguments
    ///
    /// * `audio` - Reference returned by ingestion
    /// * `cancel` - Flips to `true` when the caller abandons the work
    ///
    /// # Errors
    ///
    /// - `ExternalServiceError::JobSubmissionFailed` / `JobStatusFailed` when a backend call fails
    /// - `ExternalServiceError::JobFailed` when the job ends in `FAILED`
    /// - `NextMedError::Timeout` when the job is not done within `job_timeout`
    /// - `NextMedError::Cancelled` when `cancel` fires
    /// - `NextMedError::TranscriptFormat` when the artifact has the wrong shape
    pub async fn run(
        &self,
        audio: &AudioReference,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<TranscriptionOutcome> {
        let started = Instant::now();
        let job_name = JobName::generate();

        if *cancel.borrow() {
            return Err(NextMedError::Cancelled(format!(
                "Transcription of {} cancelled before submission",
                audio.key
            )));
        }

        let request = TranscriptionJobRequest {
            job_name: job_name.clone(),
            language_code: self.settings.language_code.clone(),
            media_format: self.settings.media_format.clone(),
            media_uri: audio.uri.clone(),
            output_bucket: self.settings.output_bucket.clone(),
        };
        self.backend.submit_job(&request).await?;

        let polls = match tokio::time::timeout(
            self.settings.job_timeout,
            self.wait_for_completion(&job_name, &mut cancel),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    job_name = %job_name,
                    timeout_secs = self.settings.job_timeout.as_secs(),
                    "Transcription job did not finish in time"
                );
                return Err(NextMedError::Timeout(format!(
                    "Transcription job {} did not complete within {} seconds",
                    job_name,
                    self.settings.job_timeout.as_secs()
                )));
            }
        };

        let artifact = self
            .store
            .get(&self.settings.output_bucket, &job_name.result_key())
            .await?;
        let transcript = extract_transcript(&artifact)?;

        crate::log_pipeline_stage!(
            "transcription",
            started,
            job_name = %job_name,
            polls = polls,
            transcript_chars = transcript.chars().count()
        );

        Ok(TranscriptionOutcome {
            job_name,
            transcript,
        })
    }

    /// Poll until the job is terminal; returns the number of polls made
    async fn wait_for_completion(
        &self,
        job_name: &JobName,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<u32> {
        let mut polls = 0u32;
        loop {
            let report = self.backend.job_status(job_name).await?;
            polls += 1;

            tracing::debug!(
                job_name = %job_name,
                status = %report.status,
                polls,
                "Polled transcription job"
            );

            match report.status {
                JobState::Completed => return Ok(polls),
                JobState::Failed => {
                    return Err(ExternalServiceError::JobFailed {
                        job_name: job_name.to_string(),
                        reason: report
                            .failure_reason
                            .unwrap_or_else(|| "no failure reason reported".to_string()),
                    }
                    .into())
                }
                JobState::Queued | JobState::InProgress => {}
            }

            tokio::select! {
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
                _ = cancelled(cancel) => {
                    tracing::info!(job_name = %job_name, "Transcription wait cancelled");
                    return Err(NextMedError::Cancelled(format!(
                        "Transcription job {} abandoned",
                        job_name
                    )));
                }
            }
        }
    }
}

/// Resolves once the flag is `true`; never resolves if the sender is gone
pub(crate) async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
