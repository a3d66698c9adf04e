//! Background pipeline jobs
//!
//! Audio pipelines run on their own tokio task instead of inside the request
//! handler. The registry tracks each job's status, owns its cancellation
//! channel, and lets callers wait for completion with a deadline.
//!
//! ```text
//! Submitted -> Running -> Completed
//!                      -> Failed
//!                      -> Cancelled
//! ```
//!
//! Terminal states are final.

use crate::core::ingestion::AudioUpload;
use crate::core::pipeline::{PipelineCoordinator, PipelineOutcome, PipelineRequest};
use crate::domain::{DoctorId, NextMedError, PatientId, PipelineJobId, Result, TemplateId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch, RwLock};

/// Status of a pipeline job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineJobStatus {
    Submitted,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl PipelineJobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineJobStatus::Completed | PipelineJobStatus::Failed | PipelineJobStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineJobStatus::Submitted => "submitted",
            PipelineJobStatus::Running => "running",
            PipelineJobStatus::Completed => "completed",
            PipelineJobStatus::Failed => "failed",
            PipelineJobStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PipelineJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a pipeline job
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineJob {
    #[serde(rename = "jobId")]
    pub id: PipelineJobId,
    pub status: PipelineJobStatus,
    pub template_id: TemplateId,
    pub doctor_id: DoctorId,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Set once the job completes
    pub patient_id: Option<PatientId>,

    /// Set once the job fails or is cancelled
    pub error: Option<String>,
}

struct JobEntry {
    job: PipelineJob,
    cancel: Arc<watch::Sender<bool>>,
}

/// How a bounded wait on a job ended
#[derive(Debug)]
pub enum WaitOutcome {
    /// The job finished within the deadline
    Finished(Result<PipelineOutcome>),
    /// The deadline passed; the job keeps running detached
    Pending(PipelineJobId),
}

/// Flips the cancellation flag when dropped while armed
///
/// Held by a waiting request handler: if the handler future is dropped
/// because the client went away, the job is cancelled with it.
pub struct CancelOnDrop {
    cancel: Arc<watch::Sender<bool>>,
    armed: bool,
}

impl CancelOnDrop {
    fn new(cancel: Arc<watch::Sender<bool>>) -> Self {
        Self {
            cancel,
            armed: true,
        }
    }

    /// Stop the guard from cancelling on drop
    pub fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.cancel.send_replace(true);
        }
    }
}

/// Handle to a submitted job
pub struct JobHandle {
    pub id: PipelineJobId,
    completion: oneshot::Receiver<Result<PipelineOutcome>>,
    cancel: Arc<watch::Sender<bool>>,
}

impl JobHandle {
    /// Wait for the job for at most `deadline`
    ///
    /// Dropping the returned future before it resolves cancels the job.
    pub async fn wait(self, deadline: Duration) -> WaitOutcome {
        let mut guard = CancelOnDrop::new(self.cancel);

        let outcome = match tokio::time::timeout(deadline, self.completion).await {
            Ok(Ok(result)) => WaitOutcome::Finished(result),
            Ok(Err(_)) => WaitOutcome::Finished(Err(NextMedError::Other(format!(
                "Pipeline job {} ended without reporting a result",
                self.id
            )))),
            Err(_) => {
                tracing::info!(
                    job_id = %self.id,
                    wait_secs = deadline.as_secs(),
                    "Pipeline job still running, detaching from request"
                );
                WaitOutcome::Pending(self.id)
            }
        };

        guard.disarm();
        outcome
    }
}

/// Registry of background pipeline jobs
#[derive(Clone)]
pub struct JobRegistry {
    coordinator: Arc<PipelineCoordinator>,
    jobs: Arc<RwLock<HashMap<PipelineJobId, JobEntry>>>,
}

impl JobRegistry {
    pub fn new(coordinator: Arc<PipelineCoordinator>) -> Self {
        Self {
            coordinator,
            jobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn coordinator(&self) -> &Arc<PipelineCoordinator> {
        &self.coordinator
    }

    /// Validate a request and start its pipeline in the background
    ///
    /// # Errors
    ///
    /// Input errors (bad ids, unknown template, bad upload) are returned
    /// here and no job is created.
    pub async fn submit(&self, request: PipelineRequest) -> Result<JobHandle> {
        let target = self
            .coordinator
            .resolve_target(&request.template_id, &request.doctor_id)
            .await?;
        request
            .upload
            .validate(self.coordinator.ingestor().max_upload_bytes())?;

        let now = Utc::now();
        let id = PipelineJobId::new();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let cancel_tx = Arc::new(cancel_tx);
        let (done_tx, done_rx) = oneshot::channel();

        let job = PipelineJob {
            id,
            status: PipelineJobStatus::Submitted,
            template_id: target.template.id,
            doctor_id: target.doctor_id,
            submitted_at: now,
            updated_at: now,
            patient_id: None,
            error: None,
        };
        self.jobs.write().await.insert(
            id,
            JobEntry {
                job,
                cancel: cancel_tx.clone(),
            },
        );
        tracing::info!(
            job_id = %id,
            template_id = %target.template.id,
            doctor_id = %target.doctor_id,
            "Pipeline job submitted"
        );

        let registry = self.clone();
        let upload: AudioUpload = request.upload;
        tokio::spawn(async move {
            registry.transition(id, PipelineJobStatus::Running, None, None).await;

            let result = registry
                .coordinator
                .run_resolved(target, upload, cancel_rx)
                .await;
            registry.finish(id, &result).await;

            // The receiver is gone when nobody waits; the status stays queryable.
            let _ = done_tx.send(result);
        });

        Ok(JobHandle {
            id,
            completion: done_rx,
            cancel: cancel_tx,
        })
    }

    /// Current snapshot of a job
    ///
    /// # Errors
    ///
    /// Returns `NextMedError::NotFound` for an unknown id.
    pub async fn get(&self, id: &PipelineJobId) -> Result<PipelineJob> {
        self.jobs
            .read()
            .await
            .get(id)
            .map(|entry| entry.job.clone())
            .ok_or_else(|| NextMedError::NotFound(format!("Pipeline job {id} not found")))
    }

    /// Request cancellation of a job
    ///
    /// Terminal jobs are left untouched. The status becomes `cancelled` once
    /// the pipeline observes the request.
    ///
    /// # Errors
    ///
    /// Returns `NextMedError::NotFound` for an unknown id.
    pub async fn cancel(&self, id: &PipelineJobId) -> Result<PipelineJob> {
        let jobs = self.jobs.read().await;
        let entry = jobs
            .get(id)
            .ok_or_else(|| NextMedError::NotFound(format!("Pipeline job {id} not found")))?;

        if !entry.job.status.is_terminal() {
            entry.cancel.send_replace(true);
            tracing::info!(job_id = %id, "Pipeline job cancellation requested");
        }
        Ok(entry.job.clone())
    }

    /// Cancel every job that has not finished; returns how many were signalled
    pub async fn cancel_all(&self) -> usize {
        let jobs = self.jobs.read().await;
        let mut signalled = 0;
        for entry in jobs.values().filter(|e| !e.job.status.is_terminal()) {
            entry.cancel.send_replace(true);
            signalled += 1;
        }
        if signalled > 0 {
            tracing::warn!(jobs = signalled, "Cancelling outstanding pipeline jobs");
        }
        signalled
    }

    /// Drop finished jobs last updated more than `older_than` ago
    pub async fn prune_finished(&self, older_than: Duration) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(older_than).unwrap_or(chrono::Duration::zero());
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, e| !(e.job.status.is_terminal() && e.job.updated_at < cutoff));
        let pruned = before - jobs.len();
        if pruned > 0 {
            tracing::debug!(pruned, remaining = jobs.len(), "Pruned finished pipeline jobs");
        }
        pruned
    }

    /// Jobs that have not reached a terminal state
    pub async fn active_count(&self) -> usize {
        self.jobs
            .read()
            .await
            .values()
            .filter(|e| !e.job.status.is_terminal())
            .count()
    }

    async fn finish(&self, id: PipelineJobId, result: &Result<PipelineOutcome>) {
        match result {
            Ok(outcome) => {
                self.transition(
                    id,
                    PipelineJobStatus::Completed,
                    Some(outcome.patient.id),
                    None,
                )
                .await
            }
            Err(NextMedError::Cancelled(reason)) => {
                self.transition(id, PipelineJobStatus::Cancelled, None, Some(reason.clone()))
                    .await
            }
            Err(e) => {
                crate::log_error_with_context!(e, "Pipeline job failed");
                self.transition(id, PipelineJobStatus::Failed, None, Some(e.to_string()))
                    .await
            }
        }
    }

    async fn transition(
        &self,
        id: PipelineJobId,
        to: PipelineJobStatus,
        patient_id: Option<PatientId>,
        error: Option<String>,
    ) {
        let mut jobs = self.jobs.write().await;
        let Some(entry) = jobs.get_mut(&id) else {
            return;
        };
        let from = entry.job.status;
        if from.is_terminal() {
            return;
        }

        entry.job.status = to;
        entry.job.updated_at = Utc::now();
        if patient_id.is_some() {
            entry.job.patient_id = patient_id;
        }
        if error.is_some() {
            entry.job.error = error;
        }
        crate::log_job_transition!(id, from, to);
    }
}
