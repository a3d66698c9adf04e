//! Integration tests for background pipeline jobs

mod common;

use common::*;
use nextmed::config::MappingStrategy;
use nextmed::core::jobs::{JobRegistry, PipelineJobStatus, WaitOutcome};
use nextmed::core::pipeline::PipelineRequest;
use nextmed::domain::{NextMedError, PipelineJobId};
use std::sync::Arc;
use std::time::Duration;

fn request(harness: &Harness) -> PipelineRequest {
    PipelineRequest {
        upload: upload(),
        template_id: harness.template.id.to_string(),
        doctor_id: harness.doctor_id.to_string(),
    }
}

async fn stuck_harness() -> Harness {
    let store = Arc::new(FakeObjectStore::default());
    Harness::new(
        store.clone(),
        FakeTranscriptionBackend::stuck(store),
        FakeEntityExtractor::returning(scenario_entities()),
        MappingStrategy::Entity,
    )
    .await
}

/// Let spawned job tasks run until they block again
async fn settle(registry: &JobRegistry, id: &PipelineJobId, status: PipelineJobStatus) {
    for _ in 0..100 {
        if registry.get(id).await.unwrap().status == status {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("job {id} never reached {status}");
}

#[tokio::test(start_paused = true)]
async fn test_job_completes_within_wait() {
    let harness = Harness::happy().await;
    let registry = JobRegistry::new(harness.coordinator.clone());

    let handle = registry.submit(request(&harness)).await.unwrap();
    let id = handle.id;

    match handle.wait(Duration::from_secs(30)).await {
        WaitOutcome::Finished(Ok(outcome)) => assert_eq!(outcome.patient.name, "Jane"),
        other => panic!("unexpected outcome: {other:?}"),
    }

    let job = registry.get(&id).await.unwrap();
    assert_eq!(job.status, PipelineJobStatus::Completed);
    assert!(job.patient_id.is_some());
    assert!(job.error.is_none());
    assert_eq!(registry.active_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_wait_deadline_detaches_job() {
    let harness = stuck_harness().await;
    let registry = JobRegistry::new(harness.coordinator.clone());

    let handle = registry.submit(request(&harness)).await.unwrap();
    let id = handle.id;

    match handle.wait(Duration::from_secs(10)).await {
        WaitOutcome::Pending(pending) => assert_eq!(pending, id),
        other => panic!("unexpected outcome: {other:?}"),
    }

    // Still running after the waiter went away
    assert_eq!(registry.get(&id).await.unwrap().status, PipelineJobStatus::Running);
    assert_eq!(registry.active_count().await, 1);

    // It keeps going until the transcription timeout
    settle(&registry, &id, PipelineJobStatus::Failed).await;
    let job = registry.get(&id).await.unwrap();
    assert!(job.error.is_some_and(|e| e.contains("did not complete")));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_running_job() {
    let harness = stuck_harness().await;
    let registry = JobRegistry::new(harness.coordinator.clone());

    let handle = registry.submit(request(&harness)).await.unwrap();
    let id = handle.id;
    drop(handle);

    settle(&registry, &id, PipelineJobStatus::Running).await;
    registry.cancel(&id).await.unwrap();
    settle(&registry, &id, PipelineJobStatus::Cancelled).await;

    assert_eq!(harness.database.patient_count().await, 0);

    // Terminal jobs are final
    let again = registry.cancel(&id).await.unwrap();
    assert_eq!(again.status, PipelineJobStatus::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_waiter_cancels_job() {
    let harness = stuck_harness().await;
    let registry = JobRegistry::new(harness.coordinator.clone());

    let handle = registry.submit(request(&harness)).await.unwrap();
    let id = handle.id;

    // The client disconnects while the request is still waiting
    let waiter = tokio::spawn(handle.wait(Duration::from_secs(300)));
    tokio::time::sleep(Duration::from_secs(6)).await;
    waiter.abort();

    settle(&registry, &id, PipelineJobStatus::Cancelled).await;
}

#[tokio::test(start_paused = true)]
async fn test_invalid_request_creates_no_job() {
    let harness = Harness::happy().await;
    let registry = JobRegistry::new(harness.coordinator.clone());

    let mut req = request(&harness);
    req.upload.bytes = bytes::Bytes::new();

    let err = registry.submit(req).await.err().unwrap();
    assert!(matches!(err, NextMedError::Validation(ref m) if m == "No file uploaded."));
    assert_eq!(registry.active_count().await, 0);
    assert_eq!(harness.backend.submissions(), 0);
}

#[tokio::test]
async fn test_unknown_job_not_found() {
    let harness = Harness::happy().await;
    let registry = JobRegistry::new(harness.coordinator.clone());

    let id = PipelineJobId::new();
    assert!(matches!(registry.get(&id).await, Err(NextMedError::NotFound(_))));
    assert!(matches!(registry.cancel(&id).await, Err(NextMedError::NotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_all_and_prune() {
    let harness = stuck_harness().await;
    let registry = JobRegistry::new(harness.coordinator.clone());

    let first = registry.submit(request(&harness)).await.unwrap().id;
    let second = registry.submit(request(&harness)).await.unwrap().id;
    settle(&registry, &first, PipelineJobStatus::Running).await;
    settle(&registry, &second, PipelineJobStatus::Running).await;

    assert_eq!(registry.cancel_all().await, 2);
    settle(&registry, &first, PipelineJobStatus::Cancelled).await;
    settle(&registry, &second, PipelineJobStatus::Cancelled).await;
    assert_eq!(registry.cancel_all().await, 0);

    // Nothing is older than an hour yet
    assert_eq!(registry.prune_finished(Duration::from_secs(3600)).await, 0);
    assert_eq!(registry.prune_finished(Duration::ZERO).await, 2);
    assert!(registry.get(&first).await.is_err());
}
