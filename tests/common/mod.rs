//! Shared fixtures for integration tests
//!
//! In-process fakes for the three cloud collaborators, plus helpers that
//! wire a pipeline over the in-memory database.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use nextmed::adapters::cloud::{
    EntityDetection, EntityExtractor, EntityVocabulary, JobState, JobStatusReport, ObjectRef,
    ObjectStore, TranscriptionBackend, TranscriptionJobRequest,
};
use nextmed::adapters::database::{Database, TemplateRepository};
use nextmed::adapters::memory::MemoryDatabase;
use nextmed::config::MappingStrategy;
use nextmed::core::ingestion::{AudioIngestor, AudioUpload};
use nextmed::core::mapping::mapper_for;
use nextmed::core::pipeline::PipelineCoordinator;
use nextmed::core::transcription::{OrchestratorSettings, TranscriptionOrchestrator};
use nextmed::domain::{
    DoctorId, ExternalServiceError, ExtractedEntity, Field, FieldType, JobName, Result, Template,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const AUDIO_BUCKET: &str = "nextmed-audio";
pub const OUTPUT_BUCKET: &str = "nextmed-transcripts";
pub const MAX_UPLOAD_BYTES: usize = 1024 * 1024;
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const JOB_TIMEOUT: Duration = Duration::from_secs(60);

pub const SCENARIO_TRANSCRIPT: &str = "My name is Jane, I am 34 years old, I have a headache";

/// Result artifact in the transcription backend's format
pub fn artifact(transcript: &str) -> Vec<u8> {
    serde_json::json!({
        "jobName": "transcription_test",
        "results": { "transcripts": [{ "transcript": transcript }], "items": [] }
    })
    .to_string()
    .into_bytes()
}

/// Entities a medical recognizer returns for [`SCENARIO_TRANSCRIPT`]
pub fn scenario_entities() -> Vec<ExtractedEntity> {
    vec![
        ExtractedEntity::new("NAME", "Jane"),
        ExtractedEntity::new("AGE", "34"),
        ExtractedEntity::new("DX_NAME", "headache").with_trait("SYMPTOM"),
    ]
}

pub fn upload() -> AudioUpload {
    AudioUpload::new(
        "visit.mp3",
        Some("audio/mpeg".to_string()),
        Bytes::from_static(b"ID3 fake mp3 payload"),
    )
}

/// Object store backed by a map of (bucket, key)
#[derive(Default)]
pub struct FakeObjectStore {
    pub objects: Mutex<HashMap<(String, String), Bytes>>,
    pub fail_put: bool,
}

impl FakeObjectStore {
    pub fn insert(&self, bucket: &str, key: &str, bytes: impl Into<Bytes>) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), bytes.into());
    }

    pub fn keys_in(&self, bucket: &str) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn put(&self, key: &str, bytes: Bytes, _content_type: Option<&str>) -> Result<ObjectRef> {
        if self.fail_put {
            return Err(ExternalServiceError::UploadFailed("bucket unavailable".to_string()).into());
        }
        self.insert(AUDIO_BUCKET, key, bytes);
        Ok(ObjectRef::new(AUDIO_BUCKET, key))
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| {
                ExternalServiceError::DownloadFailed(format!("{bucket}/{key} does not exist"))
                    .into()
            })
    }

    fn bucket(&self) -> &str {
        AUDIO_BUCKET
    }
}

/// Transcription backend that replays scripted status reports
///
/// After the script runs out the last report repeats. On submission the
/// configured artifact is written to the output bucket.
pub struct FakeTranscriptionBackend {
    store: Arc<FakeObjectStore>,
    script: Mutex<VecDeque<JobStatusReport>>,
    last: Mutex<JobStatusReport>,
    artifact: Option<Vec<u8>>,
    pub submitted: Mutex<Vec<TranscriptionJobRequest>>,
    pub polls: AtomicUsize,
}

impl FakeTranscriptionBackend {
    pub fn new(
        store: Arc<FakeObjectStore>,
        script: Vec<JobStatusReport>,
        artifact: Option<Vec<u8>>,
    ) -> Self {
        let last = script
            .last()
            .cloned()
            .unwrap_or_else(|| JobStatusReport::new(JobState::Completed));
        Self {
            store,
            script: Mutex::new(script.into()),
            last: Mutex::new(last),
            artifact,
            submitted: Mutex::new(Vec::new()),
            polls: AtomicUsize::new(0),
        }
    }

    /// Completes after one in-progress poll
    pub fn completing(store: Arc<FakeObjectStore>, transcript: &str) -> Self {
        Self::new(
            store,
            vec![
                JobStatusReport::new(JobState::InProgress),
                JobStatusReport::new(JobState::Completed),
            ],
            Some(artifact(transcript)),
        )
    }

    /// Never leaves the in-progress state
    pub fn stuck(store: Arc<FakeObjectStore>) -> Self {
        Self::new(store, vec![JobStatusReport::new(JobState::InProgress)], None)
    }

    pub fn submissions(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }
}

#[async_trait]
impl TranscriptionBackend for FakeTranscriptionBackend {
    async fn submit_job(&self, request: &TranscriptionJobRequest) -> Result<()> {
        if let Some(ref artifact) = self.artifact {
            self.store.insert(
                &request.output_bucket,
                &request.job_name.result_key(),
                artifact.clone(),
            );
        }
        self.submitted.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn job_status(&self, _job_name: &JobName) -> Result<JobStatusReport> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        Ok(match next {
            Some(report) => {
                *self.last.lock().unwrap() = report.clone();
                report
            }
            None => self.last.lock().unwrap().clone(),
        })
    }
}

/// Entity extractor returning a fixed list
#[derive(Default)]
pub struct FakeEntityExtractor {
    pub entities: Vec<ExtractedEntity>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FakeEntityExtractor {
    pub fn returning(entities: Vec<ExtractedEntity>) -> Self {
        Self {
            entities,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl EntityExtractor for FakeEntityExtractor {
    async fn detect_entities(&self, _text: &str) -> Result<EntityDetection> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(
                ExternalServiceError::EntityDetectionFailed("throttled".to_string()).into(),
            );
        }
        Ok(EntityDetection {
            raw: serde_json::json!({ "Entities": self.entities.len() }),
            entities: self.entities.clone(),
        })
    }

    fn vocabulary(&self) -> EntityVocabulary {
        EntityVocabulary::Medical
    }
}

/// A pipeline wired over fakes and the in-memory database
pub struct Harness {
    pub coordinator: Arc<PipelineCoordinator>,
    pub database: Arc<MemoryDatabase>,
    pub store: Arc<FakeObjectStore>,
    pub backend: Arc<FakeTranscriptionBackend>,
    pub extractor: Arc<FakeEntityExtractor>,
    pub template: Template,
    pub doctor_id: DoctorId,
}

impl Harness {
    pub async fn new(
        store: Arc<FakeObjectStore>,
        backend: FakeTranscriptionBackend,
        extractor: FakeEntityExtractor,
        strategy: MappingStrategy,
    ) -> Self {
        let database = Arc::new(MemoryDatabase::new());
        let template = gynecology_template();
        database.insert_template(&template).await.unwrap();

        let backend = Arc::new(backend);
        let extractor = Arc::new(extractor);
        let settings = OrchestratorSettings {
            language_code: "en-US".to_string(),
            media_format: "mp3".to_string(),
            output_bucket: OUTPUT_BUCKET.to_string(),
            poll_interval: POLL_INTERVAL,
            job_timeout: JOB_TIMEOUT,
        };

        let coordinator = PipelineCoordinator::new(
            Arc::new(AudioIngestor::new(store.clone(), MAX_UPLOAD_BYTES)),
            Arc::new(TranscriptionOrchestrator::new(
                backend.clone(),
                store.clone(),
                settings,
            )),
            extractor.clone(),
            mapper_for(strategy).unwrap(),
            database.clone() as Arc<dyn Database>,
        );

        Self {
            coordinator: Arc::new(coordinator),
            database,
            store,
            backend,
            extractor,
            template,
            doctor_id: DoctorId::new(),
        }
    }

    /// Completing backend, scenario entities, entity strategy
    pub async fn happy() -> Self {
        let store = Arc::new(FakeObjectStore::default());
        let backend = FakeTranscriptionBackend::completing(store.clone(), SCENARIO_TRANSCRIPT);
        Self::new(
            store,
            backend,
            FakeEntityExtractor::returning(scenario_entities()),
            MappingStrategy::Entity,
        )
        .await
    }

    pub fn database(&self) -> Arc<dyn Database> {
        self.database.clone()
    }
}

pub fn gynecology_template() -> Template {
    Template::builder()
        .name("Gynecology Initial Visit")
        .specialty("Gynecology")
        .field(Field::new("Patient Age", FieldType::Number, true))
        .field(Field::new("Symptoms", FieldType::Text, true))
        .field(Field::new("Last Menstrual Period", FieldType::Date, false))
        .build()
        .unwrap()
}
