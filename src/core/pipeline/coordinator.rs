//! Pipeline coordinator
//!
//! Runs one pipeline: ingestion, transcription, entity extraction, field
//! mapping, then a single atomic write of the patient and its transcription.
//! Nothing is persisted until every earlier stage has succeeded.

use crate::adapters::cloud::{CloudServices, EntityExtractor};
use crate::adapters::database::{Database, PatientRepository, TemplateRepository};
use crate::config::NextMedConfig;
use crate::core::ingestion::{AudioIngestor, AudioUpload};
use crate::core::mapping::{mapper_for, FieldMapper, MappingInput};
use crate::core::transcription::{OrchestratorSettings, TranscriptionOrchestrator};
use crate::domain::{
    DoctorId, JobName, NextMedError, Patient, Result, Template, TemplateId, Transcription,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Message returned for an incomplete `/process` request
pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields.";

/// Message returned when the requested template does not exist
pub const TEMPLATE_NOT_FOUND_MESSAGE: &str = "Template not found.";

/// Audio pipeline input
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub upload: AudioUpload,
    pub template_id: String,
    pub doctor_id: String,
}

/// Transcript-only pipeline input
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    #[serde(default)]
    pub transcription_text: String,
    #[serde(default)]
    pub doctor_id: String,
    #[serde(default)]
    pub template_id: String,
}

/// Result of a successful pipeline run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutcome {
    pub patient: Patient,
    pub transcription: Transcription,
}

/// Template and owner a run maps into, resolved before any external call
#[derive(Debug, Clone)]
pub struct PipelineTarget {
    pub template: Template,
    pub doctor_id: DoctorId,
}

/// Audio provenance attached to the audit record
struct AudioProvenance {
    key: String,
    job_name: JobName,
}

/// Coordinates the pipeline stages
pub struct PipelineCoordinator {
    ingestor: Arc<AudioIngestor>,
    orchestrator: Arc<TranscriptionOrchestrator>,
    extractor: Arc<dyn EntityExtractor>,
    mapper: Arc<dyn FieldMapper>,
    database: Arc<dyn Database>,
}

impl PipelineCoordinator {
    pub fn new(
        ingestor: Arc<AudioIngestor>,
        orchestrator: Arc<TranscriptionOrchestrator>,
        extractor: Arc<dyn EntityExtractor>,
        mapper: Arc<dyn FieldMapper>,
        database: Arc<dyn Database>,
    ) -> Self {
        Self {
            ingestor,
            orchestrator,
            extractor,
            mapper,
            database,
        }
    }

    /// Wire a coordinator from configuration and already-built collaborators
    ///
    /// # Errors
    ///
    /// Returns an error if the configured mapper cannot be built.
    pub fn from_config(
        config: &NextMedConfig,
        cloud: &CloudServices,
        database: Arc<dyn Database>,
    ) -> Result<Self> {
        let ingestor = AudioIngestor::new(
            cloud.object_store.clone(),
            config.server.max_upload_bytes(),
        );
        let orchestrator = TranscriptionOrchestrator::new(
            cloud.transcription.clone(),
            cloud.object_store.clone(),
            OrchestratorSettings::from_config(config),
        );

        Ok(Self::new(
            Arc::new(ingestor),
            Arc::new(orchestrator),
            cloud.entities.clone(),
            mapper_for(config.mapping.strategy)?,
            database,
        ))
    }

    pub fn ingestor(&self) -> &AudioIngestor {
        &self.ingestor
    }

    pub fn database(&self) -> &Arc<dyn Database> {
        &self.database
    }

    /// Parse the ids and load the template
    ///
    /// # Errors
    ///
    /// - `NextMedError::Validation` when an id is blank or malformed
    /// - `NextMedError::NotFound` when the template does not exist
    pub async fn resolve_target(
        &self,
        template_id: &str,
        doctor_id: &str,
    ) -> Result<PipelineTarget> {
        if template_id.trim().is_empty() || doctor_id.trim().is_empty() {
            return Err(NextMedError::Validation(MISSING_FIELDS_MESSAGE.to_string()));
        }
        let template_id = TemplateId::parse(template_id).map_err(NextMedError::Validation)?;
        let doctor_id = DoctorId::parse(doctor_id).map_err(NextMedError::Validation)?;

        let template = self
            .database
            .get_template(&template_id)
            .await?
            .ok_or_else(|| NextMedError::NotFound(TEMPLATE_NOT_FOUND_MESSAGE.to_string()))?;

        Ok(PipelineTarget {
            template,
            doctor_id,
        })
    }

    /// Run the full pipeline from uploaded audio
    ///
    /// # Errors
    ///
    /// Input errors are reported before any external call. Any later failure
    /// leaves no patient behind; uploaded audio and job output are not
    /// cleaned up.
    pub async fn run_from_audio(
        &self,
        request: PipelineRequest,
        cancel: watch::Receiver<bool>,
    ) -> Result<PipelineOutcome> {
        let target = self
            .resolve_target(&request.template_id, &request.doctor_id)
            .await?;
        request.upload.validate(self.ingestor.max_upload_bytes())?;
        self.run_resolved(target, request.upload, cancel).await
    }

    /// Run the audio pipeline for an already resolved target
    pub async fn run_resolved(
        &self,
        target: PipelineTarget,
        upload: AudioUpload,
        cancel: watch::Receiver<bool>,
    ) -> Result<PipelineOutcome> {
        let started = Instant::now();
        let audio = self.ingestor.ingest(&upload).await?;
        let transcribed = self.orchestrator.run(&audio, cancel.clone()).await?;

        if *cancel.borrow() {
            return Err(NextMedError::Cancelled(format!(
                "Pipeline for job {} cancelled after transcription",
                transcribed.job_name
            )));
        }

        let provenance = AudioProvenance {
            key: audio.key,
            job_name: transcribed.job_name,
        };
        let outcome = self
            .complete(&target, &transcribed.transcript, Some(provenance))
            .await?;

        crate::log_pipeline_stage!(
            "pipeline",
            started,
            patient_id = %outcome.patient.id,
            template_id = %target.template.id,
            doctor_id = %target.doctor_id
        );
        Ok(outcome)
    }

    /// Run extraction and mapping for a transcript supplied by the caller
    ///
    /// # Errors
    ///
    /// - `NextMedError::Validation("Missing required fields.")` for empty text or ids
    /// - `NextMedError::NotFound("Template not found.")` for an unknown template
    pub async fn process_transcript(&self, request: ProcessRequest) -> Result<PipelineOutcome> {
        if request.transcription_text.trim().is_empty() {
            return Err(NextMedError::Validation(MISSING_FIELDS_MESSAGE.to_string()));
        }
        let target = self
            .resolve_target(&request.template_id, &request.doctor_id)
            .await?;
        self.complete(&target, &request.transcription_text, None).await
    }

    async fn complete(
        &self,
        target: &PipelineTarget,
        transcript: &str,
        audio: Option<AudioProvenance>,
    ) -> Result<PipelineOutcome> {
        let started = Instant::now();
        let detection = self.extractor.detect_entities(transcript).await?;
        crate::log_pipeline_stage!(
            "extraction",
            started,
            entity_count = detection.entities.len()
        );

        let started = Instant::now();
        let mapped = self.mapper.map(&MappingInput {
            template: &target.template,
            transcript,
            entities: &detection.entities,
        });
        let present = mapped.fields.values().filter(|v| v.is_present()).count();
        crate::log_pipeline_stage!(
            "mapping",
            started,
            strategy = %self.mapper.strategy(),
            fields_present = present,
            fields_total = mapped.fields.len()
        );

        let patient = Patient::new(
            Some(mapped.patient_name),
            target.template.id,
            target.doctor_id,
            mapped.fields,
        );
        let mut transcription =
            Transcription::new(target.doctor_id, patient.id, transcript, detection.raw);
        if let Some(audio) = audio {
            transcription = transcription.with_audio(audio.key, audio.job_name);
        }

        self.database
            .create_patient_with_transcription(&patient, Some(&transcription))
            .await?;

        tracing::info!(
            patient_id = %patient.id,
            transcription_id = %transcription.id,
            template_id = %target.template.id,
            doctor_id = %target.doctor_id,
            "Patient record created"
        );

        Ok(PipelineOutcome {
            patient,
            transcription,
        })
    }
}
