//! Transcription audit record and extracted entities

use super::ids::{DoctorId, JobName, PatientId, TranscriptionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A typed span found by the entity recognition service
///
/// `entity_type` uses the medical vocabulary (`NAME`, `AGE`, `GENDER`,
/// `DX_NAME`, `TEST_NAME`, ...). `traits` carries qualifiers such as
/// `SYMPTOM`, `DIAGNOSIS` or `NEGATION`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedEntity {
    /// Entity type tag
    #[serde(rename = "type")]
    pub entity_type: String,

    /// Text of the span as it appears in the transcript
    pub text: String,

    /// Entity category (e.g. `PROTECTED_HEALTH_INFORMATION`)
    #[serde(default)]
    pub category: Option<String>,

    /// Detection confidence in `[0, 1]`
    #[serde(default)]
    pub score: Option<f32>,

    /// Trait names attached to the entity
    #[serde(default)]
    pub traits: Vec<String>,

    /// Start offset in the transcript
    #[serde(default)]
    pub begin_offset: Option<i32>,

    /// End offset in the transcript
    #[serde(default)]
    pub end_offset: Option<i32>,
}

impl ExtractedEntity {
    /// Creates an entity with just a type and text
    pub fn new(entity_type: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            text: text.into(),
            category: None,
            score: None,
            traits: Vec::new(),
            begin_offset: None,
            end_offset: None,
        }
    }

    /// Adds a trait
    pub fn with_trait(mut self, name: impl Into<String>) -> Self {
        self.traits.push(name.into());
        self
    }

    /// Whether the entity carries the named trait (case-insensitive)
    pub fn has_trait(&self, name: &str) -> bool {
        self.traits.iter().any(|t| t.eq_ignore_ascii_case(name))
    }
}

/// Audit trail of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcription {
    /// Unique identifier
    pub id: TranscriptionId,

    /// Doctor who recorded the note
    pub doctor_id: DoctorId,

    /// Patient produced by the run
    pub patient_id: PatientId,

    /// Raw transcript text
    pub transcription_text: String,

    /// Raw payload returned by the entity recognition service
    pub extraction_result: serde_json::Value,

    /// Object key of the uploaded audio, when the run started from audio
    #[serde(default)]
    pub audio_key: Option<String>,

    /// Transcription job name, when the run started from audio
    #[serde(default)]
    pub job_name: Option<JobName>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Transcription {
    /// Creates an audit record for a text-only run
    pub fn new(
        doctor_id: DoctorId,
        patient_id: PatientId,
        transcription_text: impl Into<String>,
        extraction_result: serde_json::Value,
    ) -> Self {
        Self {
            id: TranscriptionId::new(),
            doctor_id,
            patient_id,
            transcription_text: transcription_text.into(),
            extraction_result,
            audio_key: None,
            job_name: None,
            created_at: Utc::now(),
        }
    }

    /// Attaches the audio object key and job name of an audio run
    pub fn with_audio(mut self, audio_key: impl Into<String>, job_name: JobName) -> Self {
        self.audio_key = Some(audio_key.into());
        self.job_name = Some(job_name);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_trait_lookup() {
        let entity = ExtractedEntity::new("DX_NAME", "headache").with_trait("SYMPTOM");
        assert!(entity.has_trait("symptom"));
        assert!(!entity.has_trait("NEGATION"));
    }

    #[test]
    fn test_entity_wire_format() {
        let entity = ExtractedEntity::new("AGE", "34");
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["type"], "AGE");
        assert_eq!(json["text"], "34");
    }

    #[test]
    fn test_transcription_with_audio() {
        let job = JobName::new("transcription_1").unwrap();
        let record = Transcription::new(
            DoctorId::new(),
            PatientId::new(),
            "text",
            serde_json::json!({"Entities": []}),
        )
        .with_audio("uploads/1_note.mp3", job.clone());
        assert_eq!(record.job_name, Some(job));
        assert_eq!(record.audio_key.as_deref(), Some("uploads/1_note.mp3"));
    }
}
