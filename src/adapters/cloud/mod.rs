//! Cloud service abstraction layer
//!
//! Trait definitions for the object store, transcription backend and entity
//! extractor, plus the bundle the pipeline is built from.

pub mod traits;

pub use traits::{
    EntityDetection, EntityExtractor, EntityVocabulary, JobState, JobStatusReport, ObjectRef,
    ObjectStore, TranscriptionBackend, TranscriptionJobRequest,
};

use std::sync::Arc;

/// The three cloud collaborators of the pipeline
#[derive(Clone)]
pub struct CloudServices {
    pub object_store: Arc<dyn ObjectStore>,
    pub transcription: Arc<dyn TranscriptionBackend>,
    pub entities: Arc<dyn EntityExtractor>,
}
