//! Speech-to-text orchestration
//!
//! - [`orchestrator`] - job submission, bounded polling, cancellation
//! - [`artifact`] - transcript extraction from the result artifact

pub mod artifact;
pub mod orchestrator;

pub use artifact::{extract_transcript, TRANSCRIPT_FORMAT_MESSAGE};
pub use orchestrator::{OrchestratorSettings, TranscriptionOrchestrator, TranscriptionOutcome};
