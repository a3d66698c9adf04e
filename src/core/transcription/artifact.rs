//! Transcription result artifact parsing

use crate::domain::{NextMedError, Result};
use serde_json::Value;

/// Message returned when the artifact does not have the expected shape
pub const TRANSCRIPT_FORMAT_MESSAGE: &str = "Transcription data is not in the expected format.";

/// Extract the transcript text from a result artifact
///
/// The artifact must contain `results.transcripts[0].transcript` as a string.
///
/// # Errors
///
/// Returns `NextMedError::TranscriptFormat` if the bytes are not JSON or the
/// path is absent or not a string.
///
/// # Examples
///
/// ```
/// use nextmed::core::transcription::extract_transcript;
///
/// let artifact = br#"{"results":{"transcripts":[{"transcript":"Patient is 34."}]}}"#;
/// assert_eq!(extract_transcript(artifact).unwrap(), "Patient is 34.");
/// ```
pub fn extract_transcript(artifact: &[u8]) -> Result<String> {
    let value: Value = serde_json::from_slice(artifact)
        .map_err(|_| NextMedError::TranscriptFormat(TRANSCRIPT_FORMAT_MESSAGE.to_string()))?;

    value
        .pointer("/results/transcripts/0/transcript")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| NextMedError::TranscriptFormat(TRANSCRIPT_FORMAT_MESSAGE.to_string()))
}
