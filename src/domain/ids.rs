//! Domain identifier types with validation
//!
//! Records are keyed by generated UUIDs. Each record kind gets its own
//! newtype so a patient id can never be passed where a template id is
//! expected. Transcription jobs are the exception: their names are assigned
//! by the caller before submission, see [`JobName`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parses an identifier from its string form
            ///
            /// # Errors
            ///
            /// Returns a message naming the identifier kind when the input
            /// is empty or not a UUID.
            pub fn parse(value: &str) -> Result<Self, String> {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(format!("{} is required", $label));
                }
                Uuid::parse_str(trimmed)
                    .map(Self)
                    .map_err(|_| format!("Invalid {} format", $label))
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a [`Template`](crate::domain::Template)
    TemplateId,
    "template ID"
);

uuid_id!(
    /// Identifier of a [`Doctor`](crate::domain::Doctor)
    DoctorId,
    "doctor ID"
);

uuid_id!(
    /// Identifier of a [`Patient`](crate::domain::Patient)
    PatientId,
    "patient ID"
);

uuid_id!(
    /// Identifier of a persisted [`Transcription`](crate::domain::Transcription) audit record
    TranscriptionId,
    "transcription ID"
);

uuid_id!(
    /// Identifier of a background pipeline job
    PipelineJobId,
    "job ID"
);

/// Caller-assigned name of a transcription job
///
/// The transcription backend does not hand out identifiers; the job name is
/// chosen before submission and is also the stem of the result artifact key
/// (`{job_name}.json`).
///
/// # Examples
///
/// ```
/// use nextmed::domain::ids::JobName;
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
/// let name = JobName::generate_at(at);
/// assert!(name.as_str().starts_with("transcription_1700000000000_"));
/// assert_eq!(name.result_key(), format!("{}.json", name));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobName(String);

impl JobName {
    /// Generates a job name for the current instant
    pub fn generate() -> Self {
        Self::generate_at(Utc::now())
    }

    /// Generates a job name from a timestamp plus a short random suffix
    ///
    /// The suffix keeps two submissions within the same millisecond apart.
    pub fn generate_at(at: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("transcription_{}_{}", at.timestamp_millis(), &suffix[..8]))
    }

    /// Wraps an existing job name
    ///
    /// # Errors
    ///
    /// Job names may only contain ASCII letters, digits, `.`, `_` and `-`.
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        if name.is_empty() || name.len() > 200 {
            return Err("Job name must be between 1 and 200 characters".to_string());
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(format!("Invalid job name: {name}"));
        }
        Ok(Self(name))
    }

    /// Returns the job name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Object key of the result artifact written by the transcription backend
    pub fn result_key(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for JobName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
