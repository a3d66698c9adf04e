//! Patient domain model

use super::ids::{DoctorId, PatientId, TemplateId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name given to a patient when none could be extracted
pub const UNKNOWN_PATIENT_NAME: &str = "Unknown";

/// Value of a single patient field
///
/// `Missing` records that the field was looked for and nothing was found.
/// It serializes as JSON `null`, so a legitimately extracted literal such as
/// `"N/A"` stays distinguishable from an absent value.
///
/// # Examples
///
/// ```
/// use nextmed::domain::patient::FieldValue;
///
/// assert_eq!(serde_json::to_string(&FieldValue::Missing).unwrap(), "null");
/// assert_eq!(serde_json::to_string(&FieldValue::from("34")).unwrap(), "\"34\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum FieldValue {
    /// A value extracted for the field
    Present(String),
    /// No value could be found
    #[default]
    Missing,
}

impl FieldValue {
    /// Returns the value if present
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            FieldValue::Present(value) => Some(value.as_str()),
            FieldValue::Missing => None,
        }
    }

    /// Whether a value is present
    pub fn is_present(&self) -> bool {
        matches!(self, FieldValue::Present(_))
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(v) => FieldValue::Present(v),
            None => FieldValue::Missing,
        }
    }
}

impl From<FieldValue> for Option<String> {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Present(v) => Some(v),
            FieldValue::Missing => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Present(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Present(value)
    }
}

/// Field name to value mapping of a patient record
///
/// Keys iterate in sorted order, which keeps serialized output stable.
pub type PatientFields = BTreeMap<String, FieldValue>;

/// A structured patient record produced by the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Unique identifier
    pub id: PatientId,

    /// Patient name, [`UNKNOWN_PATIENT_NAME`] when not extracted
    pub name: String,

    /// Template the record was mapped against
    pub template_id: TemplateId,

    /// Owning doctor
    pub doctor_id: DoctorId,

    /// Extracted field values keyed by template field name
    pub fields: PatientFields,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    /// Creates a new patient record with a fresh id
    pub fn new(
        name: Option<String>,
        template_id: TemplateId,
        doctor_id: DoctorId,
        fields: PatientFields,
    ) -> Self {
        let now = Utc::now();
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNKNOWN_PATIENT_NAME.to_string());

        Self {
            id: PatientId::new(),
            name,
            template_id,
            doctor_id,
            fields,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the value of a field, `None` when unset or missing
    pub fn field(&self, field_name: &str) -> Option<&str> {
        self.fields.get(field_name).and_then(FieldValue::as_deref)
    }
}
