//! Template domain model
//!
//! A template is an ordered schema of named, typed fields describing what a
//! patient record should contain. Templates without an owner are specialty-wide
//! defaults; templates with an owner are a doctor's personalised copy.

use super::ids::{DoctorId, TemplateId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Value type of a template field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text
    Text,
    /// Numeric value
    Number,
    /// Calendar date
    Date,
    /// Yes/no value
    Boolean,
    /// One of a fixed list of options
    Dropdown,
}

impl FieldType {
    /// Wire name of the field type
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
            FieldType::Dropdown => "dropdown",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(FieldType::Text),
            "number" => Ok(FieldType::Number),
            "date" => Ok(FieldType::Date),
            "boolean" => Ok(FieldType::Boolean),
            "dropdown" => Ok(FieldType::Dropdown),
            other => Err(format!(
                "Invalid field type '{other}'. Must be one of: text, number, date, boolean, dropdown"
            )),
        }
    }
}

/// A single named, typed slot within a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Field name, unique within its template
    pub field_name: String,

    /// Value type
    pub field_type: FieldType,

    /// Whether a value is expected for this field
    #[serde(default)]
    pub required: bool,

    /// Options for dropdown fields; empty for every other type
    #[serde(default)]
    pub options: Vec<String>,
}

impl Field {
    /// Creates a field without options
    pub fn new(field_name: impl Into<String>, field_type: FieldType, required: bool) -> Self {
        Self {
            field_name: field_name.into(),
            field_type,
            required,
            options: Vec::new(),
        }
    }

    /// Creates a dropdown field with the given options
    pub fn dropdown(
        field_name: impl Into<String>,
        required: bool,
        options: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            field_type: FieldType::Dropdown,
            required,
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    /// Validates the field
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or if options are given for a
    /// non-dropdown field.
    pub fn validate(&self) -> Result<(), String> {
        if self.field_name.trim().is_empty() {
            return Err("fieldName is required".to_string());
        }

        if self.field_type != FieldType::Dropdown && !self.options.is_empty() {
            return Err(format!(
                "Field '{}' of type {} cannot declare options",
                self.field_name, self.field_type
            ));
        }

        Ok(())
    }
}

/// A named, ordered schema of fields
///
/// # Examples
///
/// ```
/// use nextmed::domain::template::{Field, FieldType, Template};
///
/// let template = Template::builder()
///     .name("Gynecology Initial Visit")
///     .specialty("Gynecology")
///     .field(Field::new("Patient Age", FieldType::Number, true))
///     .field(Field::new("Symptoms", FieldType::Text, true))
///     .build()
///     .unwrap();
///
/// assert!(template.is_default());
/// assert_eq!(template.field_names(), vec!["Patient Age", "Symptoms"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Unique identifier
    pub id: TemplateId,

    /// Display name
    pub name: String,

    /// Medical specialty the template belongs to
    pub specialty: String,

    /// Owning doctor; `None` for specialty-wide defaults
    pub doctor_id: Option<DoctorId>,

    /// Fields in declaration order
    pub fields: Vec<Field>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Template {
    /// Returns a builder for constructing a Template
    pub fn builder() -> TemplateBuilder {
        TemplateBuilder::default()
    }

    /// Whether this is a specialty-wide default template
    pub fn is_default(&self) -> bool {
        self.doctor_id.is_none()
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.field_name.as_str()).collect()
    }

    /// Looks up a field by exact name
    pub fn field(&self, field_name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.field_name == field_name)
    }

    /// Creates an independent copy owned by `doctor_id`
    ///
    /// The copy gets a fresh id and timestamps; the receiver is not modified.
    pub fn fork_for(&self, doctor_id: DoctorId, name: impl Into<String>) -> Template {
        let now = Utc::now();
        Template {
            id: TemplateId::new(),
            name: name.into(),
            specialty: self.specialty.clone(),
            doctor_id: Some(doctor_id),
            fields: self.fields.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Validates the template and all of its fields
    ///
    /// # Errors
    ///
    /// Returns an error if name or specialty is blank, a field is invalid,
    /// or two fields share a name.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Template name is required".to_string());
        }
        if self.specialty.trim().is_empty() {
            return Err("Template specialty is required".to_string());
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            field.validate()?;
            if !seen.insert(field.field_name.as_str()) {
                return Err(format!(
                    "Duplicate field name '{}' in template",
                    field.field_name
                ));
            }
        }

        Ok(())
    }
}

/// Builder for constructing Template instances
#[derive(Debug, Default)]
pub struct TemplateBuilder {
    id: Option<TemplateId>,
    name: Option<String>,
    specialty: Option<String>,
    doctor_id: Option<DoctorId>,
    fields: Vec<Field>,
}

impl TemplateBuilder {
    /// Creates a new TemplateBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the template ID (a fresh one is generated otherwise)
    pub fn id(mut self, id: TemplateId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the template name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the specialty
    pub fn specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = Some(specialty.into());
        self
    }

    /// Sets the owning doctor
    pub fn doctor_id(mut self, doctor_id: DoctorId) -> Self {
        self.doctor_id = Some(doctor_id);
        self
    }

    /// Appends a field
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Replaces all fields
    pub fn fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    /// Builds and validates the Template
    ///
    /// # Errors
    ///
    /// Returns an error if name or specialty is missing or validation fails
    pub fn build(self) -> Result<Template, String> {
        let now = Utc::now();
        let template = Template {
            id: self.id.unwrap_or_default(),
            name: self.name.ok_or("Template name is required")?,
            specialty: self.specialty.ok_or("Template specialty is required")?,
            doctor_id: self.doctor_id,
            fields: self.fields,
            created_at: now,
            updated_at: now,
        };
        template.validate()?;
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gynecology() -> Template {
        Template::builder()
            .name("Gynecology Initial Visit")
            .specialty("Gynecology")
            .field(Field::new("Patient Age", FieldType::Number, true))
            .field(Field::new("Symptoms", FieldType::Text, true))
            .field(Field::new("Last Menstrual Period", FieldType::Date, false))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_name() {
        let result = Template::builder().specialty("Cardiology").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_field_names_rejected() {
        let result = Template::builder()
            .name("T")
            .specialty("S")
            .field(Field::new("Age", FieldType::Number, true))
            .field(Field::new("Age", FieldType::Text, false))
            .build();
        assert!(result.unwrap_err().contains("Duplicate field name"));
    }

    #[test]
    fn test_options_only_for_dropdown() {
        let mut field = Field::new("Diagnosis Category", FieldType::Text, false);
        field.options = vec!["Cold".to_string()];
        assert!(field.validate().is_err());

        let dropdown = Field::dropdown("Diagnosis Category", false, ["Cold", "Infection"]);
        assert!(dropdown.validate().is_ok());
    }

    #[test]
    fn test_blank_field_name_rejected() {
        let field = Field::new("  ", FieldType::Text, false);
        assert_eq!(field.validate().unwrap_err(), "fieldName is required");
    }

    #[test]
    fn test_fork_for_doctor_copies_fields() {
        let original = gynecology();
        let doctor = DoctorId::new();
        let fork = original.fork_for(doctor, "Gynecology Initial Visit");

        assert_ne!(fork.id, original.id);
        assert_eq!(fork.doctor_id, Some(doctor));
        assert_eq!(fork.fields, original.fields);
        assert!(original.is_default());
    }

    #[test]
    fn test_field_type_wire_format() {
        let field = Field::new("Checkup Date", FieldType::Date, true);
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["fieldName"], "Checkup Date");
        assert_eq!(json["fieldType"], "date");
        assert_eq!(json["options"], serde_json::json!([]));
    }

    #[test]
    fn test_field_type_from_str() {
        assert_eq!("Dropdown".parse::<FieldType>().unwrap(), FieldType::Dropdown);
        assert!("enum".parse::<FieldType>().is_err());
    }
}
