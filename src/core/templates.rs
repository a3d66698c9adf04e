//! Template management
//!
//! Default templates are specialty-wide and ownerless; doctors customize them
//! into owned copies. The store's uniqueness constraint on default
//! (name, specialty) pairs is the only duplicate check.

use crate::adapters::database::{Database, TemplateRepository};
use crate::domain::{DoctorId, Field, NextMedError, Result, Template, TemplateId};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Suffix appended to the name of a template forked by a field edit
pub const CUSTOMIZED_SUFFIX: &str = " (customized)";

/// Input for a new default template
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplate {
    pub name: String,
    pub specialty: String,
    pub fields: Vec<Field>,
}

/// A single incremental change to a template's fields
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    /// Append a field
    Add(Field),
    /// Remove the first field with this name; absent names are ignored
    Remove { field_name: String },
}

/// Where the result of a field edit was written
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "template", rename_all = "lowercase")]
pub enum EditOutcome {
    /// The template was changed in place
    Updated(Template),
    /// A new template owned by the doctor was created; the source is untouched
    Forked(Template),
}

impl EditOutcome {
    pub fn template(&self) -> &Template {
        match self {
            EditOutcome::Updated(t) | EditOutcome::Forked(t) => t,
        }
    }

    pub fn into_template(self) -> Template {
        match self {
            EditOutcome::Updated(t) | EditOutcome::Forked(t) => t,
        }
    }
}

/// Apply edits in order to a copy of `fields`
///
/// # Errors
///
/// Returns `NextMedError::Validation` if an added field is invalid or its
/// name is already taken.
pub fn apply_edits(fields: &[Field], edits: &[FieldEdit]) -> Result<Vec<Field>> {
    let mut result = fields.to_vec();

    for edit in edits {
        match edit {
            FieldEdit::Add(field) => {
                field.validate().map_err(NextMedError::Validation)?;
                if result.iter().any(|f| f.field_name == field.field_name) {
                    return Err(NextMedError::Validation(format!(
                        "Field '{}' already exists in template",
                        field.field_name
                    )));
                }
                result.push(field.clone());
            }
            FieldEdit::Remove { field_name } => {
                if let Some(pos) = result.iter().position(|f| &f.field_name == field_name) {
                    result.remove(pos);
                }
            }
        }
    }

    Ok(result)
}

/// Template operations over the persistence layer
#[derive(Clone)]
pub struct TemplateService {
    database: Arc<dyn Database>,
}

impl TemplateService {
    pub fn new(database: Arc<dyn Database>) -> Self {
        Self { database }
    }

    /// Create a specialty-wide default template
    ///
    /// # Errors
    ///
    /// - `NextMedError::Validation` for a malformed template
    /// - `NextMedError::Conflict` if a default with the same name and specialty exists
    pub async fn create_default(&self, new: NewTemplate) -> Result<Template> {
        let template = Template::builder()
            .name(new.name.trim())
            .specialty(new.specialty.trim())
            .fields(new.fields)
            .build()
            .map_err(NextMedError::Validation)?;

        self.database.insert_template(&template).await?;
        tracing::info!(
            template_id = %template.id,
            name = %template.name,
            specialty = %template.specialty,
            "Default template created"
        );
        Ok(template)
    }

    /// Copy a template for a doctor, optionally replacing its fields
    ///
    /// # Errors
    ///
    /// Returns `NextMedError::NotFound` for an unknown template and
    /// `NextMedError::Validation` for invalid override fields.
    pub async fn customize(
        &self,
        template_id: &TemplateId,
        doctor_id: DoctorId,
        overrides: Option<Vec<Field>>,
    ) -> Result<Template> {
        let source = self.get(template_id).await?;

        let mut custom = source.fork_for(doctor_id, source.name.clone());
        if let Some(fields) = overrides {
            custom.fields = fields;
        }
        custom.validate().map_err(NextMedError::Validation)?;

        self.database.insert_template(&custom).await?;
        tracing::info!(
            template_id = %custom.id,
            source_template_id = %source.id,
            doctor_id = %doctor_id,
            "Template customized"
        );
        Ok(custom)
    }

    /// Add and remove fields
    ///
    /// With a doctor id the source is left untouched and a new owned
    /// template named `"{name} (customized)"` receives the edits. Without
    /// one the template is changed in place.
    ///
    /// # Errors
    ///
    /// Returns `NextMedError::NotFound` for an unknown template and
    /// `NextMedError::Validation` for an invalid edit.
    pub async fn apply_field_edits(
        &self,
        template_id: &TemplateId,
        edits: &[FieldEdit],
        doctor_id: Option<DoctorId>,
    ) -> Result<EditOutcome> {
        let source = self.get(template_id).await?;
        let fields = apply_edits(&source.fields, edits)?;

        match doctor_id {
            Some(doctor_id) => {
                let mut fork =
                    source.fork_for(doctor_id, format!("{}{}", source.name, CUSTOMIZED_SUFFIX));
                fork.fields = fields;
                fork.validate().map_err(NextMedError::Validation)?;

                self.database.insert_template(&fork).await?;
                tracing::info!(
                    template_id = %fork.id,
                    source_template_id = %source.id,
                    doctor_id = %doctor_id,
                    edits = edits.len(),
                    "Template forked with field edits"
                );
                Ok(EditOutcome::Forked(fork))
            }
            None => {
                let mut updated = source;
                updated.fields = fields;
                updated.updated_at = Utc::now();
                updated.validate().map_err(NextMedError::Validation)?;

                self.database.update_template(&updated).await?;
                tracing::info!(
                    template_id = %updated.id,
                    edits = edits.len(),
                    "Template fields updated"
                );
                Ok(EditOutcome::Updated(updated))
            }
        }
    }

    /// Fetch a template
    ///
    /// # Errors
    ///
    /// Returns `NextMedError::NotFound` if it does not exist.
    pub async fn get(&self, template_id: &TemplateId) -> Result<Template> {
        self.database
            .get_template(template_id)
            .await?
            .ok_or_else(|| NextMedError::NotFound("Template not found.".to_string()))
    }

    /// Default templates of a specialty
    ///
    /// # Errors
    ///
    /// Returns `NextMedError::NotFound` when the specialty has none.
    pub async fn list_defaults_by_specialty(&self, specialty: &str) -> Result<Vec<Template>> {
        if specialty.trim().is_empty() {
            return Err(NextMedError::Validation("Specialty is required.".to_string()));
        }
        let templates = self.database.list_default_templates(specialty.trim()).await?;
        if templates.is_empty() {
            return Err(NextMedError::NotFound(
                "No templates found for the given specialty.".to_string(),
            ));
        }
        Ok(templates)
    }

    /// Templates owned by a doctor; empty when there are none
    pub async fn list_for_doctor(&self, doctor_id: &DoctorId) -> Result<Vec<Template>> {
        self.database.list_doctor_templates(doctor_id).await
    }

    /// Delete a template
    ///
    /// Patients mapped against it keep their dangling reference.
    ///
    /// # Errors
    ///
    /// Returns `NextMedError::NotFound` if it does not exist.
    pub async fn delete(&self, template_id: &TemplateId) -> Result<()> {
        if !self.database.delete_template(template_id).await? {
            return Err(NextMedError::NotFound("Template not found.".to_string()));
        }
        tracing::info!(template_id = %template_id, "Template deleted");
        Ok(())
    }

    /// Insert the built-in default templates that are not present yet
    ///
    /// Returns how many were created.
    pub async fn seed_defaults(&self) -> Result<usize> {
        let mut created = 0;
        for new in builtin_defaults() {
            match self.create_default(new).await {
                Ok(_) => created += 1,
                Err(NextMedError::Conflict(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(created)
    }
}

/// Built-in default templates
pub fn builtin_defaults() -> Vec<NewTemplate> {
    use crate::domain::FieldType;

    vec![NewTemplate {
        name: "Gynecology Initial Visit".to_string(),
        specialty: "Gynecology".to_string(),
        fields: vec![
            Field::new("Patient Age", FieldType::Number, true),
            Field::new("Symptoms", FieldType::Text, true),
            Field::new("Last Menstrual Period", FieldType::Date, false),
        ],
    }]
}
