//! Entity-driven field mapper
//!
//! Mapping runs in three passes over the template fields:
//!
//! 1. Entities fill typed slots (name, age, gender, symptoms, diagnoses).
//! 2. Fields whose normalized name is a known slot alias take the slot value.
//! 3. Remaining fields take the first entity whose text appears in the field name.
//!
//! Anything still unset is reported as [`FieldValue::Missing`].

use super::normalize::normalize_field_name;
use super::{FieldMapper, MappingInput, MappingOutcome};
use crate::config::MappingStrategy;
use crate::domain::{ExtractedEntity, FieldValue, PatientFields, UNKNOWN_PATIENT_NAME};

/// Medical entity types the slot pass understands
pub mod entity_types {
    pub const NAME: &str = "NAME";
    pub const AGE: &str = "AGE";
    pub const GENDER: &str = "GENDER";
    pub const DX_NAME: &str = "DX_NAME";
}

/// Entity traits the slot pass understands
pub mod entity_traits {
    pub const NEGATION: &str = "NEGATION";
    pub const DIAGNOSIS: &str = "DIAGNOSIS";
}

/// Separator for multi-valued slots
pub const LIST_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Name,
    Age,
    Gender,
    Symptoms,
    Diagnoses,
}

impl Slot {
    /// Slot bound to a normalized field name
    fn for_field(normalized: &str) -> Option<Self> {
        match normalized {
            "name" | "patient name" => Some(Slot::Name),
            "age" | "patient age" => Some(Slot::Age),
            "gender" | "sex" | "patient gender" => Some(Slot::Gender),
            "symptoms" | "symptom" | "chief complaint" => Some(Slot::Symptoms),
            "diagnosis" | "diagnoses" => Some(Slot::Diagnoses),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Slots {
    name: Option<String>,
    age: Option<String>,
    gender: Option<String>,
    symptoms: Vec<String>,
    diagnoses: Vec<String>,
}

impl Slots {
    fn collect(entities: &[ExtractedEntity]) -> Self {
        let mut slots = Slots::default();

        for entity in usable(entities) {
            let text = entity.text.trim();
            if text.is_empty() {
                continue;
            }
            match entity.entity_type.to_ascii_uppercase().as_str() {
                entity_types::NAME => {
                    slots.name.get_or_insert_with(|| text.to_string());
                }
                entity_types::AGE => {
                    slots.age.get_or_insert_with(|| text.to_string());
                }
                entity_types::GENDER => {
                    slots.gender.get_or_insert_with(|| normalize_gender(text));
                }
                entity_types::DX_NAME => {
                    if entity.has_trait(entity_traits::DIAGNOSIS) {
                        slots.diagnoses.push(text.to_string());
                    } else {
                        slots.symptoms.push(text.to_string());
                    }
                }
                _ => {}
            }
        }

        slots
    }

    fn value(&self, slot: Slot) -> Option<String> {
        let joined = |values: &[String]| {
            (!values.is_empty()).then(|| values.join(LIST_SEPARATOR))
        };
        match slot {
            Slot::Name => self.name.clone(),
            Slot::Age => self.age.clone(),
            Slot::Gender => self.gender.clone(),
            Slot::Symptoms => joined(&self.symptoms),
            Slot::Diagnoses => joined(&self.diagnoses),
        }
    }
}

/// Entities that take part in mapping: negated findings are skipped
fn usable(entities: &[ExtractedEntity]) -> impl Iterator<Item = &ExtractedEntity> {
    entities
        .iter()
        .filter(|e| !e.has_trait(entity_traits::NEGATION))
}

/// Canonical gender value
///
/// ```
/// use nextmed::core::mapping::entity::normalize_gender;
///
/// assert_eq!(normalize_gender("Woman"), "female");
/// assert_eq!(normalize_gender("M"), "male");
/// assert_eq!(normalize_gender("Non-binary"), "non-binary");
/// ```
pub fn normalize_gender(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    match lowered.as_str() {
        "male" | "man" | "m" => "male".to_string(),
        "female" | "woman" | "f" => "female".to_string(),
        _ => lowered,
    }
}

/// First usable entity whose text is contained in the field name
fn substring_match(field_name: &str, entities: &[ExtractedEntity]) -> Option<String> {
    let field_lower = field_name.to_lowercase();
    usable(entities).find_map(|entity| {
        let text = entity.text.trim();
        let needle = text.to_lowercase();
        (!needle.is_empty() && field_lower.contains(&needle)).then(|| text.to_string())
    })
}

/// Entity-driven field mapper
#[derive(Debug, Default, Clone, Copy)]
pub struct EntityFieldMapper;

impl EntityFieldMapper {
    pub fn new() -> Self {
        Self
    }
}

impl FieldMapper for EntityFieldMapper {
    fn strategy(&self) -> MappingStrategy {
        MappingStrategy::Entity
    }

    fn map(&self, input: &MappingInput<'_>) -> MappingOutcome {
        let slots = Slots::collect(input.entities);

        let mut fields = PatientFields::new();
        for field in &input.template.fields {
            let bound = Slot::for_field(&normalize_field_name(&field.field_name))
                .and_then(|slot| slots.value(slot));

            let value = bound
                .or_else(|| substring_match(&field.field_name, input.entities))
                .map(FieldValue::Present)
                .unwrap_or(FieldValue::Missing);

            fields.insert(field.field_name.clone(), value);
        }

        MappingOutcome {
            patient_name: slots
                .name
                .unwrap_or_else(|| UNKNOWN_PATIENT_NAME.to_string()),
            fields,
        }
    }
}
