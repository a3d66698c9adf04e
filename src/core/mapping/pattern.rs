//! Regex field mapper
//!
//! Matches a fixed per-field pattern table against the normalized transcript.
//! Only fields with a table entry and a match are emitted.

use super::normalize::{normalize_field_name, TranscriptNormalizer};
use super::{FieldMapper, MappingInput, MappingOutcome};
use crate::config::MappingStrategy;
use crate::domain::{FieldValue, NextMedError, PatientFields, Result, UNKNOWN_PATIENT_NAME};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;

/// Words dropped from the end of a captured value
const TRAILING_CONNECTIVES: &[&str] = &["and", "with", "who", "she", "he", "is", "was", "aged"];

/// Pattern key whose match also names the patient
const NAME_KEY: &str = "name";

#[derive(Debug, Deserialize)]
struct PatternDefinition {
    patterns: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PatternLibrary {
    patterns: HashMap<String, PatternDefinition>,
}

/// Compiled patterns keyed by normalized field name
pub struct FieldPatternRegistry {
    patterns: HashMap<String, Vec<Regex>>,
}

impl FieldPatternRegistry {
    /// Create a registry from TOML content
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a pattern does not compile.
    pub fn from_toml(content: &str) -> Result<Self> {
        let library: PatternLibrary = toml::from_str(content).map_err(|e| {
            NextMedError::Configuration(format!("Failed to parse field pattern library: {e}"))
        })?;

        let mut patterns = HashMap::new();
        for (key, def) in library.patterns {
            let compiled = def
                .patterns
                .iter()
                .map(|p| {
                    Regex::new(p).map_err(|e| {
                        NextMedError::Configuration(format!(
                            "Invalid regex for field '{key}': {e}"
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            patterns.insert(normalize_field_name(&key), compiled);
        }

        Ok(Self { patterns })
    }

    /// Create the registry with the built-in pattern table
    pub fn default_patterns() -> Result<Self> {
        let default_toml = include_str!("../../../patterns/field_patterns.toml");
        Self::from_toml(default_toml)
    }

    /// Patterns for a normalized field name
    pub fn get(&self, key: &str) -> Option<&[Regex]> {
        self.patterns.get(key).map(Vec::as_slice)
    }

    /// Normalized field names with patterns
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.patterns.keys().map(String::as_str)
    }
}

/// Value of the first participating capture group of the first matching pattern
fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    patterns.iter().find_map(|re| {
        let captures = re.captures(text)?;
        let group = captures.iter().skip(1).flatten().next()?;
        let value = clean_capture(group.as_str());
        (!value.is_empty()).then_some(value)
    })
}

fn clean_capture(raw: &str) -> String {
    let mut words: Vec<&str> = raw
        .trim_matches(|c: char| c.is_whitespace() || c == ',' || c == '-')
        .split_whitespace()
        .collect();
    while words
        .last()
        .is_some_and(|w| TRAILING_CONNECTIVES.contains(w))
    {
        words.pop();
    }
    words.join(" ").trim_end_matches(',').to_string()
}

fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Regex-based field mapper
pub struct RegexFieldMapper {
    normalizer: TranscriptNormalizer,
    registry: FieldPatternRegistry,
}

impl RegexFieldMapper {
    /// Create a mapper with the built-in patterns
    pub fn new() -> Result<Self> {
        Self::with_registry(FieldPatternRegistry::default_patterns()?)
    }

    /// Create a mapper with a custom pattern registry
    pub fn with_registry(registry: FieldPatternRegistry) -> Result<Self> {
        Ok(Self {
            normalizer: TranscriptNormalizer::new()?,
            registry,
        })
    }
}

impl FieldMapper for RegexFieldMapper {
    fn strategy(&self) -> MappingStrategy {
        MappingStrategy::Regex
    }

    fn map(&self, input: &MappingInput<'_>) -> MappingOutcome {
        let text = self.normalizer.normalize(input.transcript);

        let mut fields = PatientFields::new();
        for field in &input.template.fields {
            let key = normalize_field_name(&field.field_name);
            let Some(patterns) = self.registry.get(&key) else {
                continue;
            };
            if let Some(value) = first_capture(patterns, &text) {
                let value = if key == NAME_KEY {
                    title_case(&value)
                } else {
                    value
                };
                fields.insert(field.field_name.clone(), FieldValue::Present(value));
            }
        }

        let patient_name = self
            .registry
            .get(NAME_KEY)
            .and_then(|patterns| first_capture(patterns, &text))
            .map(|name| title_case(&name))
            .unwrap_or_else(|| UNKNOWN_PATIENT_NAME.to_string());

        MappingOutcome {
            patient_name,
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patterns_compile() {
        let registry = FieldPatternRegistry::default_patterns().unwrap();
        let mut keys: Vec<&str> = registry.keys().collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "age",
                "last menstrual period",
                "name",
                "patient age",
                "previous pregnancy complications",
                "symptoms",
            ]
        );
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let toml = "[patterns.age]\npatterns = ['(unclosed']\n";
        assert!(matches!(
            FieldPatternRegistry::from_toml(toml),
            Err(NextMedError::Configuration(_))
        ));
    }

    #[test]
    fn test_clean_capture_drops_connectives() {
        assert_eq!(clean_capture("jane and"), "jane");
        assert_eq!(clean_capture(" headache, nausea "), "headache, nausea");
        assert_eq!(clean_capture("and"), "");
    }

    #[test]
    fn test_maps_gynecology_transcript() {
        use crate::domain::{Field, FieldType, Template};

        let template = Template::builder()
            .name("Gynecology Initial Visit")
            .specialty("Gynecology")
            .field(Field::new("Patient Age", FieldType::Number, true))
            .field(Field::new("Symptoms", FieldType::Text, true))
            .field(Field::new("Last Menstrual Period", FieldType::Date, false))
            .field(Field::new("Gender", FieldType::Text, false))
            .build()
            .unwrap();
        let transcript = "Patient's name is Jane Doe. Um, she's 34 years old and complains of \
                          headache and nausea. Her last menstrual period was March 3rd.";

        let outcome = RegexFieldMapper::new().unwrap().map(&MappingInput {
            template: &template,
            transcript,
            entities: &[],
        });

        assert_eq!(outcome.patient_name, "Jane Doe");
        assert_eq!(outcome.fields["Patient Age"].as_deref(), Some("34"));
        assert_eq!(
            outcome.fields["Symptoms"].as_deref(),
            Some("headache and nausea")
        );
        assert_eq!(
            outcome.fields["Last Menstrual Period"].as_deref(),
            Some("march 3rd")
        );
        assert!(!outcome.fields.contains_key("Gender"));
    }

    #[test]
    fn test_first_person_symptoms() {
        use crate::domain::{Field, FieldType, Template};

        let template = Template::builder()
            .name("Visit")
            .specialty("General")
            .field(Field::new("Patient Age", FieldType::Number, false))
            .field(Field::new("Symptoms", FieldType::Text, false))
            .build()
            .unwrap();
        let mapper = RegexFieldMapper::new().unwrap();

        let outcome = mapper.map(&MappingInput {
            template: &template,
            transcript: "My name is Jane, I am 34 years old, I have a headache",
            entities: &[],
        });
        assert_eq!(outcome.fields["Patient Age"].as_deref(), Some("34"));
        assert_eq!(outcome.fields["Symptoms"].as_deref(), Some("headache"));

        let outcome = mapper.map(&MappingInput {
            template: &template,
            transcript: "I've been having migraines.",
            entities: &[],
        });
        assert_eq!(outcome.fields["Symptoms"].as_deref(), Some("migraines"));
    }

    #[test]
    fn test_unknown_name_without_match() {
        let template = crate::domain::Template::builder()
            .name("T")
            .specialty("S")
            .build()
            .unwrap();
        let outcome = RegexFieldMapper::new().unwrap().map(&MappingInput {
            template: &template,
            transcript: "no identifying details here",
            entities: &[],
        });
        assert_eq!(outcome.patient_name, UNKNOWN_PATIENT_NAME);
        assert!(outcome.fields.is_empty());
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("jane doe"), "Jane Doe");
    }
}
