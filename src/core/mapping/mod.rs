//! Template-driven field mapping
//!
//! A [`FieldMapper`] turns a transcript and its extracted entities into
//! values for the fields of a template. Two strategies exist and exactly one
//! is active per process, selected by `mapping.strategy`:
//!
//! - [`EntityFieldMapper`] (default) - entity-type slots plus field-name containment
//! - [`RegexFieldMapper`] - per-field patterns over the normalized transcript
//!
//! Mappers are pure: the same input always yields the same output.

pub mod entity;
pub mod normalize;
pub mod pattern;

pub use entity::EntityFieldMapper;
pub use normalize::{normalize_field_name, TranscriptNormalizer};
pub use pattern::{FieldPatternRegistry, RegexFieldMapper};

use crate::config::MappingStrategy;
use crate::domain::{ExtractedEntity, PatientFields, Result, Template};
use std::sync::Arc;

/// Everything a mapper sees
#[derive(Debug, Clone, Copy)]
pub struct MappingInput<'a> {
    pub template: &'a Template,
    pub transcript: &'a str,

    /// Entities in the order the extractor returned them
    pub entities: &'a [ExtractedEntity],
}

/// Mapper output
#[derive(Debug, Clone, PartialEq)]
pub struct MappingOutcome {
    /// Patient display name, `"Unknown"` when none was found
    pub patient_name: String,

    pub fields: PatientFields,
}

/// A field mapping strategy
pub trait FieldMapper: Send + Sync {
    /// Strategy implemented by this mapper
    fn strategy(&self) -> MappingStrategy;

    /// Map a transcript onto the template fields
    fn map(&self, input: &MappingInput<'_>) -> MappingOutcome;
}

/// Build the mapper for a strategy
///
/// # Errors
///
/// Returns an error if the regex pattern table fails to compile.
pub fn mapper_for(strategy: MappingStrategy) -> Result<Arc<dyn FieldMapper>> {
    let mapper: Arc<dyn FieldMapper> = match strategy {
        MappingStrategy::Entity => Arc::new(EntityFieldMapper::new()),
        MappingStrategy::Regex => Arc::new(RegexFieldMapper::new()?),
    };
    tracing::info!(strategy = %strategy, "Field mapper selected");
    Ok(mapper)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapper_for_strategy() {
        assert_eq!(
            mapper_for(MappingStrategy::Entity).unwrap().strategy(),
            MappingStrategy::Entity
        );
        assert_eq!(
            mapper_for(MappingStrategy::Regex).unwrap().strategy(),
            MappingStrategy::Regex
        );
    }
}
