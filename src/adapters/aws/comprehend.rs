//! Amazon Comprehend Medical entity extractor

use crate::adapters::cloud::{EntityDetection, EntityExtractor, EntityVocabulary};
use crate::config::{AwsConfig, EntitiesConfig};
use crate::domain::transcription::ExtractedEntity;
use crate::domain::{ExternalServiceError, Result};
use async_trait::async_trait;
use aws_config::{Region, SdkConfig};
use aws_sdk_comprehendmedical::error::DisplayErrorContext;
use aws_sdk_comprehendmedical::types::Entity;
use aws_sdk_comprehendmedical::Client;
use serde_json::json;

/// Entity extractor using `DetectEntitiesV2`
pub struct ComprehendMedicalExtractor {
    client: Client,
    min_score: f32,
}

impl ComprehendMedicalExtractor {
    /// Create an extractor
    ///
    /// # Arguments
    ///
    /// * `sdk_config` - Shared AWS configuration
    /// * `aws` - Endpoint settings
    /// * `entities` - Score threshold
    /// * `region` - Region to call, which may differ from the storage region
    pub fn new(
        sdk_config: &SdkConfig,
        aws: &AwsConfig,
        entities: &EntitiesConfig,
        region: &str,
    ) -> Self {
        let mut builder = aws_sdk_comprehendmedical::config::Builder::from(sdk_config)
            .region(Region::new(region.to_string()));
        if let Some(ref endpoint) = aws.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Client::from_conf(builder.build()),
            min_score: entities.min_score,
        }
    }
}

fn to_extracted(entity: &Entity) -> ExtractedEntity {
    ExtractedEntity {
        entity_type: entity
            .r#type()
            .map(|t| t.as_str().to_string())
            .unwrap_or_default(),
        text: entity.text().unwrap_or_default().to_string(),
        category: entity.category().map(|c| c.as_str().to_string()),
        score: entity.score(),
        traits: entity
            .traits()
            .iter()
            .filter_map(|t| t.name().map(|n| n.as_str().to_string()))
            .collect(),
        begin_offset: entity.begin_offset(),
        end_offset: entity.end_offset(),
    }
}

/// The audit payload keeps every detected entity; only the mapper input is
/// filtered by `min_score`
fn build_detection(
    detected: Vec<ExtractedEntity>,
    min_score: f32,
    unmapped_attributes: usize,
    model_version: Option<&str>,
) -> EntityDetection {
    let raw = json!({
        "Entities": detected,
        "UnmappedAttributeCount": unmapped_attributes,
        "ModelVersion": model_version,
    });

    let entities = detected
        .into_iter()
        .filter(|e| e.score.map_or(true, |s| s >= min_score))
        .collect();

    EntityDetection { entities, raw }
}

#[async_trait]
impl EntityExtractor for ComprehendMedicalExtractor {
    async fn detect_entities(&self, text: &str) -> Result<EntityDetection> {
        let output = self
            .client
            .detect_entities_v2()
            .text(text)
            .send()
            .await
            .map_err(|e| {
                ExternalServiceError::EntityDetectionFailed(DisplayErrorContext(&e).to_string())
            })?;

        let detection = build_detection(
            output.entities().iter().map(to_extracted).collect(),
            self.min_score,
            output.unmapped_attributes().len(),
            Some(output.model_version()),
        );
        tracing::debug!(
            entity_count = detection.entities.len(),
            "Entities detected"
        );

        Ok(detection)
    }

    fn vocabulary(&self) -> EntityVocabulary {
        EntityVocabulary::Medical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(entity_type: &str, text: &str, score: Option<f32>) -> ExtractedEntity {
        ExtractedEntity {
            score,
            ..ExtractedEntity::new(entity_type, text)
        }
    }

    #[test]
    fn test_low_score_entities_stay_in_audit_payload() {
        let detection = build_detection(
            vec![
                scored("NAME", "Jane", Some(0.98)),
                scored("DX_NAME", "migraine", Some(0.2)),
                scored("AGE", "34", None),
            ],
            0.5,
            1,
            Some("2.0"),
        );

        let kept: Vec<&str> = detection.entities.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(kept, vec!["Jane", "34"]);

        let raw = detection.raw["Entities"].as_array().unwrap();
        assert_eq!(raw.len(), 3);
        assert_eq!(raw[1]["text"], "migraine");
        assert_eq!(detection.raw["UnmappedAttributeCount"], 1);
        assert_eq!(detection.raw["ModelVersion"], "2.0");
    }
}
