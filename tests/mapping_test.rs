//! Integration tests for the two field mapping strategies

use nextmed::config::MappingStrategy;
use nextmed::core::mapping::{mapper_for, MappingInput};
use nextmed::domain::{
    ExtractedEntity, Field, FieldType, FieldValue, Template, UNKNOWN_PATIENT_NAME,
};
use test_case::test_case;

const TRANSCRIPT: &str = "My name is Jane, I am 34 years old, I have a headache";

fn template(fields: &[&str]) -> Template {
    Template::builder()
        .name("Visit")
        .specialty("General")
        .fields(
            fields
                .iter()
                .map(|f| Field::new(*f, FieldType::Text, false))
                .collect(),
        )
        .build()
        .unwrap()
}

fn entities() -> Vec<ExtractedEntity> {
    vec![
        ExtractedEntity::new("NAME", "Jane"),
        ExtractedEntity::new("AGE", "34"),
        ExtractedEntity::new("DX_NAME", "headache").with_trait("SYMPTOM"),
        ExtractedEntity::new("DX_NAME", "fever").with_trait("NEGATION"),
    ]
}

#[test_case("Age", Some("34") ; "age slot")]
#[test_case("Patient Age", Some("34") ; "patient age alias")]
#[test_case("symptoms", Some("headache") ; "symptom slot skips negated findings")]
#[test_case("Headache Severity", Some("headache") ; "entity text inside field name")]
#[test_case("Blood Pressure", None ; "unmatched field is missing")]
fn test_entity_strategy(field: &str, expected: Option<&str>) {
    let template = template(&[field]);
    let entities = entities();
    let mapper = mapper_for(MappingStrategy::Entity).unwrap();

    let outcome = mapper.map(&MappingInput {
        template: &template,
        transcript: TRANSCRIPT,
        entities: &entities,
    });

    assert_eq!(outcome.patient_name, "Jane");
    assert_eq!(outcome.fields.len(), 1);
    assert_eq!(outcome.fields[field].as_deref(), expected);
}

#[test_case("Age", Some("34") ; "age")]
#[test_case("Patient Age", Some("34") ; "patient age")]
#[test_case("Symptoms", Some("headache") ; "first person symptom")]
#[test_case("Blood Pressure", None ; "no pattern for field")]
fn test_regex_strategy(field: &str, expected: Option<&str>) {
    let template = template(&[field]);
    let mapper = mapper_for(MappingStrategy::Regex).unwrap();

    let outcome = mapper.map(&MappingInput {
        template: &template,
        transcript: TRANSCRIPT,
        entities: &[],
    });

    assert_eq!(outcome.patient_name, "Jane");
    assert_eq!(outcome.fields.get(field).and_then(FieldValue::as_deref), expected);
}

#[test]
fn test_entity_strategy_without_name() {
    let template = template(&["Age"]);
    let mapper = mapper_for(MappingStrategy::Entity).unwrap();

    let outcome = mapper.map(&MappingInput {
        template: &template,
        transcript: "",
        entities: &[],
    });

    assert_eq!(outcome.patient_name, UNKNOWN_PATIENT_NAME);
    assert_eq!(outcome.fields["Age"], FieldValue::Missing);
}

#[test_case(MappingStrategy::Entity ; "entity strategy")]
#[test_case(MappingStrategy::Regex ; "regex strategy")]
fn test_mapping_is_deterministic(strategy: MappingStrategy) {
    let template = template(&[
        "Name",
        "Patient Age",
        "Symptoms",
        "Headache Notes",
        "Headache Onset",
    ]);
    let mut entities = entities();
    entities.push(ExtractedEntity::new("NAME", "Janet"));
    let mapper = mapper_for(strategy).unwrap();
    let input = MappingInput {
        template: &template,
        transcript: TRANSCRIPT,
        entities: &entities,
    };

    let first = mapper.map(&input);
    for _ in 0..5 {
        assert_eq!(mapper.map(&input), first);
    }
    // A fresh mapper of the same strategy agrees as well
    assert_eq!(mapper_for(strategy).unwrap().map(&input), first);
    assert_eq!(first.patient_name, "Jane");
}

#[test]
fn test_strategies_report_themselves() {
    for strategy in [MappingStrategy::Entity, MappingStrategy::Regex] {
        assert_eq!(mapper_for(strategy).unwrap().strategy(), strategy);
    }
}
