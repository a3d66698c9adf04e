//! Integration tests for template management over the in-memory store

use nextmed::adapters::database::{Database, PatientRepository};
use nextmed::adapters::memory::MemoryDatabase;
use nextmed::core::templates::{
    EditOutcome, FieldEdit, NewTemplate, TemplateService, CUSTOMIZED_SUFFIX,
};
use nextmed::domain::{
    DoctorId, Field, FieldType, NextMedError, Patient, PatientFields, TemplateId,
};
use std::sync::Arc;

fn service() -> (TemplateService, Arc<dyn Database>) {
    let database: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
    (TemplateService::new(database.clone()), database)
}

fn gynecology() -> NewTemplate {
    NewTemplate {
        name: "Gynecology Initial Visit".to_string(),
        specialty: "Gynecology".to_string(),
        fields: vec![
            Field::new("Patient Age", FieldType::Number, true),
            Field::new("Symptoms", FieldType::Text, true),
        ],
    }
}

#[tokio::test]
async fn test_duplicate_default_conflicts() {
    let (templates, _) = service();

    let created = templates.create_default(gynecology()).await.unwrap();
    assert!(created.is_default());

    let err = templates.create_default(gynecology()).await.unwrap_err();
    assert!(matches!(err, NextMedError::Conflict(_)));

    // Same name in another specialty is fine
    let mut other = gynecology();
    other.specialty = "Obstetrics".to_string();
    templates.create_default(other).await.unwrap();
}

#[tokio::test]
async fn test_customize_copies_for_doctor() {
    let (templates, _) = service();
    let default = templates.create_default(gynecology()).await.unwrap();
    let doctor = DoctorId::new();

    let custom = templates.customize(&default.id, doctor, None).await.unwrap();
    assert_ne!(custom.id, default.id);
    assert_eq!(custom.doctor_id, Some(doctor));
    assert_eq!(custom.name, default.name);
    assert_eq!(custom.fields, default.fields);

    let overridden = templates
        .customize(
            &default.id,
            doctor,
            Some(vec![Field::new("Blood Type", FieldType::Text, false)]),
        )
        .await
        .unwrap();
    assert_eq!(overridden.field_names(), vec!["Blood Type"]);

    let mine = templates.list_for_doctor(&doctor).await.unwrap();
    assert_eq!(mine.len(), 2);

    // The default is untouched
    assert_eq!(templates.get(&default.id).await.unwrap().fields, default.fields);
}

#[tokio::test]
async fn test_field_edits_fork_for_doctor() {
    let (templates, _) = service();
    let default = templates.create_default(gynecology()).await.unwrap();
    let doctor = DoctorId::new();

    let edits = vec![
        FieldEdit::Add(Field::new("Checkup Date", FieldType::Date, false)),
        FieldEdit::Remove {
            field_name: "Symptoms".to_string(),
        },
    ];
    let outcome = templates
        .apply_field_edits(&default.id, &edits, Some(doctor))
        .await
        .unwrap();

    let fork = match outcome {
        EditOutcome::Forked(t) => t,
        other => panic!("expected a fork, got {other:?}"),
    };
    assert_eq!(fork.name, format!("Gynecology Initial Visit{CUSTOMIZED_SUFFIX}"));
    assert_eq!(fork.doctor_id, Some(doctor));
    assert_eq!(fork.field_names(), vec!["Patient Age", "Checkup Date"]);

    let source = templates.get(&default.id).await.unwrap();
    assert_eq!(source.field_names(), vec!["Patient Age", "Symptoms"]);
}

#[tokio::test]
async fn test_field_edits_in_place() {
    let (templates, _) = service();
    let default = templates.create_default(gynecology()).await.unwrap();

    let outcome = templates
        .apply_field_edits(
            &default.id,
            &[FieldEdit::Add(Field::dropdown(
                "Pain Level",
                false,
                vec!["mild".to_string(), "severe".to_string()],
            ))],
            None,
        )
        .await
        .unwrap();

    assert!(matches!(outcome, EditOutcome::Updated(_)));
    let stored = templates.get(&default.id).await.unwrap();
    assert_eq!(stored.id, default.id);
    assert_eq!(stored.fields.len(), 3);
}

#[tokio::test]
async fn test_list_by_specialty() {
    let (templates, _) = service();
    templates.create_default(gynecology()).await.unwrap();

    let found = templates
        .list_defaults_by_specialty("Gynecology")
        .await
        .unwrap();
    assert_eq!(found.len(), 1);

    let err = templates
        .list_defaults_by_specialty("Cardiology")
        .await
        .unwrap_err();
    assert!(matches!(err, NextMedError::NotFound(ref m) if m == "No templates found for the given specialty."));

    let err = templates.list_defaults_by_specialty(" ").await.unwrap_err();
    assert!(matches!(err, NextMedError::Validation(_)));
}

#[tokio::test]
async fn test_delete_leaves_patients_readable() {
    let (templates, database) = service();
    let default = templates.create_default(gynecology()).await.unwrap();

    let mut fields = PatientFields::new();
    fields.insert("Patient Age".to_string(), "34".into());
    let patient = Patient::new(Some("Jane".to_string()), default.id, DoctorId::new(), fields);
    database
        .create_patient_with_transcription(&patient, None)
        .await
        .unwrap();

    templates.delete(&default.id).await.unwrap();
    assert!(matches!(
        templates.get(&default.id).await,
        Err(NextMedError::NotFound(_))
    ));

    let stored = database.get_patient(&patient.id).await.unwrap().unwrap();
    assert_eq!(stored.template_id, default.id);
    assert_eq!(stored.field("Patient Age"), Some("34"));

    assert!(matches!(
        templates.delete(&default.id).await,
        Err(NextMedError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_unknown_template_not_found() {
    let (templates, _) = service();
    let err = templates
        .customize(&TemplateId::new(), DoctorId::new(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, NextMedError::NotFound(ref m) if m == "Template not found."));
}

#[tokio::test]
async fn test_seed_defaults_once() {
    let (templates, _) = service();
    assert_eq!(templates.seed_defaults().await.unwrap(), 1);
    assert_eq!(templates.seed_defaults().await.unwrap(), 0);
}
