use clinic_compliance::workflows::intake::{
    ColumnMapping, IntakeError, MappingError, RowErrorReason, SemanticField, VisitImporter,
};

const HOSPITAL_EXPORT: &str = "\u{feff}Visit Date , Department,Doctor,Waiting Minutes,License Expiry\n\
2025-09-22,ER,Dr. A,12,2026-03-01\n\
2025-09-22,ER,Dr. A,N/A,2026-03-01\n\
22/09/2025,Cardiology,Dr. B,31,\n\
2025-09-23,Cardiology,,20,\n\
2025-09-23,Cardiology,Dr. B,-5,\n";

#[test]
fn suggested_mapping_handles_messy_headers() {
    let headers = [
        "\u{feff}Visit Date ",
        "Department",
        "Doctor",
        "Waiting Minutes",
        "License Expiry",
    ];
    let mapping = ColumnMapping::suggest(&headers);
    assert_eq!(mapping.get(SemanticField::VisitDate), Some("Visit Date"));
    assert_eq!(mapping.get(SemanticField::WaitMinutes), Some("Waiting Minutes"));
    assert_eq!(mapping.get(SemanticField::LicenseExpiry), Some("License Expiry"));
    assert_eq!(mapping.get(SemanticField::Doctor), Some("Doctor"));
}

#[test]
fn bad_rows_are_reported_with_reasons() {
    let mapping = ColumnMapping::suggest(&[
        "Visit Date",
        "Department",
        "Doctor",
        "Waiting Minutes",
        "License Expiry",
    ]);
    let batch =
        VisitImporter::from_reader(HOSPITAL_EXPORT.as_bytes(), &mapping).expect("import succeeds");

    assert_eq!(batch.records.len(), 2);
    assert_eq!(batch.skipped.count, 3);

    let reasons: Vec<(Option<SemanticField>, RowErrorReason)> = batch
        .skipped
        .sample
        .iter()
        .map(|error| (error.field, error.reason.clone()))
        .collect();
    assert_eq!(
        reasons,
        vec![
            (Some(SemanticField::WaitMinutes), RowErrorReason::EmptyCell),
            (Some(SemanticField::Doctor), RowErrorReason::EmptyCell),
            (
                Some(SemanticField::WaitMinutes),
                RowErrorReason::NegativeWait(-5.0)
            ),
        ]
    );
}

#[test]
fn unknown_column_names_the_offender() {
    let mapping = ColumnMapping::new()
        .with(SemanticField::VisitDate, "Visit Date")
        .with(SemanticField::Department, "Dept")
        .with(SemanticField::Doctor, "Doctor")
        .with(SemanticField::WaitMinutes, "Waiting Minutes");

    let err = VisitImporter::from_reader(HOSPITAL_EXPORT.as_bytes(), &mapping)
        .expect_err("Dept is not a header");
    match err {
        IntakeError::Mapping(MappingError::UnknownColumn { field, column }) => {
            assert_eq!(field, SemanticField::Department);
            assert_eq!(column, "Dept");
        }
        other => panic!("expected unknown column, got {other:?}"),
    }
}

#[test]
fn missing_required_fields_are_listed_together() {
    let err = ColumnMapping::new()
        .with(SemanticField::WaitMinutes, "Waiting Minutes")
        .resolve(&["Waiting Minutes"])
        .expect_err("required fields unmapped");
    assert_eq!(
        err,
        MappingError::MissingMapping {
            fields: vec![
                SemanticField::VisitDate,
                SemanticField::Department,
                SemanticField::Doctor,
            ],
        }
    );
}

#[test]
fn mapping_deserializes_from_field_keys() {
    let mapping: ColumnMapping = serde_json::from_str(
        r#"{"visit_date":"Visit Date","department":"Dept","doctor":"Doctor","wait_minutes":"Wait"}"#,
    )
    .expect("mapping parses");
    assert_eq!(mapping.get(SemanticField::Department), Some("Dept"));
    assert_eq!(mapping.get(SemanticField::ArrivalTime), None);
}
