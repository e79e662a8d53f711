use glysearch::SearchDomain;
use glysearch::schema::{ValidatedParameters, ValidationOutcome, validate_response};

fn expect_glycan(outcome: ValidationOutcome) -> glysearch::schema::GlycanSearchParams {
    match outcome {
        ValidationOutcome::Valid(ValidatedParameters::Glycan(params)) => params,
        other => panic!("Expected valid glycan parameters, got {other:?}"),
    }
}

fn expect_protein(outcome: ValidationOutcome) -> glysearch::schema::ProteinSearchParams {
    match outcome {
        ValidationOutcome::Valid(ValidatedParameters::Protein(params)) => params,
        other => panic!("Expected valid protein parameters, got {other:?}"),
    }
}

#[test]
fn test_unknown_fields_are_dropped() {
    let raw = r#"{"glycan_type": "N-linked", "favorite_color": "blue"}"#;
    let params = expect_glycan(validate_response(raw, SearchDomain::Glycan));
    assert_eq!(params.glycan_type.as_deref(), Some("N-linked"));

    let serialized = serde_json::to_value(&params).expect("serializable");
    assert!(serialized.get("favorite_color").is_none());
}

#[test]
fn test_operation_defaults_to_and() {
    let params = expect_glycan(validate_response(
        r#"{"glycan_name": "HexNAc(1)Hex(3)Fuc(3)"}"#,
        SearchDomain::Glycan,
    ));
    assert_eq!(params.operation, "AND");
}

#[test]
fn test_glycan_single_organism_is_wrapped() {
    let params = expect_glycan(validate_response(
        r#"{"organism_name": "Human"}"#,
        SearchDomain::Glycan,
    ));
    assert_eq!(params.organism_name, Some(vec!["Human".to_string()]));
}

#[test]
fn test_glycan_comma_organisms_are_split() {
    let params = expect_glycan(validate_response(
        r#"{"organism_name": "Human, Mouse"}"#,
        SearchDomain::Glycan,
    ));
    assert_eq!(
        params.organism_name,
        Some(vec!["Human".to_string(), "Mouse".to_string()])
    );
}

#[test]
fn test_glycan_id_list_is_joined() {
    let params = expect_glycan(validate_response(
        r#"{"glycan_id": ["G17689DH", "G00028MO"]}"#,
        SearchDomain::Glycan,
    ));
    assert_eq!(params.glycan_id.as_deref(), Some("G17689DH,G00028MO"));
}

#[test]
fn test_invalid_vocabulary_reports_field() {
    let outcome = validate_response(r#"{"glycan_type": "Z-linked"}"#, SearchDomain::Glycan);
    let ValidationOutcome::Invalid(report) = outcome else {
        panic!("Expected an invalid outcome");
    };
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].field, "glycan_type");
}

#[test]
fn test_multiple_violations_are_collected() {
    let raw = r#"{"glycan_type": "Z-linked", "mass_type": "Imaginary", "organism_name": ["Martian"]}"#;
    let ValidationOutcome::Invalid(report) = validate_response(raw, SearchDomain::Glycan) else {
        panic!("Expected an invalid outcome");
    };
    let fields: Vec<&str> = report.errors.iter().map(|e| e.field.as_str()).collect();
    assert!(fields.contains(&"glycan_type"));
    assert!(fields.contains(&"mass_type"));
    assert!(fields.contains(&"organism_name"));
}

#[test]
fn test_type_mismatch_is_invalid_not_malformed() {
    let outcome = validate_response(r#"{"mass_minimum": "heavy"}"#, SearchDomain::Glycan);
    let ValidationOutcome::Invalid(report) = outcome else {
        panic!("Expected an invalid outcome");
    };
    assert_eq!(report.errors[0].field, "_schema");
}

#[test]
fn test_malformed_json() {
    assert!(matches!(
        validate_response("{not json", SearchDomain::Glycan),
        ValidationOutcome::Malformed(_)
    ));
}

#[test]
fn test_non_object_json_is_malformed() {
    assert!(matches!(
        validate_response("[1, 2, 3]", SearchDomain::Glycan),
        ValidationOutcome::Malformed(_)
    ));
}

#[test]
fn test_code_fenced_response_is_cleaned() {
    let fenced = "```json\n{\"glycan_type\": \"O-linked\"}\n```";
    let params = expect_glycan(validate_response(fenced, SearchDomain::Glycan));
    assert_eq!(params.glycan_type.as_deref(), Some("O-linked"));
}

#[test]
fn test_protein_uniprot_list_is_joined() {
    let params = expect_protein(validate_response(
        r#"{"uniprot_canonical_ac": ["P14210", "Q15113"]}"#,
        SearchDomain::Protein,
    ));
    assert_eq!(
        params.uniprot_canonical_ac.as_deref(),
        Some("P14210,Q15113")
    );
}

#[test]
fn test_protein_single_amino_acid_is_wrapped() {
    let params = expect_protein(validate_response(
        r#"{"glycosylated_aa": "Serine"}"#,
        SearchDomain::Protein,
    ));
    assert_eq!(params.glycosylated_aa, Some(vec!["Serine".to_string()]));
}

#[test]
fn test_protein_comma_amino_acids_are_split() {
    let params = expect_protein(validate_response(
        r#"{"glycosylated_aa": "Serine, Threonine"}"#,
        SearchDomain::Protein,
    ));
    assert_eq!(
        params.glycosylated_aa,
        Some(vec!["Serine".to_string(), "Threonine".to_string()])
    );
}

#[test]
fn test_protein_organism_reduced_to_first() {
    let from_list = expect_protein(validate_response(
        r#"{"organism_name": ["Human", "Mouse"]}"#,
        SearchDomain::Protein,
    ));
    assert_eq!(from_list.organism_name.as_deref(), Some("Human"));

    let from_string = expect_protein(validate_response(
        r#"{"organism_name": "Mouse, Rat"}"#,
        SearchDomain::Protein,
    ));
    assert_eq!(from_string.organism_name.as_deref(), Some("Mouse"));
}

#[test]
fn test_protein_invalid_organism_reports_field() {
    let ValidationOutcome::Invalid(report) =
        validate_response(r#"{"organism_name": "Martian"}"#, SearchDomain::Protein)
    else {
        panic!("Expected an invalid outcome");
    };
    assert_eq!(report.errors[0].field, "organism_name");
}
