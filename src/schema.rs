//! Field schemas and validation for LLM extraction responses.
//!
//! Raw provider output is cleaned, parsed, shape-normalized for known
//! provider quirks, deserialized (unknown fields are silently dropped), and
//! finally checked against the fixed per-domain vocabularies. The outcome is
//! always a [`ValidationOutcome`]; nothing panics or escapes this boundary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::domain::SearchDomain;
use crate::llm::clean_json_response;

// --- Fixed vocabularies (shared with the prompt builder) ---

/// Organisms recognized by the search backend
pub const ORGANISMS: &[&str] = &[
    "Pig",
    "Rattus",
    "Bovine",
    "Human",
    "Mouse",
    "Rat",
    "Zebrafish",
    "Chicken",
    "Hamster",
    "SARS-CoV-2",
    "Yeast",
    "Fruit fly",
    "Arabidopsis",
    "Cellular slime mold",
    "HCV",
    "HCoV-SARS",
    "HCV-H77",
];

/// Glycan ID namespaces
pub const GLYCAN_ID_NAMESPACES: &[&str] = &[
    "PubChem Substance",
    "GlyTouCan",
    "GlyCosmos",
    "PubChem Compound",
    "KEGG Glycan",
    "CFG",
    "ChEBI",
    "GlyConnect",
    "SandBox",
    "Glycan Array Data Repository",
    "Glycosciences.de",
    "UniCarbDB",
    "CarbBank",
    "BCSDB",
    "UniCarbKB",
    "GlycoEpitope",
    "Glycan Structure Dictionary",
    "BiomarkerKB",
    "PDB",
    "GPTwiki",
    "Reactome",
    "Rhea",
    "MatrixDB",
    "Metabolomics Workbench",
];

/// Glycan mass measurement types
pub const MASS_TYPES: &[&str] = &["Native", "Permethylated"];

/// Relation kinds for glycan ID lookups
pub const GLYCAN_RELATIONS: &[&str] = &["Exact", "Subsumption"];

/// Glycan types
pub const GLYCAN_TYPES: &[&str] = &[
    "N-linked",
    "Other",
    "O-linked",
    "Glycosphingolipid",
    "GAG",
    "Human Milk Oligosaccharide",
    "GPI anchor",
];

/// Glycan subtypes across all glycan types
pub const GLYCAN_SUBTYPES: &[&str] = &[
    "Alditol-reduced",
    "Complex",
    "Core-fucosylated",
    "Triantennary",
    "Biantennary",
    "Bisected",
    "Arm-fucosylated",
    "Monoantennary",
    "Truncated",
    "Tetraantennary",
    "other",
    "Hybrid",
    "High mannose",
    "Paucimannose",
    "Core 2",
    "Core 3",
    "Core 5",
    "Core 6",
    "Core 7",
    "O-mannose",
    "Core 1",
    "Core 8",
    "Core 4",
    "O-mannose core",
    "O-fucose core",
    "Core 9",
    "O-GlcNAc",
    "Ganglio series",
    "Isoglobo series",
    "Lacto series",
    "Neo-lacto series",
    "Globo series",
    "Gala series",
    "Muco series",
    "Mollu series",
    "Arthro series",
    "Keratan sulfate",
];

/// Biomarker types
pub const BIOMARKER_TYPES: &[&str] = &["diagnostic", "prognostic", "monitoring", "predictive"];

/// Accepted spellings of multi-value join conditions
pub const JOIN_CONDITIONS: &[&str] = &["and", "AND", "or", "OR"];

fn default_operation() -> String {
    "AND".to_string()
}

// --- Validated parameter types ---

/// Validated glycan-search extraction fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlycanSearchParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glycan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glycan_related: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glycan_id_namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass_minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass_maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monosaccharides_minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monosaccharides_maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organism_name: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organism_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glycan_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glycan_subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glycan_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glycosylated_protein: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding_protein: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glycan_motif: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biosynthetic_enzyme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biomarker_disease: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biomarker_type: Option<String>,
    /// Search operation joining the top-level fields; defaults to `AND`
    #[serde(default = "default_operation")]
    pub operation: String,
}

/// Validated protein-search extraction fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProteinSearchParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uniprot_canonical_ac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refseq_ac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gene_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass_minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass_maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organism_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub go_term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub go_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pathway_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glycosylation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glycosylation_subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glycosylated_aa: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glycosylated_aa_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glycosylation_evidence_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disease_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disease_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding_glycan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_glycan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biomarker_disease: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biomarker_type: Option<String>,
    /// Search operation joining the top-level fields; defaults to `AND`
    #[serde(default = "default_operation")]
    pub operation: String,
}

/// Validated parameters for either domain
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ValidatedParameters {
    Glycan(GlycanSearchParams),
    Protein(ProteinSearchParams),
}

impl ValidatedParameters {
    /// The domain these parameters were validated against
    pub const fn domain(&self) -> SearchDomain {
        match self {
            Self::Glycan(_) => SearchDomain::Glycan,
            Self::Protein(_) => SearchDomain::Protein,
        }
    }
}

// --- Validation report ---

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Per-field error report produced by a failed validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    fn push(&mut self, field: &str, message: String) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", rendered.join("; "))
    }
}

/// Result of validating raw LLM output against a domain schema
#[derive(Debug)]
pub enum ValidationOutcome {
    /// The response conforms to the schema
    Valid(ValidatedParameters),
    /// The response parsed but one or more fields failed validation
    Invalid(ValidationReport),
    /// The response is not a JSON object at all
    Malformed(String),
}

// --- Entry point ---

/// Validate raw LLM response text against the schema for `domain`.
///
/// Unknown fields are dropped, not errors.
pub fn validate_response(text: &str, domain: SearchDomain) -> ValidationOutcome {
    let cleaned = clean_json_response(text);

    let value: Value = match serde_json::from_str(&cleaned) {
        Ok(value) => value,
        Err(e) => return ValidationOutcome::Malformed(format!("invalid JSON: {e}")),
    };
    let Value::Object(mut fields) = value else {
        return ValidationOutcome::Malformed("response is not a JSON object".to_string());
    };

    match domain {
        SearchDomain::Glycan => {
            normalize_glycan_fields(&mut fields);
            match serde_json::from_value::<GlycanSearchParams>(Value::Object(fields)) {
                Ok(params) => {
                    let report = params.validate();
                    if report.is_empty() {
                        ValidationOutcome::Valid(ValidatedParameters::Glycan(params))
                    } else {
                        ValidationOutcome::Invalid(report)
                    }
                }
                Err(e) => ValidationOutcome::Invalid(schema_error(&e)),
            }
        }
        SearchDomain::Protein => {
            normalize_protein_fields(&mut fields);
            match serde_json::from_value::<ProteinSearchParams>(Value::Object(fields)) {
                Ok(params) => {
                    let report = params.validate();
                    if report.is_empty() {
                        ValidationOutcome::Valid(ValidatedParameters::Protein(params))
                    } else {
                        ValidationOutcome::Invalid(report)
                    }
                }
                Err(e) => ValidationOutcome::Invalid(schema_error(&e)),
            }
        }
    }
}

fn schema_error(e: &serde_json::Error) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.push("_schema", e.to_string());
    report
}

// --- Shape normalization ---

/// Glycan quirks: multi-valued `glycan_id` is joined into a comma-separated
/// string; a bare `organism_name` string becomes a list.
fn normalize_glycan_fields(fields: &mut Map<String, Value>) {
    join_string_list(fields, "glycan_id");
    wrap_or_split_string(fields, "organism_name");
}

/// Protein quirks: multi-valued `uniprot_canonical_ac` is joined; a bare
/// `glycosylated_aa` string becomes a list; `organism_name` is reduced to a
/// single value.
fn normalize_protein_fields(fields: &mut Map<String, Value>) {
    join_string_list(fields, "uniprot_canonical_ac");
    wrap_or_split_string(fields, "glycosylated_aa");
    take_first_organism(fields);
}

/// `["a", "b"]` -> `"a,b"`; scalars pass through untouched
fn join_string_list(fields: &mut Map<String, Value>, key: &str) {
    let joined = match fields.get(key) {
        Some(Value::Array(items)) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            Some(parts.join(","))
        }
        _ => None,
    };
    if let Some(joined) = joined {
        fields.insert(key.to_string(), Value::String(joined));
    }
}

/// `"a, b"` -> `["a", "b"]`; `"a"` -> `["a"]`; lists pass through untouched
fn wrap_or_split_string(fields: &mut Map<String, Value>, key: &str) {
    let items = match fields.get(key) {
        Some(Value::String(raw)) => {
            if raw.contains(',') {
                Some(
                    raw.split(',')
                        .map(|item| Value::String(item.trim().to_string()))
                        .collect::<Vec<Value>>(),
                )
            } else {
                Some(vec![Value::String(raw.clone())])
            }
        }
        _ => None,
    };
    if let Some(items) = items {
        fields.insert(key.to_string(), Value::Array(items));
    }
}

/// Reduce `organism_name` to its first entry when it arrives multi-valued
fn take_first_organism(fields: &mut Map<String, Value>) {
    let first = match fields.get("organism_name") {
        Some(Value::String(raw)) if raw.contains(',') => raw
            .split(',')
            .next()
            .map(|item| Value::String(item.trim().to_string())),
        Some(Value::Array(items)) => items.first().cloned(),
        _ => None,
    };
    if let Some(first) = first {
        fields.insert("organism_name".to_string(), first);
    }
}

// --- Vocabulary checks ---

fn check_one_of(report: &mut ValidationReport, field: &str, value: Option<&str>, allowed: &[&str]) {
    if let Some(v) = value
        && !allowed.contains(&v)
    {
        report.push(field, format!("must be one of: {}", allowed.join(", ")));
    }
}

fn check_each_one_of(
    report: &mut ValidationReport,
    field: &str,
    values: Option<&[String]>,
    allowed: &[&str],
) {
    if let Some(values) = values {
        for v in values {
            if !allowed.contains(&v.as_str()) {
                report.push(field, format!("`{v}` must be one of: {}", allowed.join(", ")));
            }
        }
    }
}

impl GlycanSearchParams {
    /// Check constrained vocabularies, collecting every violation
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        check_one_of(
            &mut report,
            "glycan_related",
            self.glycan_related.as_deref(),
            GLYCAN_RELATIONS,
        );
        check_one_of(
            &mut report,
            "glycan_id_namespace",
            self.glycan_id_namespace.as_deref(),
            GLYCAN_ID_NAMESPACES,
        );
        check_one_of(&mut report, "mass_type", self.mass_type.as_deref(), MASS_TYPES);
        check_each_one_of(
            &mut report,
            "organism_name",
            self.organism_name.as_deref(),
            ORGANISMS,
        );
        check_one_of(
            &mut report,
            "organism_condition",
            self.organism_condition.as_deref(),
            JOIN_CONDITIONS,
        );
        check_one_of(&mut report, "glycan_type", self.glycan_type.as_deref(), GLYCAN_TYPES);
        check_one_of(
            &mut report,
            "glycan_subtype",
            self.glycan_subtype.as_deref(),
            GLYCAN_SUBTYPES,
        );
        check_one_of(
            &mut report,
            "biomarker_type",
            self.biomarker_type.as_deref(),
            BIOMARKER_TYPES,
        );
        check_one_of(&mut report, "operation", Some(&self.operation), JOIN_CONDITIONS);
        report
    }
}

impl ProteinSearchParams {
    /// Check constrained vocabularies, collecting every violation
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        check_one_of(
            &mut report,
            "organism_name",
            self.organism_name.as_deref(),
            ORGANISMS,
        );
        check_one_of(
            &mut report,
            "glycosylation_type",
            self.glycosylation_type.as_deref(),
            GLYCAN_TYPES,
        );
        check_one_of(
            &mut report,
            "glycosylation_subtype",
            self.glycosylation_subtype.as_deref(),
            GLYCAN_SUBTYPES,
        );
        check_one_of(
            &mut report,
            "glycosylated_aa_condition",
            self.glycosylated_aa_condition.as_deref(),
            JOIN_CONDITIONS,
        );
        check_one_of(
            &mut report,
            "biomarker_type",
            self.biomarker_type.as_deref(),
            BIOMARKER_TYPES,
        );
        check_one_of(&mut report, "operation", Some(&self.operation), JOIN_CONDITIONS);
        report
    }
}
