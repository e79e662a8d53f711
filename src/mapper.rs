//! Mapping of validated extraction fields into the downstream search query.
//!
//! The mapping is pure and deterministic: the same validated input always
//! produces the same mapped output, which is what makes cache keys stable.
//! Absent fields are omitted from the mapped query entirely, never emitted as
//! nulls.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::domain::SearchDomain;
use crate::schema::{GlycanSearchParams, ProteinSearchParams, ValidatedParameters};

/// Inclusive numeric range with normalized bounds (`min <= max`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: i64,
    pub max: i64,
}

// Absolute search domains for the range fields
const NATIVE_MASS_BOUNDS: (i64, i64) = (150, 6751);
const PERMETHYLATED_MASS_BOUNDS: (i64, i64) = (206, 8307);
const PROTEIN_MASS_BOUNDS: (i64, i64) = (260, 4_007_076);
const MONOSACCHARIDE_BOUNDS: (i64, i64) = (1, 37);

/// Widening applied per-bound when min == max, only where the widened bound
/// stays inside the absolute domain
const EQUAL_BOUNDS_EPSILON: i64 = 10;

/// Organism entry in a glycan organism filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganismEntry {
    pub glygen_name: String,
}

/// Glycan organism filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganismFilter {
    pub organism_list: Vec<OrganismEntry>,
    pub annotation_category: String,
    pub operation: String,
}

/// Glycan identifier lookup with its subsumption relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlycanIdentifier {
    pub glycan_id: String,
    pub subsumption: String,
}

/// Biosynthetic enzyme filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnzymeFilter {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Biomarker composite; materialized only when a sub-field is present
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiomarkerFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disease_name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Protein organism filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinOrganismFilter {
    pub name: String,
}

/// Glycosylated amino-acid filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AminoAcidFilter {
    pub aa_list: Vec<String>,
    pub operation: String,
}

/// Downstream glycan search query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlycanQuery {
    pub operation: String,
    pub query_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mass: Option<NumericRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mass_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_monosaccharides: Option<NumericRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organism: Option<OrganismFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glycan_identifier: Option<GlycanIdentifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enzyme: Option<EnzymeFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glycan_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glycan_subtype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glycan_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glycan_motif: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pmid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding_protein_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biomarker: Option<BiomarkerFilter>,
}

/// Downstream protein search query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProteinQuery {
    pub operation: String,
    pub query_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mass: Option<NumericRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organism: Option<ProteinOrganismFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uniprot_canonical_ac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refseq_ac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gene_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub go_term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub go_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pathway_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glycosylation_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glycosylation_subtype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glycosylated_aa: Option<AminoAcidFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glycosylation_evidence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disease_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disease_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding_glycan_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attached_glycan_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pmid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biomarker: Option<BiomarkerFilter>,
}

/// Query mapped for the downstream search backend
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MappedQuery {
    Glycan(Box<GlycanQuery>),
    Protein(Box<ProteinQuery>),
}

impl MappedQuery {
    /// The downstream query type constant
    pub fn query_type(&self) -> &str {
        match self {
            Self::Glycan(q) => &q.query_type,
            Self::Protein(q) => &q.query_type,
        }
    }
}

/// Map validated parameters for either domain
pub fn map_parameters(params: &ValidatedParameters) -> MappedQuery {
    match params {
        ValidatedParameters::Glycan(p) => MappedQuery::Glycan(Box::new(map_glycan_parameters(p))),
        ValidatedParameters::Protein(p) => {
            MappedQuery::Protein(Box::new(map_protein_parameters(p)))
        }
    }
}

/// Map validated glycan fields into the downstream glycan query
pub fn map_glycan_parameters(params: &GlycanSearchParams) -> GlycanQuery {
    let mut query = GlycanQuery {
        operation: "AND".to_string(),
        query_type: SearchDomain::Glycan.query_type().to_string(),
        mass: None,
        mass_type: None,
        number_monosaccharides: None,
        organism: None,
        glycan_identifier: None,
        enzyme: None,
        id_namespace: params.glycan_id_namespace.clone(),
        glycan_type: params.glycan_type.clone(),
        glycan_subtype: params.glycan_subtype.clone(),
        glycan_name: params.glycan_name.clone(),
        protein_identifier: params.glycosylated_protein.clone(),
        glycan_motif: params.glycan_motif.clone(),
        pmid: params.publication_id.clone(),
        binding_protein_id: params.binding_protein.clone(),
        biomarker: None,
    };

    if params.mass_minimum.is_some() || params.mass_maximum.is_some() {
        let (mass_type, bounds) = if params.mass_type.as_deref() == Some("Permethylated") {
            ("Permethylated", PERMETHYLATED_MASS_BOUNDS)
        } else {
            ("Native", NATIVE_MASS_BOUNDS)
        };
        query.mass = Some(widened_range(
            params.mass_minimum,
            params.mass_maximum,
            bounds,
        ));
        query.mass_type = Some(mass_type.to_string());
    }

    if params.monosaccharides_minimum.is_some() || params.monosaccharides_maximum.is_some() {
        query.number_monosaccharides = Some(swapped_range(
            params.monosaccharides_minimum,
            params.monosaccharides_maximum,
            MONOSACCHARIDE_BOUNDS,
        ));
    }

    if let Some(organisms) = &params.organism_name {
        query.organism = Some(OrganismFilter {
            organism_list: organisms
                .iter()
                .map(|name| OrganismEntry {
                    glygen_name: name.clone(),
                })
                .collect(),
            annotation_category: String::new(),
            operation: params
                .organism_condition
                .clone()
                .unwrap_or_else(|| "or".to_string()),
        });
    }

    if let Some(glycan_id) = &params.glycan_id {
        let subsumption = if params.glycan_related.as_deref() == Some("Subsumption") {
            "any"
        } else {
            "none"
        };
        query.glycan_identifier = Some(GlycanIdentifier {
            glycan_id: glycan_id.clone(),
            subsumption: subsumption.to_string(),
        });
    }

    if let Some(enzyme) = &params.biosynthetic_enzyme {
        query.enzyme = Some(EnzymeFilter {
            id: enzyme.clone(),
            kind: "gene".to_string(),
        });
    }

    query.biomarker = biomarker_filter(&params.biomarker_disease, &params.biomarker_type);

    query
}

/// Map validated protein fields into the downstream protein query
pub fn map_protein_parameters(params: &ProteinSearchParams) -> ProteinQuery {
    let mut query = ProteinQuery {
        operation: "AND".to_string(),
        query_type: SearchDomain::Protein.query_type().to_string(),
        mass: None,
        organism: None,
        uniprot_canonical_ac: params.uniprot_canonical_ac.clone(),
        refseq_ac: params.refseq_ac.clone(),
        protein_name: params.protein_name.clone(),
        gene_name: params.gene_name.clone(),
        go_term: params.go_term.clone(),
        go_id: params.go_id.clone(),
        pathway_id: params.pathway_id.clone(),
        glycosylation_type: params.glycosylation_type.clone(),
        glycosylation_subtype: params.glycosylation_subtype.clone(),
        glycosylated_aa: None,
        glycosylation_evidence: None,
        disease_name: params.disease_name.clone(),
        disease_id: params.disease_id.clone(),
        binding_glycan_id: params.binding_glycan_id.clone(),
        attached_glycan_id: params.attached_glycan_id.clone(),
        pmid: params.publication_id.clone(),
        biomarker: None,
    };

    if params.mass_minimum.is_some() || params.mass_maximum.is_some() {
        query.mass = Some(swapped_range(
            params.mass_minimum,
            params.mass_maximum,
            PROTEIN_MASS_BOUNDS,
        ));
    }

    if let Some(name) = &params.organism_name {
        query.organism = Some(ProteinOrganismFilter { name: name.clone() });
    }

    if let Some(amino_acids) = &params.glycosylated_aa {
        query.glycosylated_aa = Some(AminoAcidFilter {
            aa_list: map_amino_acids(amino_acids),
            operation: params
                .glycosylated_aa_condition
                .clone()
                .unwrap_or_else(|| "or".to_string()),
        });
    }

    if let Some(evidence) = &params.glycosylation_evidence_type {
        query.glycosylation_evidence = map_glycosylation_evidence(evidence);
    }

    query.biomarker = biomarker_filter(&params.biomarker_disease, &params.biomarker_type);

    query
}

fn biomarker_filter(
    disease: &Option<String>,
    kind: &Option<String>,
) -> Option<BiomarkerFilter> {
    if disease.is_none() && kind.is_none() {
        return None;
    }
    Some(BiomarkerFilter {
        disease_name: disease.clone(),
        kind: kind.clone(),
    })
}

/// Normalize a range where equal bounds are widened by [`EQUAL_BOUNDS_EPSILON`],
/// each bound moving only if it stays inside the absolute domain.
fn widened_range(min_raw: Option<f64>, max_raw: Option<f64>, bounds: (i64, i64)) -> NumericRange {
    let (floor, ceil) = bounds;
    #[allow(clippy::cast_possible_truncation)]
    let mut min = min_raw.map_or(floor, |v| v as i64);
    #[allow(clippy::cast_possible_truncation)]
    let mut max = max_raw.map_or(ceil, |v| v as i64);

    if min > max {
        std::mem::swap(&mut min, &mut max);
    } else if min == max {
        if min >= floor + EQUAL_BOUNDS_EPSILON {
            min -= EQUAL_BOUNDS_EPSILON;
        }
        if max <= ceil - EQUAL_BOUNDS_EPSILON {
            max += EQUAL_BOUNDS_EPSILON;
        }
    }

    NumericRange { min, max }
}

/// Normalize a range by filling missing bounds with the domain defaults and
/// swapping inverted bounds; equal bounds are left as-is.
fn swapped_range(min_raw: Option<f64>, max_raw: Option<f64>, bounds: (i64, i64)) -> NumericRange {
    let (floor, ceil) = bounds;
    #[allow(clippy::cast_possible_truncation)]
    let mut min = min_raw.map_or(floor, |v| v as i64);
    #[allow(clippy::cast_possible_truncation)]
    let mut max = max_raw.map_or(ceil, |v| v as i64);

    if min > max {
        std::mem::swap(&mut min, &mut max);
    }

    NumericRange { min, max }
}

static AMINO_ACID_CODES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("serine", "S"),
        ("ser", "S"),
        ("threonine", "T"),
        ("thr", "T"),
        ("asparagine", "N"),
        ("asn", "N"),
        ("tyrosine", "Y"),
        ("tyr", "Y"),
        ("lysine", "K"),
        ("lys", "K"),
        ("tryptophan", "W"),
        ("trp", "W"),
        ("aspartic acid", "D"),
        ("aspartic", "D"),
        ("asp", "D"),
        ("cysteine", "C"),
        ("cys", "C"),
        ("glutamic acid", "E"),
        ("glutamic", "E"),
        ("glu", "E"),
        ("arginine", "R"),
        ("arg", "R"),
    ])
});

/// Map amino-acid names to single-letter codes, deduplicated and sorted.
/// Unrecognized names are dropped.
fn map_amino_acids(names: &[String]) -> Vec<String> {
    let codes: BTreeSet<&str> = names
        .iter()
        .filter_map(|name| AMINO_ACID_CODES.get(name.to_lowercase().as_str()).copied())
        .collect();
    codes.into_iter().map(str::to_string).collect()
}

static GLYCOSYLATION_EVIDENCE: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("all sites", "all_sites"),
        ("all reported sites", "all_reported_sites_with_without_glycans"),
        (
            "all reported sites with or without glycans",
            "all_reported_sites_with_without_glycans",
        ),
        (
            "all reported sites (with or without glycans)",
            "all_reported_sites_with_without_glycans",
        ),
        ("sites reported with glycans", "sites_reported_with_glycans"),
        ("sites reported without glycans", "sites_reported_without_glycans"),
        ("predicted sites", "predicted_sites"),
        (
            "sites detected by literature mining",
            "sites_detected_by_literature_mining",
        ),
    ])
});

/// Map a glycosylation evidence phrase to its canonical token; unrecognized
/// phrases are dropped rather than emitted as nulls.
fn map_glycosylation_evidence(phrase: &str) -> Option<String> {
    GLYCOSYLATION_EVIDENCE
        .get(phrase.to_lowercase().as_str())
        .map(|token| (*token).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amino_acid_codes_sorted_and_deduplicated() {
        let names = vec![
            "Threonine".to_string(),
            "serine".to_string(),
            "SER".to_string(),
            "unobtainium".to_string(),
        ];
        assert_eq!(map_amino_acids(&names), vec!["S", "T"]);
    }

    #[test]
    fn test_evidence_mapping() {
        assert_eq!(
            map_glycosylation_evidence("All Sites").as_deref(),
            Some("all_sites")
        );
        assert_eq!(
            map_glycosylation_evidence("sites reported with glycans").as_deref(),
            Some("sites_reported_with_glycans")
        );
        assert_eq!(map_glycosylation_evidence("hearsay"), None);
    }

    #[test]
    fn test_widened_range_at_domain_floor() {
        // min == max at the floor: only the upper bound can widen
        let range = widened_range(Some(150.0), Some(150.0), NATIVE_MASS_BOUNDS);
        assert_eq!(range, NumericRange { min: 150, max: 160 });
    }

    #[test]
    fn test_widened_range_mid_domain() {
        let range = widened_range(Some(500.0), Some(500.0), NATIVE_MASS_BOUNDS);
        assert_eq!(range, NumericRange { min: 490, max: 510 });
    }

    #[test]
    fn test_widened_range_swaps_inverted_bounds() {
        let range = widened_range(Some(300.0), Some(200.0), NATIVE_MASS_BOUNDS);
        assert_eq!(range, NumericRange { min: 200, max: 300 });
    }

    #[test]
    fn test_missing_bounds_fall_back_to_domain() {
        let range = widened_range(Some(1000.0), None, NATIVE_MASS_BOUNDS);
        assert_eq!(range, NumericRange { min: 1000, max: 6751 });
        let range = swapped_range(None, Some(20.0), MONOSACCHARIDE_BOUNDS);
        assert_eq!(range, NumericRange { min: 1, max: 20 });
    }

    #[test]
    fn test_swapped_range_leaves_equal_bounds() {
        let range = swapped_range(Some(5.0), Some(5.0), MONOSACCHARIDE_BOUNDS);
        assert_eq!(range, NumericRange { min: 5, max: 5 });
    }
}
