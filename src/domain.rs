//! Search domains supported by the extraction pipeline.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Target domain for a natural-language search query.
///
/// The domain selects the system prompt, the validation schema and the
/// downstream query type.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ValueEnum,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SearchDomain {
    #[default]
    Glycan,
    Protein,
}

impl SearchDomain {
    /// Downstream query type constant for this domain
    pub const fn query_type(self) -> &'static str {
        match self {
            Self::Glycan => "search_glycan",
            Self::Protein => "search_protein",
        }
    }

    /// Error code reported when a query is judged unrelated to this domain
    pub const fn relevancy_error_code(self) -> &'static str {
        match self {
            Self::Glycan => "non-glycan-related-query",
            Self::Protein => "non-protein-related-query",
        }
    }
}
