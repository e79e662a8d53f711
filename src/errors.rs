//! Error taxonomy for the search pipeline.
//!
//! Every expected failure is converted into a [`SearchError`] at the boundary
//! of the component that produced it; no other error type crosses module
//! boundaries. Each variant carries a stable machine-readable code and an
//! HTTP-equivalent status, and renders into the wire-shaped
//! `{"error": {"error_id", "error_msg", ...}}` object with a random
//! per-incident ID for support correlation. Internal details never leak into
//! the rendered object.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cache::StoreError;
use crate::domain::SearchDomain;
use crate::rate_limiter::RateLimitStatus;

/// Top-level pipeline error.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// No API key is configured for the selected LLM provider
    #[error("LLM API key is not configured")]
    MissingApiKey,

    /// The LLM judged the query unrelated to the target domain
    #[error("query is not related to the {0} domain")]
    OutOfDomain(SearchDomain),

    /// The sliding-window rate limit refused the request
    #[error("rate limit exceeded")]
    RateLimitExceeded(RateLimitStatus),

    /// Retries were exhausted without a validated LLM response
    #[error("unable to parse the query into structured search parameters")]
    Unparsed,

    /// The inbound request itself is malformed
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The cache persistence layer failed
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// Unexpected internal failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl SearchError {
    /// Stable machine-readable code for this error kind
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingApiKey => "llm-key-error",
            Self::OutOfDomain(domain) => domain.relevancy_error_code(),
            Self::RateLimitExceeded(_) => "rate-limit-exceeded",
            Self::Unparsed => "unable-to-parse-query-using-llm",
            Self::BadRequest(_) => "bad-json-request",
            Self::Storage(_) => "internal-database-error",
            Self::Internal(_) => "internal-server-error",
        }
    }

    /// HTTP-equivalent status for this error kind
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingApiKey => 401,
            Self::OutOfDomain(_) | Self::Unparsed | Self::BadRequest(_) => 400,
            Self::RateLimitExceeded(_) => 429,
            Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    /// Render this error as the wire-shaped error object
    pub fn to_response(&self) -> ErrorResponse {
        let mut response = ErrorResponse::new(self.error_code());
        if let Self::RateLimitExceeded(status) = self {
            response.error.extra.insert(
                "rate_limit_status".to_string(),
                serde_json::to_value(status).unwrap_or(Value::Null),
            );
        }
        response
    }
}

/// Wire-shaped error object returned to callers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Body of an [`ErrorResponse`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    /// Random per-incident identifier for support correlation
    pub error_id: String,
    /// Stable machine-readable error code
    pub error_msg: String,
    /// Additional context (e.g. rate limiter status)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ErrorResponse {
    /// Create a response for the given error code with a fresh incident ID
    pub fn new(error_msg: &str) -> Self {
        Self {
            error: ErrorBody {
                error_id: create_error_id(),
                error_msg: error_msg.to_string(),
                extra: Map::new(),
            },
        }
    }
}

/// Short random alphanumeric incident ID (six uppercase letters or digits)
fn create_error_id() -> String {
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    const ID_LEN: usize = 6;
    let mut rng = rand::rng();
    (0..ID_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CHARS.len());
            char::from(CHARS[idx])
        })
        .collect()
}
