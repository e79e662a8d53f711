//! End-to-end AI search pipeline.
//!
//! Control flow: rate-limiter admission check → LLM extraction (retried) →
//! parameter mapping → cache store-or-fetch. The rate limiter is the only
//! state shared across concurrent requests; its lock is held only across the
//! admission check, never across the outbound provider call.

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::cache::{AiParsingMetadata, SearchCache};
use crate::errors::{ErrorResponse, SearchError};
use crate::llm::{ExtractionClient, LlmError};
use crate::log_error;
use crate::mapper::{MappedQuery, map_parameters};
use crate::rate_limiter::RateLimiter;
use crate::schema::ValidatedParameters;

/// Search type recorded in cache entries produced by this pipeline
const SEARCH_TYPE: &str = "full";

/// Successful pipeline result.
///
/// Caching is best-effort: a persistence failure leaves `list_id` empty and
/// attaches the incident object instead of failing the search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub original_query: String,
    pub parsed_parameters: ValidatedParameters,
    pub mapped_parameters: MappedQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_error: Option<ErrorResponse>,
}

/// Orchestrates one AI-assisted search from query text to cached result.
pub struct SearchPipeline {
    rate_limiter: Arc<RateLimiter>,
    client: ExtractionClient,
    cache: SearchCache,
}

impl SearchPipeline {
    pub fn new(
        rate_limiter: Arc<RateLimiter>,
        client: ExtractionClient,
        cache: SearchCache,
    ) -> Self {
        Self {
            rate_limiter,
            client,
            cache,
        }
    }

    /// Run a natural-language query through the full pipeline.
    pub async fn run(&self, query: &str) -> Result<SearchOutcome, SearchError> {
        let started = std::time::Instant::now();
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::BadRequest(
                "query must be a non-empty string".to_string(),
            ));
        }

        if !self.rate_limiter.can_make_request() {
            return Err(SearchError::RateLimitExceeded(self.rate_limiter.get_status()));
        }

        let parsed = self
            .client
            .advanced_search(query)
            .await
            .map_err(|e| match e {
                LlmError::MissingApiKey => SearchError::MissingApiKey,
                LlmError::OutOfDomain => SearchError::OutOfDomain(self.client.domain()),
                LlmError::Unparsed => SearchError::Unparsed,
            })?;

        let mapped = map_parameters(&parsed);

        let metadata = AiParsingMetadata {
            original_query: query.to_string(),
            parsed_parameters: serde_json::to_value(&parsed)
                .map_err(|e| SearchError::Internal(e.to_string()))?,
            mapped_parameters: serde_json::to_value(&mapped)
                .map_err(|e| SearchError::Internal(e.to_string()))?,
        };
        let request = json!({"query": query});

        let mut outcome = SearchOutcome {
            original_query: query.to_string(),
            parsed_parameters: parsed,
            mapped_parameters: mapped,
            list_id: None,
            storage_error: None,
        };

        match self.cache.store_or_fetch(
            &outcome.mapped_parameters,
            &request,
            SEARCH_TYPE,
            Some(&metadata),
        ) {
            Ok(cached) => outcome.list_id = Some(cached.list_id),
            Err(e) => {
                log_error!("Failed to cache search query: {e}");
                outcome.storage_error = Some(SearchError::Storage(e).to_response());
            }
        }

        tracing::debug!(
            target: "glysearch::pipeline",
            elapsed_secs = started.elapsed().as_secs_f64(),
            domain = %self.client.domain(),
            "ai search pipeline completed"
        );

        Ok(outcome)
    }
}
