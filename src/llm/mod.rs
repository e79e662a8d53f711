//! LLM extraction client and the provider seam.
//!
//! [`ExtractionProvider`] is the one capability required from a provider:
//! given a conversation and a token budget, return raw text. The
//! [`ExtractionClient`] drives the retry loop around it: backoff on
//! transient failures, a relevancy short-circuit on the `"none"` sentinel,
//! and corrective feedback appended to the conversation when validation
//! rejects a response.

pub mod gemini;
pub mod openai;
pub mod prompts;

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::domain::SearchDomain;
use crate::schema::{ValidatedParameters, ValidationOutcome, validate_response};
use crate::{log_debug, log_warn};

/// Literal the model answers with when the query is outside its domain
const NO_ANSWER_SENTINEL: &str = "none";

/// Pause before retrying after a validation failure
const FEEDBACK_DELAY: Duration = Duration::from_millis(500);

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// Single message in a provider conversation
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Capability required from an LLM provider
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    /// Whether the provider has credentials to make calls at all
    fn has_credentials(&self) -> bool;

    /// Run the conversation through the provider and return its raw text
    async fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> anyhow::Result<String>;
}

/// Failure modes of [`ExtractionClient::advanced_search`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    #[error("LLM API key is not configured")]
    MissingApiKey,
    #[error("query is not related to the target domain")]
    OutOfDomain,
    #[error("no valid structured response after retries")]
    Unparsed,
}

/// Tunables for the extraction retry loop
#[derive(Debug, Clone, Copy)]
pub struct ExtractionOptions {
    /// Output cap passed to the provider
    pub max_tokens: u32,
    /// Total provider attempts before giving up
    pub max_retries: u32,
    /// Per-call timeout on the provider
    pub call_timeout: Duration,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            max_retries: 2,
            call_timeout: Duration::from_secs(30),
        }
    }
}

/// Structured-extraction client over a provider, with bounded retries.
pub struct ExtractionClient {
    provider: Box<dyn ExtractionProvider>,
    domain: SearchDomain,
    options: ExtractionOptions,
}

impl ExtractionClient {
    pub fn new(
        provider: Box<dyn ExtractionProvider>,
        domain: SearchDomain,
        options: ExtractionOptions,
    ) -> Self {
        Self {
            provider,
            domain,
            options,
        }
    }

    /// The domain this client extracts for
    pub const fn domain(&self) -> SearchDomain {
        self.domain
    }

    /// Extract validated search parameters from a natural-language query.
    ///
    /// Seeds a two-message conversation (domain system prompt + user query)
    /// and retries up to `max_retries` times. Provider failures and empty
    /// responses back off quadratically; validation failures append a
    /// corrective feedback message so the model can fix its own output.
    /// A `"none"` reply short-circuits as [`LlmError::OutOfDomain`].
    pub async fn advanced_search(&self, query: &str) -> Result<ValidatedParameters, LlmError> {
        if !self.provider.has_credentials() {
            return Err(LlmError::MissingApiKey);
        }

        let mut messages = vec![
            ChatMessage::system(prompts::system_prompt(self.domain)),
            ChatMessage::user(query),
        ];
        let mut validated = None;

        for attempt in 0..self.options.max_retries {
            let response = timeout(
                self.options.call_timeout,
                self.provider.complete(&messages, self.options.max_tokens),
            )
            .await;

            let text = match response {
                Ok(Ok(text)) => text,
                Ok(Err(e)) => {
                    log_warn!("Provider call failed (attempt {attempt}): {e}");
                    Self::backoff(attempt).await;
                    continue;
                }
                Err(_) => {
                    log_warn!("Provider call timed out (attempt {attempt})");
                    Self::backoff(attempt).await;
                    continue;
                }
            };

            let trimmed = text.trim();
            if trimmed.is_empty() {
                log_debug!("Provider returned no text (attempt {attempt})");
                Self::backoff(attempt).await;
                continue;
            }
            if trimmed.eq_ignore_ascii_case(NO_ANSWER_SENTINEL) {
                return Err(LlmError::OutOfDomain);
            }

            match validate_response(trimmed, self.domain) {
                ValidationOutcome::Valid(params) => {
                    validated = Some(params);
                    break;
                }
                ValidationOutcome::Invalid(report) => {
                    log_debug!("Response failed validation (attempt {attempt}): {report}");
                    messages.push(Self::feedback_message(&report.to_string()));
                    sleep(FEEDBACK_DELAY).await;
                }
                ValidationOutcome::Malformed(detail) => {
                    log_debug!("Response was malformed (attempt {attempt}): {detail}");
                    messages.push(Self::feedback_message(&detail));
                    sleep(FEEDBACK_DELAY).await;
                }
            }
        }

        validated.ok_or(LlmError::Unparsed)
    }

    /// Quadratic backoff: 1s, 4s, 9s, ...
    async fn backoff(attempt: u32) {
        sleep(Duration::from_secs(u64::from((attempt + 1).pow(2)))).await;
    }

    fn feedback_message(detail: &str) -> ChatMessage {
        ChatMessage::user(format!(
            "Your response could not be validated. Please correct the following issues and provide valid JSON: {detail}"
        ))
    }
}

/// Strip markdown fences and surrounding prose from LLM output, keeping the
/// outermost JSON object.
pub(crate) fn clean_json_response(text: &str) -> String {
    let trimmed = text.trim();

    // If wrapped in a code block, drop the markers
    let without_codeblock = if trimmed.starts_with("```") && trimmed.ends_with("```") {
        let start = trimmed.find('{').unwrap_or(0);
        let end = trimmed.rfind('}').map_or(trimmed.len(), |i| i + 1);
        &trimmed[start..end]
    } else {
        trimmed
    };

    // Keep from the first '{' to the last '}'
    let start = without_codeblock.find('{').unwrap_or(0);
    let end = without_codeblock
        .rfind('}')
        .map_or(without_codeblock.len(), |i| i + 1);

    without_codeblock[start..end].trim().to_string()
}
