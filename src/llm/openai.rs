//! OpenAI chat-completions provider.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{ChatMessage, ExtractionProvider};
use crate::providers::{Provider, ProviderConfig};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI LLM provider
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    client: Client,
}

impl OpenAiProvider {
    /// Creates a new provider with an explicit key and model
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            client: Client::new(),
        }
    }

    /// Creates a provider from the resolved configuration
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(
            config.api_key.clone(),
            config.effective_model(Provider::OpenAI),
        )
    }
}

#[async_trait]
impl ExtractionProvider for OpenAiProvider {
    fn has_credentials(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String> {
        let request_body = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": max_tokens,
        });

        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(anyhow::anyhow!(
                "OpenAI API request failed with status {}: {}",
                status,
                text
            ));
        }

        let response_body: serde_json::Value = response.json().await?;

        // Response shape: { "choices": [ { "message": { "content": "..." } } ] }
        let content = response_body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Failed to extract content from OpenAI API response"))?;

        Ok(content.to_string())
    }
}
