//! Gemini (Google) provider.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{ChatMessage, ChatRole, ExtractionProvider};
use crate::providers::{Provider, ProviderConfig};

/// Gemini LLM provider
pub struct GeminiProvider {
    api_key: String,
    model: String,
    client: Client,
}

impl GeminiProvider {
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
            config.effective_model(Provider::Google),
        )
    }

    /// Gemini has no system role; the system prompt is folded into the first
    /// user turn, and assistant turns become `model` turns.
    fn build_contents(messages: &[ChatMessage]) -> Vec<serde_json::Value> {
        let mut contents = Vec::new();
        let mut system_text: Option<&str> = None;

        for message in messages {
            match message.role {
                ChatRole::System => system_text = Some(&message.content),
                ChatRole::User => {
                    let text = match (contents.is_empty(), system_text) {
                        (true, Some(system)) => format!("{system}\n\n{}", message.content),
                        _ => message.content.clone(),
                    };
                    contents.push(json!({
                        "role": "user",
                        "parts": [{"text": text}]
                    }));
                }
                ChatRole::Assistant => contents.push(json!({
                    "role": "model",
                    "parts": [{"text": message.content}]
                })),
            }
        }

        contents
    }
}

#[async_trait]
impl ExtractionProvider for GeminiProvider {
    fn has_credentials(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String> {
        let request_body = json!({
            "contents": Self::build_contents(messages),
            "generationConfig": {
                "maxOutputTokens": max_tokens
            }
        });

        let api_url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let response = self
            .client
            .post(api_url)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(anyhow::anyhow!(
                "Gemini API request failed with status {}: {}",
                status,
                text
            ));
        }

        let response_body: serde_json::Value = response.json().await?;

        // Response shape: { "candidates": [ { "content": { "parts": [ { "text": "..." } ] } } ] }
        let content = response_body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Failed to extract content from Gemini API response"))?;

        Ok(content.to_string())
    }
}
