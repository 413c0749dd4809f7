use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;

use crate::error::{Error, Result};

/// A prompt for the text-generation collaborator. The reply is expected to be
/// a single JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Runs the prompt and returns the reply parsed as JSON.
    async fn generate_json(&self, request: GenerationRequest) -> Result<JsonValue>;
}

/// Chat-completions client for OpenAI-compatible endpoints.
#[derive(Clone)]
pub struct AIService {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl AIService {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        timeout: Duration,
        client: Client,
    ) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout,
        }
    }

    async fn chat_openai(&self, payload: JsonValue) -> Result<JsonValue> {
        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("OpenAI API Error {}: {}", status, text).into());
        }

        let body: JsonValue = res.json().await?;

        let content = body
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| Error::EvaluationFailed("Invalid OpenAI response format".to_string()))?;

        serde_json::from_str(content)
            .map_err(|e| Error::EvaluationFailed(format!("Model reply is not JSON: {}", e)))
    }
}

#[async_trait]
impl TextGenerator for AIService {
    async fn generate_json(&self, request: GenerationRequest) -> Result<JsonValue> {
        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.user}
            ],
            "response_format": { "type": "json_object" },
            "temperature": request.temperature
        });

        self.chat_openai(payload).await
    }
}
