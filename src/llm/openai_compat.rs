use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::AnswerGenerator;
use super::types::{ChatMessage, GenerationParams};
use crate::core::errors::ApiError;

/// Any server speaking the OpenAI chat-completions API.
#[derive(Clone)]
pub struct OpenAiCompatibleGenerator {
    base_url: String,
    model: String,
    api_key: Option<String>,
    params: GenerationParams,
    client: Client,
}

impl OpenAiCompatibleGenerator {
    pub fn new(
        client: Client,
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        params: GenerationParams,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            params,
            client,
        }
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [ChatMessage::user(prompt)],
            "stream": false,
            "temperature": self.params.temperature,
            "max_tokens": self.params.max_new_tokens,
        })
    }
}

#[async_trait]
impl AnswerGenerator for OpenAiCompatibleGenerator {
    fn name(&self) -> &str {
        "openai_compatible"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut req = self.client.post(&url).json(&self.request_body(prompt));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let res = req.send().await.map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!("Chat completion error: {}", text)));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ApiError::Internal("Chat completion had no content".to_string()))
    }
}
