use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::AnswerGenerator;
use super::types::GenerationParams;
use crate::core::errors::ApiError;
use crate::rag::embedding::DEFAULT_HF_INFERENCE_URL;

/// Hosted text-generation endpoint on Hugging Face inference.
#[derive(Clone)]
pub struct HuggingFaceEndpoint {
    base_url: String,
    repo_id: String,
    token: String,
    params: GenerationParams,
    client: Client,
}

impl HuggingFaceEndpoint {
    pub fn new(
        client: Client,
        base_url: Option<&str>,
        repo_id: &str,
        token: String,
        params: GenerationParams,
    ) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(DEFAULT_HF_INFERENCE_URL)
                .trim_end_matches('/')
                .to_string(),
            repo_id: repo_id.to_string(),
            token,
            params,
            client,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}", self.base_url, self.repo_id)
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "inputs": prompt,
            "parameters": {
                "temperature": self.params.temperature,
                "max_new_tokens": self.params.max_new_tokens,
                "return_full_text": false,
            },
            "options": { "wait_for_model": true },
        })
    }
}

#[async_trait]
impl AnswerGenerator for HuggingFaceEndpoint {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
        let res = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.token)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "Hugging Face generation error ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;
        parse_generated_text(&payload)
    }
}

fn parse_generated_text(payload: &Value) -> Result<String, ApiError> {
    if let Some(err) = payload.get("error").and_then(|v| v.as_str()) {
        return Err(ApiError::Internal(err.to_string()));
    }

    let item = match payload {
        Value::Array(items) => items.first(),
        other => Some(other),
    };

    item.and_then(|v| v.get("generated_text"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Internal("Hugging Face response had no generated_text".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> HuggingFaceEndpoint {
        HuggingFaceEndpoint::new(
            Client::new(),
            None,
            "mistralai/Mistral-7B-Instruct-v0.3",
            "hf_test".to_string(),
            GenerationParams::default(),
        )
    }

    #[test]
    fn request_carries_generation_params() {
        let body = endpoint().request_body("Context: x\nQuestion: y");

        assert_eq!(body["inputs"], "Context: x\nQuestion: y");
        assert_eq!(body["parameters"]["temperature"], 0.5);
        assert_eq!(body["parameters"]["max_new_tokens"], 512);
        assert_eq!(body["parameters"]["return_full_text"], false);
    }

    #[test]
    fn endpoint_targets_repo() {
        assert_eq!(
            endpoint().endpoint(),
            "https://router.huggingface.co/hf-inference/models/mistralai/Mistral-7B-Instruct-v0.3"
        );
    }

    #[test]
    fn parses_list_and_object_payloads() {
        let list = json!([{ "generated_text": "Flu\nA viral infection." }]);
        assert_eq!(parse_generated_text(&list).unwrap(), "Flu\nA viral infection.");

        let object = json!({ "generated_text": "Gout" });
        assert_eq!(parse_generated_text(&object).unwrap(), "Gout");
    }

    #[test]
    fn upstream_error_text_is_kept() {
        let payload = json!({ "error": "Model too busy, unable to get response in less than 60 second(s)" });
        let err = parse_generated_text(&payload).unwrap_err();
        assert_eq!(
            err.detail(),
            "Model too busy, unable to get response in less than 60 second(s)"
        );
    }

    #[test]
    fn empty_list_is_an_error() {
        assert!(parse_generated_text(&json!([])).is_err());
    }

    #[tokio::test]
    #[ignore]
    async fn test_live_huggingface_generation() {
        let token = std::env::var("HF_TOKEN").expect("HF_TOKEN not set");
        let generator = HuggingFaceEndpoint::new(
            Client::new(),
            None,
            "mistralai/Mistral-7B-Instruct-v0.3",
            token,
            GenerationParams {
                temperature: 0.5,
                max_new_tokens: 32,
            },
        );

        match generator.generate("Name one symptom of influenza.").await {
            Ok(text) => println!("Hugging Face response: {}", text),
            Err(e) => panic!("Hugging Face generation failed: {}", e),
        }
    }
}
