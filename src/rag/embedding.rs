//! Hosted embedding providers.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::core::errors::ApiError;

pub const DEFAULT_HF_INFERENCE_URL: &str = "https://router.huggingface.co/hf-inference";

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier, recorded alongside the index.
    fn model(&self) -> &str;

    /// One vector per input, in input order.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;
}

/// Hugging Face inference `feature-extraction` pipeline.
#[derive(Clone)]
pub struct HuggingFaceEmbeddings {
    base_url: String,
    model: String,
    token: String,
    client: Client,
}

impl HuggingFaceEmbeddings {
    pub fn new(client: Client, base_url: Option<&str>, model: &str, token: String) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(DEFAULT_HF_INFERENCE_URL)
                .trim_end_matches('/')
                .to_string(),
            model: model.to_string(),
            token,
            client,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}/pipeline/feature-extraction",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl EmbeddingProvider for HuggingFaceEmbeddings {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        let body = json!({
            "inputs": inputs,
            "options": { "wait_for_model": true },
        });

        let res = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "Hugging Face embedding error ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;
        parse_feature_extraction(&payload, inputs.len())
    }
}

/// OpenAI-style `/v1/embeddings` endpoint (LM Studio, vLLM, OpenAI, ...).
#[derive(Clone)]
pub struct OpenAiCompatibleEmbeddings {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl OpenAiCompatibleEmbeddings {
    pub fn new(client: Client, base_url: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            client,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiCompatibleEmbeddings {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        let url = format!("{}/v1/embeddings", self.base_url);

        let body = json!({
            "model": self.model,
            "input": inputs,
        });

        let mut req = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let res = req.send().await.map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!("Embedding endpoint error: {}", text)));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;

        let mut embeddings = Vec::new();
        if let Some(data) = payload["data"].as_array() {
            for item in data {
                if let Some(vals) = item["embedding"].as_array() {
                    embeddings.push(to_vector(vals));
                }
            }
        }

        if embeddings.len() != inputs.len() {
            return Err(ApiError::Internal(format!(
                "Embedding endpoint returned {} vectors for {} inputs",
                embeddings.len(),
                inputs.len()
            )));
        }

        Ok(embeddings)
    }
}

/// Accepts sentence-level output (`[[f32]]`, or `[f32]` for a single input)
/// and token-level output (`[[[f32]]]`), which is mean-pooled per input.
fn parse_feature_extraction(payload: &Value, expected: usize) -> Result<Vec<Vec<f32>>, ApiError> {
    if let Some(err) = payload.get("error").and_then(|v| v.as_str()) {
        return Err(ApiError::Internal(format!("Hugging Face embedding error: {}", err)));
    }

    let outer = payload
        .as_array()
        .ok_or_else(|| ApiError::Internal("Unexpected embedding payload".to_string()))?;

    let vectors: Vec<Vec<f32>> = if outer.first().is_some_and(Value::is_number) {
        vec![to_vector(outer)]
    } else {
        outer
            .iter()
            .map(|item| match item.as_array() {
                Some(inner) if inner.first().is_some_and(Value::is_array) => {
                    let tokens: Vec<Vec<f32>> = inner
                        .iter()
                        .filter_map(|t| t.as_array().map(|vals| to_vector(vals)))
                        .collect();
                    mean_pool(&tokens)
                }
                Some(inner) => to_vector(inner),
                None => Vec::new(),
            })
            .collect()
    };

    if vectors.len() != expected || vectors.iter().any(Vec::is_empty) {
        return Err(ApiError::Internal(format!(
            "Hugging Face returned {} embeddings for {} inputs",
            vectors.len(),
            expected
        )));
    }

    Ok(vectors)
}

fn to_vector(vals: &[Value]) -> Vec<f32> {
    vals.iter()
        .filter_map(|v| v.as_f64().map(|f| f as f32))
        .collect()
}

fn mean_pool(tokens: &[Vec<f32>]) -> Vec<f32> {
    let Some(first) = tokens.first() else {
        return Vec::new();
    };
    let mut sum = vec![0.0_f32; first.len()];
    for token in tokens {
        for (acc, value) in sum.iter_mut().zip(token) {
            *acc += value;
        }
    }
    let n = tokens.len() as f32;
    sum.iter_mut().for_each(|v| *v /= n);
    sum
}
