//! Typed view over the merged YAML configuration.
//!
//! Every section is optional; missing keys take the defaults below.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::core::errors::ApiError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub index: IndexSettings,
    pub embedding: EmbeddingSettings,
    pub generator: GeneratorSettings,
    pub image_search: ImageSearchSettings,
    pub http: HttpSettings,
}

impl Settings {
    pub fn from_value(value: &Value) -> Result<Self, ApiError> {
        serde_json::from_value(value.clone())
            .map_err(|err| ApiError::BadRequest(format!("Invalid config: {}", err)))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub path: PathBuf,
    pub top_k: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("vectorstore/medical_index.db"),
            top_k: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelProvider {
    Huggingface,
    OpenaiCompatible,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: ModelProvider,
    pub model: String,
    pub base_url: Option<String>,
    pub verify_on_startup: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: ModelProvider::Huggingface,
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            base_url: None,
            verify_on_startup: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub provider: ModelProvider,
    pub model: String,
    pub base_url: Option<String>,
    pub temperature: f64,
    pub max_new_tokens: u32,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            provider: ModelProvider::Huggingface,
            model: "mistralai/Mistral-7B-Instruct-v0.3".to_string(),
            base_url: None,
            temperature: 0.5,
            max_new_tokens: 512,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageProvider {
    Serpapi,
    Wikipedia,
    #[serde(rename = "none")]
    Disabled,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageSearchSettings {
    pub provider: ImageProvider,
    pub base_url: Option<String>,
}

impl Default for ImageSearchSettings {
    fn default() -> Self {
        Self {
            provider: ImageProvider::Serpapi,
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Unset means requests to hosted services never time out.
    pub timeout_secs: Option<u64>,
}

impl HttpSettings {
    pub fn build_client(&self) -> Result<reqwest::Client, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder.build().map_err(ApiError::internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_config_uses_defaults() {
        let settings = Settings::from_value(&json!({})).unwrap();

        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.index.top_k, 3);
        assert_eq!(settings.embedding.provider, ModelProvider::Huggingface);
        assert_eq!(settings.embedding.model, "sentence-transformers/all-MiniLM-L6-v2");
        assert_eq!(settings.generator.model, "mistralai/Mistral-7B-Instruct-v0.3");
        assert_eq!(settings.generator.temperature, 0.5);
        assert_eq!(settings.generator.max_new_tokens, 512);
        assert_eq!(settings.image_search.provider, ImageProvider::Serpapi);
        assert!(settings.http.timeout_secs.is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let settings = Settings::from_value(&json!({
            "generator": { "provider": "openai_compatible", "base_url": "http://localhost:1234" },
            "image_search": { "provider": "wikipedia" },
            "index": { "top_k": 5 }
        }))
        .unwrap();

        assert_eq!(settings.generator.provider, ModelProvider::OpenaiCompatible);
        assert_eq!(settings.generator.max_new_tokens, 512);
        assert_eq!(settings.image_search.provider, ImageProvider::Wikipedia);
        assert_eq!(settings.index.top_k, 5);
        assert_eq!(
            settings.index.path,
            PathBuf::from("vectorstore/medical_index.db")
        );
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = Settings::from_value(&json!({ "embedding": { "provider": "faiss" } }))
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
