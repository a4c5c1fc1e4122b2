use std::env;

use serde_json::Value;

/// Credentials the hosted collaborators need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKey {
    HuggingFaceToken,
    SerpApiKey,
    OpenAiApiKey,
}

impl CredentialKey {
    pub fn config_key(self) -> &'static str {
        match self {
            CredentialKey::HuggingFaceToken => "hf_token",
            CredentialKey::SerpApiKey => "serpapi_api_key",
            CredentialKey::OpenAiApiKey => "openai_api_key",
        }
    }

    pub fn env_var(self) -> &'static str {
        match self {
            CredentialKey::HuggingFaceToken => "HF_TOKEN",
            CredentialKey::SerpApiKey => "SERPAPI_KEY",
            CredentialKey::OpenAiApiKey => "OPENAI_API_KEY",
        }
    }
}

pub trait CredentialProvider: Send + Sync {
    fn credential(&self, key: CredentialKey) -> Option<String>;
}

/// Reads `credentials.<key>` from the merged config (normally populated by
/// `secrets.yaml`), then the matching environment variable.
#[derive(Debug, Clone)]
pub struct ConfigCredentials {
    section: Value,
    use_env: bool,
}

impl ConfigCredentials {
    pub fn from_config(config: &Value) -> Self {
        Self {
            section: config.get("credentials").cloned().unwrap_or(Value::Null),
            use_env: true,
        }
    }

    /// Ignores the process environment.
    pub fn config_only(config: &Value) -> Self {
        Self {
            use_env: false,
            ..Self::from_config(config)
        }
    }
}

impl CredentialProvider for ConfigCredentials {
    fn credential(&self, key: CredentialKey) -> Option<String> {
        let from_config = self
            .section
            .get(key.config_key())
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        if from_config.is_some() || !self.use_env {
            return from_config;
        }

        env::var(key.env_var())
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}
