use serde::{Deserialize, Serialize};

use crate::core::config::settings::GeneratorSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f64,
    pub max_new_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            max_new_tokens: 512,
        }
    }
}

impl From<&GeneratorSettings> for GenerationParams {
    fn from(settings: &GeneratorSettings) -> Self {
        Self {
            temperature: settings.temperature,
            max_new_tokens: settings.max_new_tokens,
        }
    }
}
