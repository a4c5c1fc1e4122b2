use async_trait::async_trait;

use crate::core::errors::ApiError;

#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// return the provider name (e.g. "huggingface", "openai_compatible")
    fn name(&self) -> &str;

    /// complete a fully rendered prompt (non-streaming)
    async fn generate(&self, prompt: &str) -> Result<String, ApiError>;
}
