pub mod huggingface;
pub mod openai_compat;
pub mod provider;
pub mod types;

pub use huggingface::HuggingFaceEndpoint;
pub use openai_compat::OpenAiCompatibleGenerator;
pub use provider::AnswerGenerator;
pub use types::{ChatMessage, GenerationParams};
