use thiserror::Error;

use crate::core::errors::ApiError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] ApiError),

    #[error("Missing credential: {0}")]
    Credentials(String),

    #[error("Failed to initialize embedding provider: {0}")]
    Embedding(#[source] ApiError),

    #[error("Failed to open knowledge index: {0}")]
    Index(#[source] ApiError),

    #[error("Failed to initialize answer generator: {0}")]
    Generator(#[source] ApiError),
}
