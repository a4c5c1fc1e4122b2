use std::sync::Arc;

use reqwest::Client;

use super::error::InitializationError;
use crate::core::config::settings::{
    EmbeddingSettings, GeneratorSettings, ImageProvider, ModelProvider,
};
use crate::core::config::{AppPaths, CredentialKey, CredentialProvider, Settings};
use crate::core::errors::ApiError;
use crate::image::{ImageLookup, SerpApiImageLookup, WikipediaImageLookup};
use crate::llm::{AnswerGenerator, GenerationParams, HuggingFaceEndpoint, OpenAiCompatibleGenerator};
use crate::rag::{
    EmbeddingProvider, HuggingFaceEmbeddings, KnowledgeIndex, OpenAiCompatibleEmbeddings,
    PromptTemplate, RetrievalQa, SqliteKnowledgeIndex, VectorRetriever,
};

const EMBEDDING_PROBE: &str = "medical knowledge base probe";

/// The collaborators built once at startup and shared read-only afterwards.
#[derive(Clone)]
pub struct QaPipeline {
    retriever: VectorRetriever,
    generator: Arc<dyn AnswerGenerator>,
}

impl QaPipeline {
    pub fn new(retriever: VectorRetriever, generator: Arc<dyn AnswerGenerator>) -> Self {
        Self {
            retriever,
            generator,
        }
    }

    pub fn chain(&self, prompt: PromptTemplate) -> RetrievalQa {
        RetrievalQa::new(self.retriever.clone(), self.generator.clone(), prompt)
    }
}

/// Outcome of startup; handlers check it on every request.
#[derive(Clone)]
pub enum PipelineStatus {
    Ready(Arc<QaPipeline>),
    Unavailable(String),
}

impl PipelineStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, PipelineStatus::Ready(_))
    }

    pub fn ready(&self) -> Result<&QaPipeline, ApiError> {
        match self {
            PipelineStatus::Ready(pipeline) => Ok(pipeline),
            PipelineStatus::Unavailable(_) => Err(ApiError::NotReady),
        }
    }
}

/// Builds the pipeline, folding any failure into `Unavailable`.
pub async fn initialize_pipeline(
    paths: &AppPaths,
    settings: &Settings,
    credentials: &dyn CredentialProvider,
    client: &Client,
) -> PipelineStatus {
    match build_pipeline(paths, settings, credentials, client).await {
        Ok(pipeline) => {
            tracing::info!("QA pipeline initialized");
            PipelineStatus::Ready(Arc::new(pipeline))
        }
        Err(err) => {
            tracing::error!("Failed to initialize QA pipeline: {}", err);
            PipelineStatus::Unavailable(err.to_string())
        }
    }
}

pub async fn build_pipeline(
    paths: &AppPaths,
    settings: &Settings,
    credentials: &dyn CredentialProvider,
    client: &Client,
) -> Result<QaPipeline, InitializationError> {
    let index_path = paths.resolve_data_path(&settings.index.path);
    tracing::info!("Loading knowledge index from {}", index_path.display());
    let index = SqliteKnowledgeIndex::open(&index_path)
        .await
        .map_err(InitializationError::Index)?;
    let passages = index.count().await.map_err(InitializationError::Index)?;
    tracing::info!("Knowledge index holds {} passages", passages);

    if let Some(model) = index.embedding_model().await.map_err(InitializationError::Index)? {
        if model != settings.embedding.model {
            tracing::warn!(
                "Index was built with embedding model {}, configured model is {}",
                model,
                settings.embedding.model
            );
        }
    }

    let embedder = build_embedder(&settings.embedding, credentials, client)?;
    if settings.embedding.verify_on_startup {
        verify_embedding_dimension(embedder.as_ref(), &index).await?;
    }

    let generator = build_generator(&settings.generator, credentials, client)?;
    tracing::info!(
        "Answer generator {} ready ({})",
        generator.name(),
        settings.generator.model
    );

    let retriever = VectorRetriever::new(embedder, Arc::new(index), settings.index.top_k);
    Ok(QaPipeline::new(retriever, generator))
}

fn build_embedder(
    settings: &EmbeddingSettings,
    credentials: &dyn CredentialProvider,
    client: &Client,
) -> Result<Arc<dyn EmbeddingProvider>, InitializationError> {
    match settings.provider {
        ModelProvider::Huggingface => {
            let token = require(credentials, CredentialKey::HuggingFaceToken)?;
            Ok(Arc::new(HuggingFaceEmbeddings::new(
                client.clone(),
                settings.base_url.as_deref(),
                &settings.model,
                token,
            )))
        }
        ModelProvider::OpenaiCompatible => {
            let base_url = settings.base_url.as_deref().ok_or_else(|| {
                InitializationError::Config(ApiError::BadRequest(
                    "embedding.base_url is required for openai_compatible".to_string(),
                ))
            })?;
            Ok(Arc::new(OpenAiCompatibleEmbeddings::new(
                client.clone(),
                base_url,
                &settings.model,
                credentials.credential(CredentialKey::OpenAiApiKey),
            )))
        }
    }
}

fn build_generator(
    settings: &GeneratorSettings,
    credentials: &dyn CredentialProvider,
    client: &Client,
) -> Result<Arc<dyn AnswerGenerator>, InitializationError> {
    let params = GenerationParams::from(settings);
    match settings.provider {
        ModelProvider::Huggingface => {
            let token = require(credentials, CredentialKey::HuggingFaceToken)?;
            Ok(Arc::new(HuggingFaceEndpoint::new(
                client.clone(),
                settings.base_url.as_deref(),
                &settings.model,
                token,
                params,
            )))
        }
        ModelProvider::OpenaiCompatible => {
            let base_url = settings.base_url.as_deref().ok_or_else(|| {
                InitializationError::Config(ApiError::BadRequest(
                    "generator.base_url is required for openai_compatible".to_string(),
                ))
            })?;
            Ok(Arc::new(OpenAiCompatibleGenerator::new(
                client.clone(),
                base_url,
                &settings.model,
                credentials.credential(CredentialKey::OpenAiApiKey),
                params,
            )))
        }
    }
}

/// Embeds a probe string and checks it against the index's recorded dimension.
pub async fn verify_embedding_dimension(
    embedder: &dyn EmbeddingProvider,
    index: &dyn KnowledgeIndex,
) -> Result<(), InitializationError> {
    let probe = embedder
        .embed(&[EMBEDDING_PROBE.to_string()])
        .await
        .map_err(InitializationError::Embedding)?;
    let dim = probe.first().map(Vec::len).unwrap_or(0);

    match index.dimension().await.map_err(InitializationError::Index)? {
        Some(expected) if expected != dim => Err(InitializationError::Embedding(
            ApiError::Internal(format!(
                "embedding model {} produces {}-dimensional vectors, index expects {}",
                embedder.model(),
                dim,
                expected
            )),
        )),
        Some(_) => Ok(()),
        None => {
            tracing::warn!("Knowledge index has no recorded dimension; skipping check");
            Ok(())
        }
    }
}

pub fn build_image_lookup(
    settings: &Settings,
    credentials: &dyn CredentialProvider,
    client: &Client,
) -> Option<Arc<dyn ImageLookup>> {
    let base_url = settings.image_search.base_url.as_deref();
    match settings.image_search.provider {
        ImageProvider::Serpapi => Some(Arc::new(SerpApiImageLookup::new(
            client.clone(),
            base_url,
            credentials.credential(CredentialKey::SerpApiKey),
        ))),
        ImageProvider::Wikipedia => Some(Arc::new(WikipediaImageLookup::new(
            client.clone(),
            base_url,
        ))),
        ImageProvider::Disabled => None,
    }
}

fn require(
    credentials: &dyn CredentialProvider,
    key: CredentialKey,
) -> Result<String, InitializationError> {
    credentials
        .credential(key)
        .ok_or_else(|| InitializationError::Credentials(format!("{} is missing", key.env_var())))
}
