//! In-process fakes for the hosted collaborators.

use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::errors::ApiError;
use crate::image::ImageLookup;
use crate::llm::AnswerGenerator;
use crate::rag::{EmbeddingProvider, KnowledgeIndex, RetrievedPassage};

pub struct FakeEmbeddings {
    dim: usize,
    fail: bool,
}

impl FakeEmbeddings {
    pub fn new(dim: usize) -> Self {
        Self { dim, fail: false }
    }

    pub fn failing() -> Self {
        Self { dim: 0, fail: true }
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbeddings {
    fn model(&self) -> &str {
        "fake-embeddings"
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        if self.fail {
            return Err(ApiError::Internal("embedding service down".to_string()));
        }
        Ok(inputs
            .iter()
            .map(|input| {
                let mut v = vec![0.0; self.dim];
                if let Some(first) = v.first_mut() {
                    *first = input.len() as f32;
                }
                v
            })
            .collect())
    }
}

/// Returns its passages in insertion order, ignoring the query vector.
pub struct FixedIndex {
    passages: Vec<RetrievedPassage>,
    dimension: Option<usize>,
    last_limit: Mutex<Option<usize>>,
}

impl FixedIndex {
    pub fn with_contents(contents: &[&str]) -> Self {
        let passages = contents
            .iter()
            .enumerate()
            .map(|(i, content)| RetrievedPassage {
                passage_id: format!("p{}", i + 1),
                content: content.to_string(),
                source: "fixture".to_string(),
                metadata: None,
                score: 1.0 - i as f32 * 0.1,
            })
            .collect();
        Self {
            passages,
            dimension: None,
            last_limit: Mutex::new(None),
        }
    }

    pub fn with_dimension(mut self, dim: usize) -> Self {
        self.dimension = Some(dim);
        self
    }

    pub fn last_limit(&self) -> Option<usize> {
        *self.last_limit.lock().unwrap()
    }
}

#[async_trait]
impl KnowledgeIndex for FixedIndex {
    async fn search(
        &self,
        _query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedPassage>, ApiError> {
        *self.last_limit.lock().unwrap() = Some(limit);
        Ok(self.passages.iter().take(limit).cloned().collect())
    }

    async fn count(&self) -> Result<usize, ApiError> {
        Ok(self.passages.len())
    }

    async fn dimension(&self) -> Result<Option<usize>, ApiError> {
        Ok(self.dimension)
    }
}

/// Answers with the prompt it was given.
#[derive(Default)]
pub struct EchoGenerator {
    last_prompt: Mutex<Option<String>>,
}

impl EchoGenerator {
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnswerGenerator for EchoGenerator {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        Ok(prompt.to_string())
    }
}

pub struct ScriptedGenerator {
    reply: Result<String, String>,
    calls: Mutex<usize>,
}

impl ScriptedGenerator {
    pub fn answering(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: Mutex::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl AnswerGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ApiError> {
        *self.calls.lock().unwrap() += 1;
        self.reply.clone().map_err(ApiError::Internal)
    }
}

enum ImageReply {
    Found(String),
    Missing,
    Failing(String),
}

/// Records every key it is asked for.
pub struct FakeImageLookup {
    reply: ImageReply,
    calls: Mutex<Vec<String>>,
}

impl FakeImageLookup {
    fn with_reply(reply: ImageReply) -> Self {
        Self {
            reply,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn found(url: &str) -> Self {
        Self::with_reply(ImageReply::Found(url.to_string()))
    }

    pub fn missing() -> Self {
        Self::with_reply(ImageReply::Missing)
    }

    pub fn failing(message: &str) -> Self {
        Self::with_reply(ImageReply::Failing(message.to_string()))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageLookup for FakeImageLookup {
    fn name(&self) -> &str {
        "fake"
    }

    async fn lookup(&self, disease_key: &str) -> Result<Option<String>, ApiError> {
        self.calls.lock().unwrap().push(disease_key.to_string());
        match &self.reply {
            ImageReply::Found(url) => Ok(Some(url.clone())),
            ImageReply::Missing => Ok(None),
            ImageReply::Failing(msg) => Err(ApiError::Internal(msg.clone())),
        }
    }
}

/// Collects formatted log output for assertions.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        let writer = self.clone();
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
