use std::sync::Arc;

use super::prompt::PromptTemplate;
use super::retriever::VectorRetriever;
use super::store::RetrievedPassage;
use crate::core::errors::ApiError;
use crate::llm::AnswerGenerator;

const DOCUMENT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone)]
pub struct QaOutput {
    pub result: String,
    pub source_documents: Vec<RetrievedPassage>,
}

/// "Stuff" retrieval QA: every retrieved passage goes into one prompt.
#[derive(Clone)]
pub struct RetrievalQa {
    retriever: VectorRetriever,
    generator: Arc<dyn AnswerGenerator>,
    prompt: PromptTemplate,
}

impl RetrievalQa {
    pub fn new(
        retriever: VectorRetriever,
        generator: Arc<dyn AnswerGenerator>,
        prompt: PromptTemplate,
    ) -> Self {
        Self {
            retriever,
            generator,
            prompt,
        }
    }

    pub async fn invoke(&self, query: &str) -> Result<QaOutput, ApiError> {
        let passages = self.retriever.retrieve(query).await?;
        tracing::info!(
            "Retrieved {} passages (k={})",
            passages.len(),
            self.retriever.top_k()
        );

        let context = stuff_context(&passages);
        let prompt = self.prompt.render(&context, query);
        tracing::debug!("Prompt length {} chars", prompt.len());

        let result = self.generator.generate(&prompt).await?;
        tracing::info!(
            "Generator {} returned {} chars",
            self.generator.name(),
            result.len()
        );

        Ok(QaOutput {
            result,
            source_documents: passages,
        })
    }
}

fn stuff_context(passages: &[RetrievedPassage]) -> String {
    passages
        .iter()
        .map(|p| p.content.as_str())
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EchoGenerator, FakeEmbeddings, FixedIndex, ScriptedGenerator};

    fn retriever(contents: &[&str]) -> VectorRetriever {
        VectorRetriever::new(
            Arc::new(FakeEmbeddings::new(3)),
            Arc::new(FixedIndex::with_contents(contents)),
            3,
        )
    }

    #[tokio::test]
    async fn prompt_contains_passages_joined_by_blank_line() {
        let generator = Arc::new(EchoGenerator::default());
        let chain = RetrievalQa::new(
            retriever(&["Gout is arthritis.", "Uric acid builds up.", "Diet matters.", "unused"]),
            generator.clone(),
            PromptTemplate::medical_query(),
        );

        let output = chain.invoke("What is gout?").await.unwrap();

        let prompt = generator.last_prompt().unwrap();
        assert!(prompt.contains(
            "Context: Gout is arthritis.\n\nUric acid builds up.\n\nDiet matters.\nQuestion: What is gout?"
        ));
        assert!(!prompt.contains("unused"));
        assert_eq!(output.result, prompt);
        assert_eq!(output.source_documents.len(), 3);
        assert_eq!(output.source_documents[0].content, "Gout is arthritis.");
    }

    #[tokio::test]
    async fn empty_index_still_generates() {
        let generator = Arc::new(ScriptedGenerator::answering("I don't know."));
        let chain = RetrievalQa::new(retriever(&[]), generator, PromptTemplate::session());

        let output = chain.invoke("What is gout?").await.unwrap();

        assert_eq!(output.result, "I don't know.");
        assert!(output.source_documents.is_empty());
    }

    #[tokio::test]
    async fn generator_failure_propagates_raw_text() {
        let generator = Arc::new(ScriptedGenerator::failing("rate limit reached"));
        let chain = RetrievalQa::new(retriever(&["x"]), generator, PromptTemplate::medical_query());

        let err = chain.invoke("q").await.unwrap_err();
        assert_eq!(err.detail(), "rate limit reached");
    }
}
