//! Fixed prompt templates.
//!
//! The medical-query wording is load-bearing: the disease-card extractor
//! relies on the generator echoing the section keywords it asks for.

const MEDICAL_QUERY_TEMPLATE: &str = "
Use the pieces of information provided in the context to answer the user's medical question.
If you don't know the answer, just say that you don't know, don't try to make up an answer.
Format your response in a clear, organized manner. If discussing a disease, include information about:
- Brief description
- Symptoms
- Causes
- Treatments
- Prevention methods (if applicable)

Context: {context}
Question: {question}

Start the answer directly. No small talk please.
";

const SESSION_TEMPLATE: &str = "Use the given context to answer the user's question.
If you don't know the answer, say so instead of making up an answer.
Context: {context}
Question: {question}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    template: &'static str,
}

impl PromptTemplate {
    /// Template used by the HTTP API.
    pub fn medical_query() -> Self {
        Self {
            template: MEDICAL_QUERY_TEMPLATE,
        }
    }

    /// Template used by the interactive chat session.
    pub fn session() -> Self {
        Self {
            template: SESSION_TEMPLATE,
        }
    }

    pub fn template(&self) -> &'static str {
        self.template
    }

    /// Substitutes `{context}` and `{question}`. Substituted text is not
    /// scanned again, so braces inside passages or questions are kept as-is.
    pub fn render(&self, context: &str, question: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template;

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            if let Some(after) = tail.strip_prefix("{context}") {
                out.push_str(context);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{question}") {
                out.push_str(question);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}
