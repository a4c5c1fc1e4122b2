use serde::{Deserialize, Serialize};

use super::disease_info::{extract_disease_info, DiseaseInfo};
use crate::rag::QaOutput;

const SOURCE_PREVIEW_CHARS: usize = 100;

/// Body returned by `POST /api/medical-query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalQueryResponse {
    pub message: String,
    pub sources: Vec<String>,
    #[serde(rename = "diseaseInfo")]
    pub disease_info: DiseaseInfo,
}

impl MedicalQueryResponse {
    pub fn assemble(output: QaOutput) -> Self {
        let sources = output
            .source_documents
            .iter()
            .map(|passage| truncate_source(&passage.content))
            .collect();
        let disease_info = extract_disease_info(&output.result);

        Self {
            message: output.result,
            sources,
            disease_info,
        }
    }
}

/// First 100 characters of a passage followed by `...`, whatever its length.
pub fn truncate_source(content: &str) -> String {
    let mut preview: String = content.chars().take(SOURCE_PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}
