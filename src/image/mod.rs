//! Disease image lookup for the interactive session.

mod serpapi;
mod wikipedia;

use async_trait::async_trait;

use crate::core::errors::ApiError;

pub use serpapi::SerpApiImageLookup;
pub use wikipedia::WikipediaImageLookup;

#[async_trait]
pub trait ImageLookup: Send + Sync {
    fn name(&self) -> &str;

    /// URL of an image for `disease_key`, `None` when the provider has none.
    async fn lookup(&self, disease_key: &str) -> Result<Option<String>, ApiError>;
}

/// Lookup key for a user's input: lower-cased, trimmed, spaces → `_`.
pub fn disease_key(input: &str) -> String {
    input.to_lowercase().trim().replace(' ', "_")
}

/// First character upper-cased, the rest lower-cased.
pub fn caption(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disease_key_normalizes_input() {
        assert_eq!(disease_key("  Type 2 Diabetes "), "type_2_diabetes");
        assert_eq!(disease_key("Malaria"), "malaria");
        assert_eq!(disease_key(""), "");
    }

    #[test]
    fn disease_key_keeps_inner_whitespace_runs() {
        assert_eq!(disease_key("high  blood pressure"), "high__blood_pressure");
    }

    #[test]
    fn caption_capitalizes_first_letter_only() {
        assert_eq!(caption("what is ASTHMA?"), "What is asthma?");
        assert_eq!(caption("éczema"), "Éczema");
        assert_eq!(caption(""), "");
    }
}
