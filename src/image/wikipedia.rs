use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::ImageLookup;
use crate::core::errors::ApiError;

const DEFAULT_WIKIPEDIA_URL: &str = "https://en.wikipedia.org";

/// Page-summary thumbnail from the Wikipedia REST API. Needs no credential.
#[derive(Clone)]
pub struct WikipediaImageLookup {
    base_url: String,
    client: Client,
}

impl WikipediaImageLookup {
    pub fn new(client: Client, base_url: Option<&str>) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(DEFAULT_WIKIPEDIA_URL)
                .trim_end_matches('/')
                .to_string(),
            client,
        }
    }
}

#[async_trait]
impl ImageLookup for WikipediaImageLookup {
    fn name(&self) -> &str {
        "wikipedia"
    }

    async fn lookup(&self, disease_key: &str) -> Result<Option<String>, ApiError> {
        let url = format!(
            "{}/api/rest_v1/page/summary/{}",
            self.base_url,
            urlencoding::encode(disease_key)
        );

        let response = self.client.get(url).send().await.map_err(ApiError::internal)?;
        if !response.status().is_success() {
            return Ok(None);
        }

        let payload: Value = response.json().await.map_err(ApiError::internal)?;
        Ok(thumbnail_source(&payload))
    }
}

fn thumbnail_source(payload: &Value) -> Option<String> {
    payload
        .get("thumbnail")
        .and_then(|t| t.get("source"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}
