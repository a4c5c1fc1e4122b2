use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::ImageLookup;
use crate::core::errors::ApiError;

const DEFAULT_SERPAPI_URL: &str = "https://serpapi.com";

/// Google Images through SerpAPI.
#[derive(Clone)]
pub struct SerpApiImageLookup {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl SerpApiImageLookup {
    pub fn new(client: Client, base_url: Option<&str>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(DEFAULT_SERPAPI_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key,
            client,
        }
    }
}

#[async_trait]
impl ImageLookup for SerpApiImageLookup {
    fn name(&self) -> &str {
        "serpapi"
    }

    async fn lookup(&self, disease_key: &str) -> Result<Option<String>, ApiError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ApiError::Internal("SERPAPI_KEY is missing".to_string()))?;

        let query = format!("{} disease", disease_key);
        let url = format!(
            "{}/search?q={}&tbm=isch&api_key={}",
            self.base_url,
            urlencoding::encode(&query),
            urlencoding::encode(api_key)
        );

        let response = self.client.get(url).send().await.map_err(ApiError::internal)?;

        if !response.status().is_success() {
            tracing::debug!("SerpAPI image search returned {}", response.status());
            return Ok(None);
        }

        let payload: Value = response.json().await.map_err(ApiError::internal)?;
        Ok(first_original_image(&payload))
    }
}

fn first_original_image(payload: &Value) -> Option<String> {
    payload
        .get("images_results")
        .and_then(|v| v.as_array())
        .and_then(|items| items.first())
        .and_then(|item| item.get("original"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}
