//! HTTP client for an OpenAI-compatible embedding endpoint.

use recall_types::{EmbedError, Embedder};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Option<Vec<EmbedItem>>,
}

#[derive(Debug, Deserialize)]
struct EmbedItem {
    embedding: Vec<f32>,
}

/// Embedder backed by a POST /embeddings endpoint.
///
/// Every failure maps to [`EmbedError::Unavailable`]; callers treat that as
/// a degradation signal, not a hard error.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(url: String, api_key: Option<String>, model: Option<&str>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            api_key,
            model: model.unwrap_or("text-embedding-3-small").to_string(),
        }
    }

    pub fn from_env() -> Self {
        let url = std::env::var("EMBED_API_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1/embeddings".to_string());
        let api_key = std::env::var("EMBED_API_KEY").ok();
        let model = std::env::var("EMBED_MODEL").ok();
        Self::new(url, api_key, model.as_deref())
    }
}

#[async_trait::async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        // One request per batch; the endpoint accepts an input array and
        // returns items in input order.
        let body = serde_json::json!({
            "input": texts,
            "model": self.model
        });
        let mut req = self.client.post(&self.url).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        let res = req
            .send()
            .await
            .map_err(|e| EmbedError::Unavailable(e.to_string()))?;
        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| EmbedError::Unavailable(e.to_string()))?;
        if !status.is_success() {
            return Err(EmbedError::Unavailable(format!(
                "embed API error {status}: {body}"
            )));
        }
        let parsed: EmbedResponse =
            serde_json::from_str(&body).map_err(|e| EmbedError::Unavailable(e.to_string()))?;
        let items = parsed.data.ok_or(EmbedError::EmptyResponse)?;
        if items.len() != texts.len() {
            return Err(EmbedError::Unavailable(format!(
                "embed API returned {} items for {} inputs",
                items.len(),
                texts.len()
            )));
        }
        Ok(items.into_iter().map(|i| i.embedding).collect())
    }
}
