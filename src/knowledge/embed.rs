//! Text embedding backends.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::KnowledgeError;

/// Maximum inputs per embeddings request.
const EMBED_BATCH_SIZE: usize = 100;

/// Produces dense vectors for passages and queries.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed corpus passages, one vector per input, in input order.
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, KnowledgeError>;

    /// Embed a search query.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, KnowledgeError>;

    fn model_name(&self) -> &str;
}

/// Upstage Solar embeddings. Passages and queries use the `-passage` and
/// `-query` variants of the configured model family.
pub struct UpstageEmbedder {
    client: reqwest::Client,
    api_key: SecretString,
    api_base: String,
    model: String,
}

impl UpstageEmbedder {
    pub fn new(api_key: SecretString, api_base: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    async fn request(&self, model: &str, input: &[String]) -> Result<Vec<Vec<f32>>, KnowledgeError> {
        let resp = self
            .client
            .post(format!("{}/embeddings", self.api_base))
            .bearer_auth(self.api_key.expose_secret())
            .json(&EmbeddingRequest { model, input })
            .send()
            .await
            .map_err(|e| KnowledgeError::EmbeddingFailed {
                reason: format!("request failed: {e}"),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(KnowledgeError::EmbeddingFailed {
                reason: format!("HTTP {status}: {text}"),
            });
        }

        let mut parsed: EmbeddingResponse =
            resp.json().await.map_err(|e| KnowledgeError::EmbeddingFailed {
                reason: format!("invalid response: {e}"),
            })?;

        if parsed.data.len() != input.len() {
            return Err(KnowledgeError::EmbeddingFailed {
                reason: format!(
                    "expected {} embeddings, got {}",
                    input.len(),
                    parsed.data.len()
                ),
            });
        }
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for UpstageEmbedder {
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, KnowledgeError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = format!("{}-passage", self.model);
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBED_BATCH_SIZE) {
            debug!(model = %model, batch = batch.len(), "Embedding passages");
            vectors.extend(self.request(&model, batch).await?);
        }
        Ok(vectors)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, KnowledgeError> {
        let model = format!("{}-query", self.model);
        let mut vectors = self.request(&model, &[text.to_string()]).await?;
        vectors.pop().ok_or_else(|| KnowledgeError::EmbeddingFailed {
            reason: "empty embedding response".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn query_uses_query_model_variant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(body_partial_json(serde_json::json!({"model": "solar-embedding-1-large-query"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"index": 0, "embedding": [0.1, 0.2, 0.3]}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let embedder = UpstageEmbedder::new(SecretString::from("k"), server.uri(), "solar-embedding-1-large");
        let vector = embedder.embed_query("지진 대피").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn passages_are_reordered_by_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(body_partial_json(serde_json::json!({"model": "solar-embedding-1-large-passage"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"index": 1, "embedding": [0.0, 1.0]},
                    {"index": 0, "embedding": [1.0, 0.0]}
                ]
            })))
            .mount(&server)
            .await;

        let embedder = UpstageEmbedder::new(SecretString::from("k"), server.uri(), "solar-embedding-1-large");
        let vectors = embedder
            .embed_documents(vec!["a".into(), "b".into()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn http_error_is_embedding_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let embedder = UpstageEmbedder::new(SecretString::from("k"), server.uri(), "solar-embedding-1-large");
        let err = embedder.embed_query("x").await.unwrap_err();
        assert!(matches!(err, KnowledgeError::EmbeddingFailed { .. }));
    }
}
