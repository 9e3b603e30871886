//! Embedding service clients.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Embedding service unavailable: {0}")]
    Unavailable(String),

    #[error("Embedding request failed: {0}")]
    Request(String),

    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),
}

/// Black-box text-to-vector service.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn dimension(&self) -> usize;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Client for a REST embedding endpoint (`POST {base}/embed`).
pub struct HttpEmbeddingService {
    client: Client,
    base_url: String,
    dimension: usize,
}

impl HttpEmbeddingService {
    pub fn new(base_url: &str) -> Self {
        Self::with_dimension(base_url, 384)
    }

    pub fn with_dimension(base_url: &str, dimension: usize) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            dimension,
        }
    }
}

#[async_trait]
impl EmbeddingService for HttpEmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/embed", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&EmbedRequest { text })
            .send()
            .await
            .map_err(|e| EmbeddingError::Unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(EmbeddingError::Request(format!(
                "HTTP {}",
                resp.status().as_u16()
            )));
        }

        let body: EmbedResponse = resp
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        if body.embedding.is_empty() {
            return Err(EmbeddingError::InvalidResponse(
                "empty embedding returned".to_string(),
            ));
        }
        Ok(body.embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Deterministic embedding service for tests: feature slots keyed on
/// domain terms so related texts land near each other.
pub struct MockEmbeddingService {
    dimension: usize,
    fail: bool,
}

impl MockEmbeddingService {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fail: false,
        }
    }

    /// A service whose every call errors, for degradation tests.
    pub fn failing() -> Self {
        Self {
            dimension: 16,
            fail: true,
        }
    }

    fn generate(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0_f32; self.dimension.max(16)];
        let lower = text.to_lowercase();

        if lower.contains("defect") {
            embedding[0] = 0.8;
            embedding[1] = 0.6;
        }
        if lower.contains("quality") {
            embedding[2] = 0.7;
            embedding[3] = 0.5;
        }
        if lower.contains("forecast") || lower.contains("waste") {
            embedding[4] = 0.9;
            embedding[5] = 0.4;
        }
        if lower.contains("compliance") || lower.contains("cfr") {
            embedding[6] = 0.6;
            embedding[7] = 0.7;
        }
        if lower.contains("action") {
            embedding[8] = 0.5;
            embedding[9] = 0.8;
        }

        embedding[10] = (text.len() as f32).min(1000.0) / 1000.0;
        embedding.truncate(self.dimension);
        embedding
    }
}

#[async_trait]
impl EmbeddingService for MockEmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if self.fail {
            return Err(EmbeddingError::Unavailable("mock failure".to_string()));
        }
        Ok(self.generate(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_embedding_is_deterministic() {
        let service = MockEmbeddingService::new(16);
        let a = service.embed("defect probability rising").await.unwrap();
        let b = service.embed("defect probability rising").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert!(a[0] > 0.0);
    }

    #[tokio::test]
    async fn test_mock_embedding_distinguishes_topics() {
        let service = MockEmbeddingService::new(16);
        let defect = service.embed("defect analysis").await.unwrap();
        let compliance = service.embed("compliance audit").await.unwrap();
        assert_ne!(defect, compliance);
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let service = MockEmbeddingService::failing();
        assert!(service.embed("anything").await.is_err());
    }

    #[tokio::test]
    async fn test_embed_batch_default_impl() {
        let service = MockEmbeddingService::new(16);
        let texts = vec!["defect".to_string(), "quality".to_string()];
        let embeddings = service.embed_batch(&texts).await.unwrap();
        assert_eq!(embeddings.len(), 2);
    }
}
