//! Segment embeddings
//!
//! One HTTP provider speaks either Ollama's batch `/api/embed` or an
//! OpenAI-compatible `/v1/embeddings`. Vectors always come back in input
//! order and with the configured dimension, or the call fails.

use crate::config::EmbeddingSettings;
use crate::error::{ChecklistError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Texts sent per embedding request
const MAX_BATCH: usize = 32;

/// Capability: embed a list of texts, order-aligned with the input
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| ChecklistError::Generation("No embedding returned".to_string()))
    }

    fn dimension(&self) -> usize;
}

/// Wire protocol of an embedding endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    Ollama,
    OpenAiCompatible,
}

impl EmbeddingBackend {
    /// Ollama listens on 11434; anything else is treated as OpenAI-compatible
    pub fn detect(endpoint: &str) -> Self {
        if endpoint.contains("11434") {
            EmbeddingBackend::Ollama
        } else {
            EmbeddingBackend::OpenAiCompatible
        }
    }
}

pub struct HttpEmbedding {
    backend: EmbeddingBackend,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    dimension: usize,
    client: reqwest::Client,
}

impl HttpEmbedding {
    pub fn new(
        backend: EmbeddingBackend,
        endpoint: &str,
        model: &str,
        dimension: usize,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            backend,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
            dimension,
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    pub fn from_settings(settings: &EmbeddingSettings, timeout: Duration) -> Result<Self> {
        let provider = Self::new(
            EmbeddingBackend::detect(&settings.endpoint),
            &settings.endpoint,
            &settings.model,
            settings.dimension,
            timeout,
        )?;
        Ok(provider.with_api_key(settings.api_key.clone()))
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn backend(&self) -> EmbeddingBackend {
        self.backend
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // Both APIs take {model, input: [..]}
        let url = match self.backend {
            EmbeddingBackend::Ollama => format!("{}/api/embed", self.endpoint),
            EmbeddingBackend::OpenAiCompatible => format!("{}/v1/embeddings", self.endpoint),
        };
        let body = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ChecklistError::Generation(format!(
                "Embedding request failed: {} - {}",
                status, detail
            )));
        }

        let vectors = match self.backend {
            EmbeddingBackend::Ollama => response.json::<OllamaEmbedResponse>().await?.embeddings,
            EmbeddingBackend::OpenAiCompatible => {
                let mut data = response.json::<OpenAiEmbedResponse>().await?.data;
                data.sort_by_key(|item| item.index);
                data.into_iter().map(|item| item.embedding).collect()
            }
        };

        self.check_shape(texts.len(), vectors)
    }

    fn check_shape(&self, expected: usize, vectors: Vec<Vec<f32>>) -> Result<Vec<Vec<f32>>> {
        if vectors.len() != expected {
            return Err(ChecklistError::Generation(format!(
                "Embedding endpoint returned {} vectors for {} inputs",
                vectors.len(),
                expected
            )));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(ChecklistError::Generation(format!(
                "Embedding has dimension {}, expected {}",
                bad.len(),
                self.dimension
            )));
        }
        Ok(vectors)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for HttpEmbedding {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH) {
            tracing::debug!("Embedding {} segments with {}", batch.len(), self.model);
            vectors.extend(self.request(batch).await?);
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedItem>,
}

#[derive(Deserialize)]
struct OpenAiEmbedItem {
    index: usize,
    embedding: Vec<f32>,
}

/// Deterministic offline provider: vectors derived from the text's fingerprint
pub struct MockEmbedding {
    dimension: usize,
}

impl MockEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockEmbedding {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let digest = crate::ingest::fingerprint_text(text);
                let bytes = digest.as_str().as_bytes();
                (0..self.dimension)
                    .map(|i| f32::from(bytes[i % bytes.len()]) / 127.5 - 1.0)
                    .collect()
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_detection() {
        assert_eq!(
            EmbeddingBackend::detect("http://localhost:11434"),
            EmbeddingBackend::Ollama
        );
        assert_eq!(
            EmbeddingBackend::detect("https://api.openai.com"),
            EmbeddingBackend::OpenAiCompatible
        );
    }

    #[test]
    fn test_from_settings() {
        let settings = EmbeddingSettings {
            endpoint: "https://embeddings.example.com/".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key: Some("  ".to_string()),
            dimension: 1536,
        };
        let provider = HttpEmbedding::from_settings(&settings, Duration::from_secs(5)).unwrap();

        assert_eq!(provider.backend(), EmbeddingBackend::OpenAiCompatible);
        assert_eq!(provider.endpoint, "https://embeddings.example.com");
        assert!(provider.api_key.is_none());
        assert_eq!(provider.dimension(), 1536);
    }

    #[test]
    fn test_shape_checks() {
        let provider = HttpEmbedding::new(
            EmbeddingBackend::Ollama,
            "http://localhost:11434",
            "nomic-embed-text",
            2,
            Duration::from_secs(5),
        )
        .unwrap();

        assert!(provider.check_shape(2, vec![vec![0.0, 1.0], vec![1.0, 0.0]]).is_ok());
        assert!(provider.check_shape(3, vec![vec![0.0, 1.0]]).is_err());
        assert!(provider.check_shape(1, vec![vec![0.0, 1.0, 2.0]]).is_err());
    }

    #[tokio::test]
    async fn test_mock_embedding_is_deterministic() {
        let provider = MockEmbedding::new(8);
        let texts = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let batch = provider.embed_batch(&texts).await.unwrap();

        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].len(), 8);
        assert_eq!(batch[0], batch[2]);
        assert_ne!(batch[0], batch[1]);
        assert_eq!(provider.embed("a").await.unwrap(), batch[0]);
    }
}
