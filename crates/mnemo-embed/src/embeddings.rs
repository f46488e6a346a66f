//! The [`Embedder`] trait and its providers.
//!
//! # Implementations
//!
//! - [`MockEmbedder`]: deterministic hash-seeded vectors for tests and offline use
//! - [`OpenAiEmbedder`]: OpenAI-compatible `/embeddings` HTTP endpoint

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{EmbedError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Embedder Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for generating text embeddings.
///
/// Implementations must be deterministic for a given text and must always
/// return vectors of length [`Embedder::dimensions`].
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts in a batch.
    ///
    /// Default implementation calls `embed` for each text sequentially.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Dimensionality of the vectors this embedder produces.
    fn dimensions(&self) -> usize;

    /// Provider name, used in logs and stats.
    fn name(&self) -> &str;
}

/// A shared embedder that can be used across threads.
pub type SharedEmbedder = Arc<dyn Embedder>;

// ─────────────────────────────────────────────────────────────────────────────
// Mock Embedder
// ─────────────────────────────────────────────────────────────────────────────

/// Default dimensions for the mock embedder (same as all-MiniLM-L6-v2).
pub const DEFAULT_MOCK_DIMENSIONS: usize = 384;

/// Deterministic embedder seeded from a hash of the text.
///
/// Blank text is rejected, which makes it easy to produce an unembeddable
/// record in tests.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    dimensions: usize,
}

impl MockEmbedder {
    /// Create a mock embedder with the given dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_MOCK_DIMENSIONS)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(EmbedError::InvalidInput("text is blank".to_string()));
        }

        let mut state = djb2(text);
        let mut embedding: Vec<f32> = (0..self.dimensions)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((state >> 40) as f32 / (1u64 << 23) as f32) - 1.0
            })
            .collect();

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut embedding {
                *x /= norm;
            }
        }

        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn djb2(s: &str) -> u64 {
    s.bytes()
        .fold(5381u64, |hash, byte| hash.wrapping_mul(33).wrapping_add(byte as u64))
}

// ─────────────────────────────────────────────────────────────────────────────
// OpenAI Embedder
// ─────────────────────────────────────────────────────────────────────────────

use reqwest::Client;
use std::time::Duration;

/// Configuration for OpenAI-compatible embeddings.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedderConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Model to use for embeddings.
    pub model: String,
    /// Reduced output dimensions (text-embedding-3 models only).
    pub dimensions: Option<usize>,
    /// Request timeout.
    pub timeout: Duration,
}

impl OpenAiEmbedderConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: None,
            timeout: Duration::from_secs(60),
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Request reduced output dimensions.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    /// Dimensions the configured model will return.
    pub fn effective_dimensions(&self) -> usize {
        if let Some(d) = self.dimensions {
            return d;
        }
        match self.model.as_str() {
            "text-embedding-3-large" => 3072,
            _ => 1536,
        }
    }
}

/// OpenAI embeddings API client.
pub struct OpenAiEmbedder {
    client: Client,
    config: OpenAiEmbedderConfig,
}

impl OpenAiEmbedder {
    /// Create a new OpenAI embedder.
    pub fn new(config: OpenAiEmbedderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EmbedError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::Internal("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: self.config.model.clone(),
            input: texts.iter().map(|s| s.to_string()).collect(),
            dimensions: self.config.dimensions,
        };

        let response = self
            .client
            .post(self.embeddings_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbedError::Backend(format!(
                "Embedding request failed: HTTP {} - {}",
                status, body
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbedError::Serialization(format!("Failed to parse response: {}", e)))?;

        if result.data.len() != texts.len() {
            return Err(EmbedError::Backend(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                result.data.len()
            )));
        }

        let mut embeddings = result.data;
        embeddings.sort_by_key(|e| e.index);

        Ok(embeddings.into_iter().map(|e| e.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.config.effective_dimensions()
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Debug, serde::Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, serde::Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, serde::Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Embedder Factory
// ─────────────────────────────────────────────────────────────────────────────

/// Provider-agnostic description of the embedder to build.
///
/// The binary fills this from `mnemo_config::EmbeddingConfig`, which keeps
/// this crate free of a config dependency.
#[derive(Debug, Clone, Default)]
pub struct EmbedderSpec {
    /// Provider name: "mock" or "openai".
    pub provider: String,
    /// OpenAI API key (required for "openai").
    pub openai_api_key: Option<String>,
    /// OpenAI model name.
    pub openai_model: Option<String>,
    /// OpenAI base URL override.
    pub openai_base_url: Option<String>,
    /// Requested dimensions.
    pub dimensions: Option<usize>,
}

/// Build a [`SharedEmbedder`] from a spec.
pub fn build_embedder(spec: &EmbedderSpec) -> Result<SharedEmbedder> {
    match spec.provider.as_str() {
        "openai" => {
            let api_key = spec.openai_api_key.as_deref().ok_or_else(|| {
                EmbedError::Config(
                    "OpenAI embedding provider requires an API key. \
                     Set OPENAI_API_KEY or configure [embedding.openai] api_key."
                        .to_string(),
                )
            })?;
            let mut config = OpenAiEmbedderConfig::new(api_key);
            if let Some(ref model) = spec.openai_model {
                config = config.with_model(model);
            }
            if let Some(ref base_url) = spec.openai_base_url {
                config = config.with_base_url(base_url);
            }
            if let Some(dims) = spec.dimensions {
                config = config.with_dimensions(dims);
            }
            Ok(Arc::new(OpenAiEmbedder::new(config)?))
        }
        "mock" => {
            let dims = spec.dimensions.unwrap_or(DEFAULT_MOCK_DIMENSIONS);
            Ok(Arc::new(MockEmbedder::new(dims)))
        }
        other => Err(EmbedError::Config(format!(
            "Unknown embedding provider '{}'. Valid: mock, openai",
            other
        ))),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_embedder_unit_length() {
        let embedder = MockEmbedder::default();
        assert_eq!(embedder.dimensions(), 384);
        assert_eq!(embedder.name(), "mock");

        let embedding = embedder.embed("hello world").await.unwrap();
        assert_eq!(embedding.len(), 384);

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_mock_embedder_deterministic() {
        let embedder = MockEmbedder::new(8);

        let e1 = embedder.embed("test text").await.unwrap();
        let e2 = embedder.embed("test text").await.unwrap();
        assert_eq!(e1, e2);

        let e3 = embedder.embed("other text").await.unwrap();
        assert_ne!(e1, e3);
    }

    #[tokio::test]
    async fn test_mock_embedder_rejects_blank_text() {
        let embedder = MockEmbedder::new(4);
        assert!(matches!(
            embedder.embed("   ").await,
            Err(EmbedError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_embed_batch_fails_on_any_blank() {
        let embedder = MockEmbedder::new(4);

        let ok = embedder.embed_batch(&["one", "two"]).await.unwrap();
        assert_eq!(ok.len(), 2);
        assert!(ok.iter().all(|e| e.len() == 4));

        assert!(embedder.embed_batch(&["one", ""]).await.is_err());
    }

    #[test]
    fn test_openai_config_dimensions() {
        let config = OpenAiEmbedderConfig::new("key");
        assert_eq!(config.effective_dimensions(), 1536);

        let config = config.with_model("text-embedding-3-large");
        assert_eq!(config.effective_dimensions(), 3072);

        let config = config.with_dimensions(256);
        assert_eq!(config.effective_dimensions(), 256);
    }

    #[test]
    fn test_openai_request_omits_unset_dimensions() {
        let request = EmbeddingRequest {
            model: "m".to_string(),
            input: vec!["x".to_string()],
            dimensions: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("dimensions").is_none());
    }

    #[test]
    fn test_build_embedder_mock() {
        let spec = EmbedderSpec {
            provider: "mock".to_string(),
            dimensions: Some(16),
            ..Default::default()
        };
        let embedder = build_embedder(&spec).unwrap();
        assert_eq!(embedder.dimensions(), 16);
        assert_eq!(embedder.name(), "mock");
    }

    #[test]
    fn test_build_embedder_defaults_dimensions_per_provider() {
        let mock = build_embedder(&EmbedderSpec {
            provider: "mock".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(mock.dimensions(), DEFAULT_MOCK_DIMENSIONS);

        let large = build_embedder(&EmbedderSpec {
            provider: "openai".to_string(),
            openai_api_key: Some("sk-test".to_string()),
            openai_model: Some("text-embedding-3-large".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(large.dimensions(), 3072);
    }

    #[test]
    fn test_build_embedder_openai_requires_key() {
        let spec = EmbedderSpec {
            provider: "openai".to_string(),
            ..Default::default()
        };
        assert!(matches!(build_embedder(&spec), Err(EmbedError::Config(_))));
    }

    #[test]
    fn test_build_embedder_unknown_provider() {
        let spec = EmbedderSpec {
            provider: "onnx".to_string(),
            ..Default::default()
        };
        assert!(matches!(build_embedder(&spec), Err(EmbedError::Config(_))));
    }
}
