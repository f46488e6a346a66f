//! CLI command handlers.

pub mod add;
pub mod search;
pub mod stats;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use mnemo_config::{EmbeddingConfig, LoadedConfig};
use mnemo_embed::{EmbedderSpec, SharedEmbedder};
use mnemo_memory::{LoadReport, MemoryService, SqliteRecordStore, VectorInput};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Merged configuration and where it came from.
    pub loaded: LoadedConfig,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

/// A ready memory service plus what it took to get there.
pub struct Session {
    pub service: MemoryService,
    pub embedder: SharedEmbedder,
    pub database: PathBuf,
    pub load: LoadReport,
}

impl Context {
    /// Path of the SQLite record database.
    pub fn database_path(&self) -> Result<PathBuf> {
        let base = self.loaded.require_config_dir()?;
        Ok(self.loaded.config.memory().database_path(base))
    }

    /// Neighbors to return when the user does not pass `-k`.
    pub fn default_k(&self) -> usize {
        self.loaded.config.memory().default_k
    }

    /// Open the record store, build the embedder, and load the index.
    pub async fn open_session(&self) -> Result<Session> {
        let database = self.database_path()?;
        let store = SqliteRecordStore::open(&database)
            .with_context(|| format!("Failed to open memory database at {}", database.display()))?;

        let embedding = self.loaded.config.embedding();
        let spec = build_embedder_spec(&embedding)?;
        let embedder = mnemo_embed::build_embedder(&spec).context("Failed to build embedder")?;

        let service = MemoryService::new(Arc::new(store), embedder.clone())?
            .with_default_k(self.default_k());
        let load = service.load().await?;

        Ok(Session {
            service,
            embedder,
            database,
            load,
        })
    }
}

/// Build an EmbedderSpec from EmbeddingConfig.
fn build_embedder_spec(config: &EmbeddingConfig) -> Result<EmbedderSpec> {
    let openai = config.openai.as_ref();
    let openai_api_key = mnemo_config::resolve_api_key(config)?.map(|secret| {
        tracing::debug!("Using embedding API key from {}", secret.source);
        secret.value
    });

    Ok(EmbedderSpec {
        provider: config.provider.as_str().to_string(),
        openai_api_key,
        openai_model: openai.map(|c| c.model.clone()),
        openai_base_url: openai.and_then(|c| c.base_url.clone()),
        // Unset dimensions fall back to the embedder's provider default.
        dimensions: config.configured_dimensions(),
    })
}

/// Parse a `--vector` argument: a JSON array, flat or single-row nested.
pub fn parse_vector(s: &str) -> std::result::Result<VectorInput, String> {
    serde_json::from_str(s).map_err(|e| format!("expected a JSON array of numbers: {e}"))
}

pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() <= max_len {
        s
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_config::{EmbeddingOpenAiConfig, EmbeddingProvider};

    #[test]
    fn test_parse_vector_shapes() {
        assert_eq!(
            parse_vector("[1, 0.5]").unwrap(),
            VectorInput::Flat(vec![1.0, 0.5])
        );
        assert_eq!(
            parse_vector("[[1, 0.5]]").unwrap(),
            VectorInput::Rows(vec![vec![1.0, 0.5]])
        );
        assert!(parse_vector("one,two").is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer line of text", 10), "a much ...");
        assert_eq!(truncate("two\nlines", 20), "two lines");
    }

    #[test]
    fn test_mock_spec_carries_dimensions() {
        let config = EmbeddingConfig {
            provider: EmbeddingProvider::Mock,
            dimensions: Some(4),
            openai: None,
        };
        let spec = build_embedder_spec(&config).unwrap();
        assert_eq!(spec.provider, "mock");
        assert_eq!(spec.dimensions, Some(4));
        assert!(spec.openai_api_key.is_none());
    }

    #[test]
    fn test_openai_spec_uses_config_key_and_omits_default_dimensions() {
        let config = EmbeddingConfig {
            provider: EmbeddingProvider::OpenAi,
            dimensions: None,
            openai: Some(EmbeddingOpenAiConfig {
                api_key: Some("sk-config".to_string()),
                base_url: Some("http://localhost:9999/v1".to_string()),
                ..Default::default()
            }),
        };
        let spec = build_embedder_spec(&config).unwrap();
        assert_eq!(spec.provider, "openai");
        assert!(spec.openai_api_key.is_some());
        assert_eq!(spec.openai_base_url.as_deref(), Some("http://localhost:9999/v1"));
        assert_eq!(spec.dimensions, None);
    }

    #[test]
    fn test_unset_dimensions_defer_to_embedder() {
        let spec = build_embedder_spec(&EmbeddingConfig::default()).unwrap();
        assert_eq!(spec.dimensions, None);

        let embedder = mnemo_embed::build_embedder(&spec).unwrap();
        assert_eq!(embedder.dimensions(), mnemo_embed::DEFAULT_MOCK_DIMENSIONS);
    }
}
