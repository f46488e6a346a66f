//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [embedding]              # embedder selection and dimension
//! [embedding.openai]       # OpenAI-compatible endpoint settings
//! [memory]                 # record database and search defaults
//! [logging]                # console filter and file logging
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{ConfigError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MnemoConfig {
    /// Embedding provider configuration.
    pub embedding: Option<EmbeddingConfig>,

    /// Memory store configuration.
    pub memory: Option<MemoryConfig>,

    /// Logging configuration.
    pub logging: Option<LoggingConfig>,
}

impl MnemoConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections are replaced whole, not merged field by field.
    pub fn merge(&mut self, other: MnemoConfig) {
        if other.embedding.is_some() {
            self.embedding = other.embedding;
        }

        if other.memory.is_some() {
            self.memory = other.memory;
        }

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// The `[embedding]` section, or its defaults.
    pub fn embedding(&self) -> EmbeddingConfig {
        self.embedding.clone().unwrap_or_default()
    }

    /// The `[memory]` section, or its defaults.
    pub fn memory(&self) -> MemoryConfig {
        self.memory.clone().unwrap_or_default()
    }

    /// The `[logging]` section, or its defaults.
    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    /// Check values that parse but cannot be used.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref embedding) = self.embedding
            && embedding.configured_dimensions() == Some(0)
        {
            return Err(ConfigError::InvalidValue {
                field: "embedding.dimensions".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if let Some(ref memory) = self.memory
            && memory.default_k == 0
        {
            return Err(ConfigError::InvalidValue {
                field: "memory.default_k".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Embedding Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Embedding provider configuration.
///
/// The dimension chosen here is fixed for the process lifetime; every stored
/// vector is recomputed at that dimension on startup.
///
/// ```toml
/// [embedding]
/// provider = "openai"       # "openai" or "mock"
/// dimensions = 1536
///
/// [embedding.openai]
/// model = "text-embedding-3-small"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider: "openai" or "mock".
    pub provider: EmbeddingProvider,
    /// Output embedding dimensions. Default depends on provider.
    pub dimensions: Option<usize>,
    /// OpenAI-specific embedding settings.
    pub openai: Option<EmbeddingOpenAiConfig>,
}

impl EmbeddingConfig {
    /// Dimensions set explicitly in `[embedding]` or `[embedding.openai]`.
    ///
    /// `None` leaves the choice to the embedder's own default for the
    /// provider and model.
    pub fn configured_dimensions(&self) -> Option<usize> {
        self.dimensions
            .or_else(|| self.openai.as_ref().and_then(|o| o.dimensions))
    }

    /// Whether `[embedding.openai]` carries an inline API key.
    pub fn has_plaintext_api_key(&self) -> bool {
        self.openai.as_ref().is_some_and(|o| o.api_key.is_some())
    }
}

/// Supported embedding providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// OpenAI-compatible embeddings API.
    OpenAi,
    /// Deterministic offline embedder.
    #[default]
    Mock,
}

impl EmbeddingProvider {
    /// Provider name as written in config.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }

    /// Environment variable holding this provider's API key, if it needs one.
    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Mock => None,
        }
    }
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OpenAI embedding provider settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EmbeddingOpenAiConfig {
    /// Model name. Default: "text-embedding-3-small".
    pub model: String,
    /// Override dimensions (OpenAI supports reduced output).
    pub dimensions: Option<usize>,
    /// Custom base URL (for proxies and compatible servers).
    pub base_url: Option<String>,
    /// API key (prefer the env var).
    pub api_key: Option<String>,
}

impl Default for EmbeddingOpenAiConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: None,
            base_url: None,
            api_key: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Default database filename inside the config directory.
const DEFAULT_DATABASE_FILE: &str = "memory.db";

/// Memory store configuration.
///
/// ```toml
/// [memory]
/// database = "memory.db"
/// default_k = 3
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Path to the SQLite database for memory records.
    /// Relative paths are resolved from the config directory.
    pub database: Option<PathBuf>,
    /// Neighbors returned when a search does not ask for a count.
    pub default_k: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            database: None,
            default_k: 3,
        }
    }
}

impl MemoryConfig {
    /// Resolve the database path against `base_dir`.
    pub fn database_path(&self, base_dir: &Path) -> PathBuf {
        match &self.database {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => base_dir.join(path),
            None => base_dir.join(DEFAULT_DATABASE_FILE),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Logging configuration section.
///
/// ```toml
/// [logging]
/// filter = "mnemo=debug,warn"
/// file = true
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive for console output. Overrides the default level.
    pub filter: Option<String>,
    /// Write daily-rolling JSON logs under `<config dir>/logs/`.
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            file: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
