//! Configuration error types.

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur during configuration loading and resolution.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a config file.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// API key not found through any resolution method.
    #[error(
        "API key not found for embedding provider '{provider}'. Set {env_var} or [embedding.openai] api_key"
    )]
    ApiKeyNotFound { provider: String, env_var: String },

    /// A value is present but unusable.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// No directory could be determined for config or data files.
    #[error("could not determine the mnemo config directory; set MNEMO_CONFIG_DIR")]
    NoConfigDir,
}
