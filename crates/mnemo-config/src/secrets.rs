//! API key resolution for embedding providers.
//!
//! Resolution order:
//! 1. Environment variable
//! 2. Config file (with warning at load time)

use crate::{ConfigError, EmbeddingConfig, Result};

/// Result of API key resolution with provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSecret {
    /// The secret value.
    pub value: String,
    /// Where the secret was found.
    pub source: SecretSource,
}

/// Where a secret was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// Environment variable.
    EnvVar(String),
    /// Config file (plaintext, not recommended).
    ConfigFile,
}

impl std::fmt::Display for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretSource::EnvVar(var) => write!(f, "env var {}", var),
            SecretSource::ConfigFile => write!(f, "config file (plaintext)"),
        }
    }
}

/// Resolve the API key for the configured provider.
///
/// Returns `Ok(None)` for providers that need no key, and
/// `ApiKeyNotFound` when a key is needed but missing everywhere.
pub fn resolve_api_key(config: &EmbeddingConfig) -> Result<Option<ResolvedSecret>> {
    let Some(env_var) = config.provider.api_key_env_var() else {
        return Ok(None);
    };
    let config_value = config.openai.as_ref().and_then(|o| o.api_key.as_deref());

    resolve_from(env_var, std::env::var(env_var).ok(), config_value)
        .map(Some)
        .ok_or_else(|| ConfigError::ApiKeyNotFound {
            provider: config.provider.to_string(),
            env_var: env_var.to_string(),
        })
}

fn resolve_from(
    env_var: &str,
    env_value: Option<String>,
    config_value: Option<&str>,
) -> Option<ResolvedSecret> {
    if let Some(value) = env_value
        && !value.is_empty()
    {
        return Some(ResolvedSecret {
            value,
            source: SecretSource::EnvVar(env_var.to_string()),
        });
    }

    config_value.filter(|v| !v.is_empty()).map(|v| ResolvedSecret {
        value: v.to_string(),
        source: SecretSource::ConfigFile,
    })
}
