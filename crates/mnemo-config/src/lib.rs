//! Configuration system for mnemo.
//!
//! Provides TOML-based configuration with:
//! - Embedding provider selection and a process-wide dimension (`[embedding]`)
//! - Record database location and search defaults (`[memory]`)
//! - Console filter and file logging switches (`[logging]`)
//! - Config file layering (user config + project-local overrides)
//! - API key resolution (env var → config file)

pub mod discovery;
pub mod error;
pub mod secrets;
pub mod types;

pub use discovery::{
    CONFIG_DIR_ENV, ConfigSource, LoadedConfig, load_config, load_config_file,
    load_config_with_options, xdg_config_dir,
};
pub use error::{ConfigError, Result};
pub use secrets::{ResolvedSecret, SecretSource, resolve_api_key};
pub use types::*;
