//! Configuration loading for the Concord OAuth2 broker.
//!
//! Provides TOML-based configuration with:
//! - Config file layering (user config dir + project-local `concord.toml`)
//! - Secret resolution (env var → config file, with a plaintext warning)
//! - Validation of the fields a client cannot be built without

pub mod discovery;
pub mod error;
pub mod secrets;
pub mod types;

pub use discovery::{
    LoadedConfig, config_dir, config_path, load_config, load_config_file,
    load_config_with_options, save_config,
};
pub use error::{ConfigError, Result};
pub use secrets::{ResolvedSecret, SecretKind, SecretSource, resolve_secret};
pub use types::ClientConfig;
