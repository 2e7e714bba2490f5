//! CLI command handlers.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use concord_client::{CancellationToken, ConcordClient, OpaqueToken};
use concord_config::{ClientConfig, LoadedConfig};
use serde::Serialize;
use tracing::{debug, warn};

pub mod connections;
pub mod exchange;
pub mod guilds;
pub mod inspect;
pub mod join;
pub mod refresh;
pub mod revoke;
pub mod url;
pub mod user;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Explicit config file, bypassing discovery.
    pub config_path: Option<PathBuf>,
}

impl Context {
    /// Load and validate the client configuration.
    pub fn load_config(&self) -> Result<ClientConfig> {
        let loaded = match &self.config_path {
            Some(path) => LoadedConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => concord_config::load_config(None).context("Failed to load config")?,
        };

        for warning in &loaded.warnings {
            warn!("{}", warning);
        }
        for path in loaded.loaded_from() {
            debug!(path = %path.display(), "Loaded config");
        }

        loaded.config.validate().context("Invalid configuration")?;
        Ok(loaded.config)
    }

    /// Build a client whose upstream calls are abandoned on Ctrl-C.
    pub fn client(&self) -> Result<ConcordClient> {
        let config = self.load_config()?;
        let client = ConcordClient::from_config(&config).context("Failed to build client")?;

        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });

        Ok(client.with_cancellation(cancel))
    }
}

/// Wrap a token argument.
pub fn token_arg(token: &str) -> OpaqueToken {
    OpaqueToken::new(token.trim())
}

/// Print a value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
