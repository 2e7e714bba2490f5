//! The client configuration file format.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::secrets::{SecretKind, SecretSource, resolve_secret_with};

const CONTEXT: &str = "client config";

/// Everything needed to construct a Concord client.
///
/// All fields are optional at parse time so files can be layered; call
/// [`ClientConfig::validate`] before building a client.
///
/// ```toml
/// client_id = "123456789012345678"
/// redirect_uri = "https://example.com/callback"
/// scopes = ["identify", "guilds"]
/// api_version = "10"
/// timeout_secs = 30
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Application (client) ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Application secret. Prefer `CONCORD_CLIENT_SECRET`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Key used to sign opaque tokens. Prefer `CONCORD_SIGNING_SECRET`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_secret: Option<String>,

    /// Bot token for guild joins. Prefer `CONCORD_BOT_TOKEN`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,

    /// Redirect URI registered with the application.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,

    /// Scope names requested at authorization time.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,

    /// API root override (without version).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    /// API version, e.g. "10".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Custom user agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl ClientConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: ClientConfig) {
        fn take(slot: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.client_id, other.client_id);
        take(&mut self.client_secret, other.client_secret);
        take(&mut self.signing_secret, other.signing_secret);
        take(&mut self.bot_token, other.bot_token);
        take(&mut self.redirect_uri, other.redirect_uri);
        take(&mut self.api_base, other.api_base);
        take(&mut self.api_version, other.api_version);
        take(&mut self.user_agent, other.user_agent);

        if !other.scopes.is_empty() {
            self.scopes = other.scopes;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
    }

    /// The configured request timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Secret value for a kind, as currently held in this config.
    pub fn secret(&self, kind: SecretKind) -> Option<&str> {
        match kind {
            SecretKind::ClientSecret => self.client_secret.as_deref(),
            SecretKind::SigningSecret => self.signing_secret.as_deref(),
            SecretKind::BotToken => self.bot_token.as_deref(),
        }
    }

    fn secret_mut(&mut self, kind: SecretKind) -> &mut Option<String> {
        match kind {
            SecretKind::ClientSecret => &mut self.client_secret,
            SecretKind::SigningSecret => &mut self.signing_secret,
            SecretKind::BotToken => &mut self.bot_token,
        }
    }

    /// Whether any secret is stored in plaintext in this config.
    pub fn has_plaintext_secrets(&self) -> bool {
        SecretKind::ALL.iter().any(|k| self.secret(*k).is_some())
    }

    /// Apply environment secrets over file values.
    ///
    /// Returns a warning for each secret that could only be found in the
    /// config file.
    pub fn resolve_secrets(&mut self) -> Vec<String> {
        self.resolve_secrets_with(|var| std::env::var(var).ok())
    }

    /// [`resolve_secrets`](Self::resolve_secrets) with an explicit env lookup.
    pub fn resolve_secrets_with<F>(&mut self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();
        for kind in SecretKind::ALL {
            let resolved = resolve_secret_with(kind, self.secret(kind), &lookup);
            if let Some(secret) = resolved {
                if secret.source == SecretSource::ConfigFile {
                    warnings.push(format!(
                        "{} is stored in plaintext in the config file; set {} instead",
                        kind,
                        kind.env_var()
                    ));
                }
                *self.secret_mut(kind) = Some(secret.value);
            }
        }
        warnings
    }

    /// Check that every field a client needs is present.
    pub fn validate(&self) -> Result<()> {
        require(&self.client_id, "client_id")?;
        require(&self.client_secret, "client_secret")?;
        require(&self.signing_secret, "signing_secret")?;

        if let Some(version) = &self.api_version
            && (version.is_empty() || !version.trim_start_matches('v').bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(ConfigError::InvalidField {
                field: "api_version".to_string(),
                reason: format!("'{}' is not a version number", version),
            });
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidField {
                field: "timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// The client ID, or a `MissingField` error.
    pub fn require_client_id(&self) -> Result<&str> {
        require(&self.client_id, "client_id")
    }
}

fn require<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::MissingField {
            field: field.to_string(),
            context: CONTEXT.to_string(),
        }),
    }
}
