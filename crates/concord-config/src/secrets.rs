//! Secret resolution.
//!
//! Resolution order:
//! 1. Environment variable
//! 2. Config file (with warning)

use std::fmt;

/// The secrets a client may need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretKind {
    ClientSecret,
    SigningSecret,
    BotToken,
}

impl SecretKind {
    /// Every secret kind.
    pub const ALL: [SecretKind; 3] = [Self::ClientSecret, Self::SigningSecret, Self::BotToken];

    /// Environment variable holding this secret.
    pub fn env_var(&self) -> &'static str {
        match self {
            SecretKind::ClientSecret => "CONCORD_CLIENT_SECRET",
            SecretKind::SigningSecret => "CONCORD_SIGNING_SECRET",
            SecretKind::BotToken => "CONCORD_BOT_TOKEN",
        }
    }

    /// Config file key for this secret.
    pub fn field(&self) -> &'static str {
        match self {
            SecretKind::ClientSecret => "client_secret",
            SecretKind::SigningSecret => "signing_secret",
            SecretKind::BotToken => "bot_token",
        }
    }
}

impl fmt::Display for SecretKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

/// Result of secret resolution with provenance.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedSecret {
    /// The secret value.
    pub value: String,
    /// Where the secret was found.
    pub source: SecretSource,
}

impl fmt::Debug for ResolvedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedSecret")
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Where a secret was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// Environment variable.
    EnvVar(String),
    /// Config file (plaintext, not recommended).
    ConfigFile,
}

impl fmt::Display for SecretSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretSource::EnvVar(var) => write!(f, "env var {}", var),
            SecretSource::ConfigFile => write!(f, "config file (plaintext)"),
        }
    }
}

/// Resolve a secret from the environment, falling back to the config value.
pub fn resolve_secret(kind: SecretKind, config_value: Option<&str>) -> Option<ResolvedSecret> {
    resolve_secret_with(kind, config_value, |var| std::env::var(var).ok())
}

/// [`resolve_secret`] with an explicit environment lookup.
pub(crate) fn resolve_secret_with<L>(
    kind: SecretKind,
    config_value: Option<&str>,
    lookup: L,
) -> Option<ResolvedSecret>
where
    L: Fn(&str) -> Option<String>,
{
    let env_var = kind.env_var();
    if let Some(value) = lookup(env_var)
        && !value.is_empty()
    {
        return Some(ResolvedSecret {
            value,
            source: SecretSource::EnvVar(env_var.to_string()),
        });
    }

    config_value
        .filter(|v| !v.is_empty())
        .map(|v| ResolvedSecret {
            value: v.to_string(),
            source: SecretSource::ConfigFile,
        })
}
