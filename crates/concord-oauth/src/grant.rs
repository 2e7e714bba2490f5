//! Token grants and their opaque, signed form.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use concord_types::ScopeSet;
use serde::{Deserialize, Serialize};

/// The provider's token-exchange result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub scope: String,
    /// When the exchange client received this grant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obtained_at: Option<DateTime<Utc>>,
}

impl Grant {
    /// The granted scopes. Unrecognized scope names are dropped.
    pub fn scopes(&self) -> ScopeSet {
        ScopeSet::parse(&self.scope)
    }

    /// Value for the `Authorization` header on resource requests.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    /// Whether the grant carries a refresh token.
    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    /// When the access token expires, if the receipt time is known.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.expires_in).ok()?;
        self.obtained_at
            .and_then(|at| at.checked_add_signed(Duration::seconds(secs)))
    }

    /// Whether the access token has expired. Unknown expiry counts as live;
    /// the provider is the authority on freshness.
    pub fn is_expired(&self) -> bool {
        self.expires_at().is_some_and(|at| at <= Utc::now())
    }
}

/// A signed, tamper-evident string encoding a [`Grant`].
///
/// This is the only credential callers hold after the initial exchange, and
/// the key under which resource views are cached.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpaqueToken(String);

impl OpaqueToken {
    /// Wrap a token string received from a caller.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the token string.
    pub fn into_string(self) -> String {
        self.0
    }

    /// A short, non-secret prefix for logs.
    pub fn fingerprint(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Debug for OpaqueToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpaqueToken({}…)", self.fingerprint())
    }
}

impl fmt::Display for OpaqueToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OpaqueToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for OpaqueToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for OpaqueToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}
