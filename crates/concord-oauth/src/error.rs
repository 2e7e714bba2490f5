//! Error types for the OAuth layer.

use concord_types::Scope;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, OAuthError>;

/// Errors surfaced by token exchange, token verification, and resource fetches.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Missing redirect URI, credentials, or signing secret.
    #[error("Config error: {0}")]
    Config(String),

    /// Malformed caller input, rejected before any network call.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// An opaque token failed signature verification or could not be decoded.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The provider rejected the request.
    #[error("Upstream error ({status}) from {endpoint}: {code}: {message}")]
    Upstream {
        /// Provider error code (`invalid_grant`, `50001`, ...).
        code: String,
        /// Human-readable message from the provider.
        message: String,
        /// HTTP status code.
        status: u16,
        /// Full URL of the endpoint that failed.
        endpoint: String,
    },

    /// A privileged action was attempted without the scope it requires.
    #[error("Missing scope: the grant does not include `{0}`")]
    MissingScope(Scope),

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// The token is being (or has been) revoked; new fetches are refused.
    #[error("Token revoked")]
    TokenRevoked,

    /// Network/HTTP transport error.
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl OAuthError {
    /// Check if this is an upstream error with the given HTTP status.
    pub fn is_upstream_status(&self, expected: u16) -> bool {
        matches!(self, OAuthError::Upstream { status, .. } if *status == expected)
    }

    /// The provider error code, if this is an upstream error.
    pub fn upstream_code(&self) -> Option<&str> {
        match self {
            OAuthError::Upstream { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Whether the front-end should send the user back through authorization.
    ///
    /// Every failure except a missing scope is recoverable that way; a missing
    /// scope is a terminal denial.
    pub fn requires_reauthorization(&self) -> bool {
        !matches!(self, OAuthError::MissingScope(_))
    }
}

impl From<reqwest::Error> for OAuthError {
    fn from(e: reqwest::Error) -> Self {
        OAuthError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for OAuthError {
    fn from(e: serde_json::Error) -> Self {
        OAuthError::Serialization(e.to_string())
    }
}

/// Error body shapes the provider returns.
///
/// OAuth endpoints answer `{"error", "error_description"}`; REST endpoints
/// answer `{"code", "message"}` with a numeric code.
#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorResponse {
    /// Build an upstream error from a decoded (or absent) error body.
    pub(crate) fn into_error(self, status: u16, endpoint: &str) -> OAuthError {
        let code = self
            .error
            .or_else(|| {
                self.code.map(|c| match c {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
            })
            .unwrap_or_else(|| "unknown".to_string());

        let message = self
            .error_description
            .or(self.message)
            .unwrap_or_else(|| format!("HTTP {}", status));

        OAuthError::Upstream {
            code,
            message,
            status,
            endpoint: endpoint.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oauth_error_body() {
        let body: ErrorResponse =
            serde_json::from_str(r#"{"error":"invalid_grant","error_description":"bad code"}"#)
                .unwrap();
        let err = body.into_error(400, "https://discord.com/api/v10/oauth2/token");
        assert_eq!(err.upstream_code(), Some("invalid_grant"));
        assert!(err.is_upstream_status(400));
        assert!(err.to_string().contains("bad code"));
    }

    #[test]
    fn test_rest_error_body() {
        let body: ErrorResponse =
            serde_json::from_str(r#"{"code":50001,"message":"Missing Access"}"#).unwrap();
        match body.into_error(403, "https://x/users/@me/guilds") {
            OAuthError::Upstream {
                code,
                message,
                status,
                ..
            } => {
                assert_eq!(code, "50001");
                assert_eq!(message, "Missing Access");
                assert_eq!(status, 403);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_body_falls_back() {
        let err = ErrorResponse::default().into_error(502, "https://x");
        assert_eq!(err.upstream_code(), Some("unknown"));
        assert!(err.to_string().contains("HTTP 502"));
    }

    #[test]
    fn test_requires_reauthorization() {
        assert!(OAuthError::InvalidToken("x".into()).requires_reauthorization());
        assert!(OAuthError::Cancelled.requires_reauthorization());
        assert!(!OAuthError::MissingScope(Scope::GuildsJoin).requires_reauthorization());
    }
}
