//! Discord OAuth2 token exchange and resource fetches.
//!
//! [`OAuthClient`] holds only static configuration (client credentials, API
//! base, timeout). Every call carries the rest of what it needs, so a failed
//! call is retried by calling again.

use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use concord_types::{ApiConnection, ApiGuild, ApiGuildMember, ApiUser, Scope, ScopeSet};
use rand::RngCore;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{ErrorResponse, OAuthError, Result};
use crate::grant::Grant;

/// Default API root (without version segment).
pub const DEFAULT_API_BASE: &str = "https://discord.com/api";

/// Latest supported API version.
pub const DEFAULT_API_VERSION: &str = "10";

/// Default timeout for upstream requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Configuration
// ============================================================================

/// Static OAuth client configuration.
#[derive(Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub api_base: String,
    pub api_version: String,
    /// Bot token used to authorize guild joins. Falls back to the grant's own
    /// authorization when unset.
    pub bot_token: Option<String>,
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("api_base", &self.api_base)
            .field("api_version", &self.api_version)
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl OAuthConfig {
    /// Create a config for the given application credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            bot_token: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }

    /// Point at a different API root (e.g. a mock server).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Select the API version path segment.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Set the bot token for guild joins.
    pub fn with_bot_token(mut self, token: impl Into<String>) -> Self {
        self.bot_token = Some(token.into());
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Versioned API root, e.g. `https://discord.com/api/v10`.
    pub fn base_url(&self) -> String {
        let version = self.api_version.trim_start_matches('v');
        format!("{}/v{}", self.api_base.trim_end_matches('/'), version)
    }
}

/// Parameters for an authorization URL.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationRequest {
    pub scopes: ScopeSet,
    pub redirect_uri: Option<String>,
    /// Opaque CSRF state echoed back on the redirect.
    pub state: Option<String>,
    /// `consent` forces the prompt; `none` skips it for returning users.
    pub prompt: Option<String>,
}

impl AuthorizationRequest {
    /// Create a request for the given scopes and redirect URI.
    pub fn new(scopes: ScopeSet, redirect_uri: Option<String>) -> Self {
        Self {
            scopes,
            redirect_uri,
            state: None,
            prompt: None,
        }
    }

    /// Attach a CSRF state value.
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Set the prompt behaviour.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

/// Generate a random CSRF state value for the authorization URL.
pub fn generate_state() -> String {
    let mut state_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut state_bytes);
    URL_SAFE_NO_PAD.encode(state_bytes)
}

// ============================================================================
// Client
// ============================================================================

/// Stateless client for Discord's OAuth2 and user resource endpoints.
#[derive(Debug)]
pub struct OAuthClient {
    http: reqwest::Client,
    config: OAuthConfig,
    base_url: String,
}

impl OAuthClient {
    /// Create a client. Client ID and secret are mandatory.
    pub fn new(config: OAuthConfig) -> Result<Self> {
        if config.client_id.trim().is_empty() {
            return Err(OAuthError::Config("client_id is required".to_string()));
        }
        if config.client_secret.is_empty() {
            return Err(OAuthError::Config("client_secret is required".to_string()));
        }

        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| format!("concord-oauth/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(config.timeout)
            .build()?;

        let base_url = config.base_url();
        Ok(Self {
            http,
            config,
            base_url,
        })
    }

    /// The static configuration.
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Full URL for an API path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Protocol operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Build the URL the user visits to authorize the application.
    pub fn build_authorization_url(&self, request: &AuthorizationRequest) -> Result<String> {
        let redirect_uri = request
            .redirect_uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
            .ok_or_else(|| OAuthError::Config("Missing redirect_uri".to_string()))?;

        let scope = request.scopes.to_param();
        let mut params = vec![
            ("client_id", self.config.client_id.as_str()),
            ("scope", scope.as_str()),
            ("response_type", "code"),
            ("redirect_uri", redirect_uri),
        ];
        if let Some(state) = &request.state {
            params.push(("state", state));
        }
        if let Some(prompt) = &request.prompt {
            params.push(("prompt", prompt));
        }

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        Ok(format!("{}?{}", self.endpoint("oauth2/authorize"), query))
    }

    /// Exchange an authorization code for a grant.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
        scopes: &ScopeSet,
    ) -> Result<Grant> {
        validate_code(code)?;

        let scope = scopes.to_param();
        let mut form = vec![
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
        ];
        if let Some(uri) = redirect_uri {
            form.push(("redirect_uri", uri));
        }
        if !scopes.is_empty() {
            form.push(("scope", scope.as_str()));
        }

        let endpoint = self.endpoint("oauth2/token");
        debug!(endpoint = %endpoint, "Exchanging authorization code");

        let mut grant: Grant = self.post_form(&endpoint, &form).await?;
        grant.obtained_at = Some(Utc::now());

        info!(scope = %grant.scope, expires_in = grant.expires_in, "Token exchange succeeded");
        Ok(grant)
    }

    /// Refresh a grant using its refresh token.
    pub async fn refresh(&self, grant: &Grant) -> Result<Grant> {
        if !grant.has_refresh_token() {
            return Err(OAuthError::InvalidRequest(
                "grant has no refresh token".to_string(),
            ));
        }

        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", grant.refresh_token.as_str()),
        ];

        let endpoint = self.endpoint("oauth2/token");
        debug!(endpoint = %endpoint, "Refreshing access token");

        let mut refreshed: Grant = self.post_form(&endpoint, &form).await?;
        refreshed.obtained_at = Some(Utc::now());
        if refreshed.refresh_token.is_empty() {
            refreshed.refresh_token = grant.refresh_token.clone();
        }

        info!(expires_in = refreshed.expires_in, "Token refreshed successfully");
        Ok(refreshed)
    }

    /// Revoke a grant's access token.
    pub async fn revoke(&self, grant: &Grant) -> Result<()> {
        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("token", grant.access_token.as_str()),
            ("token_type_hint", "access_token"),
        ];

        let endpoint = self.endpoint("oauth2/token/revoke");
        debug!(endpoint = %endpoint, "Revoking access token");

        let response = self.http.post(&endpoint).form(&form).send().await?;
        if !response.status().is_success() {
            return Err(extract_error(response, &endpoint).await);
        }

        info!("Token revoked");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resource fetches
    // ─────────────────────────────────────────────────────────────────────────

    /// `GET /users/@me`.
    pub async fn fetch_current_user(&self, grant: &Grant) -> Result<ApiUser> {
        self.get_json("users/@me", grant).await
    }

    /// `GET /users/@me/guilds`.
    pub async fn fetch_guilds(&self, grant: &Grant) -> Result<Vec<ApiGuild>> {
        self.get_json("users/@me/guilds", grant).await
    }

    /// `GET /users/@me/connections`.
    pub async fn fetch_connections(&self, grant: &Grant) -> Result<Vec<ApiConnection>> {
        self.get_json("users/@me/connections", grant).await
    }

    /// Add the grant's user to a guild.
    ///
    /// Returns `None` when the user was already a member (HTTP 204). Checks the
    /// `guilds.join` scope locally and makes no call when it is missing.
    pub async fn add_guild_member(
        &self,
        grant: &Grant,
        guild_id: &str,
        user_id: &str,
    ) -> Result<Option<ApiGuildMember>> {
        if !grant.scopes().contains(Scope::GuildsJoin) {
            return Err(OAuthError::MissingScope(Scope::GuildsJoin));
        }
        validate_snowflake("guild_id", guild_id)?;
        validate_snowflake("user_id", user_id)?;

        let endpoint = self.endpoint(&format!("guilds/{}/members/{}", guild_id, user_id));
        let authorization = match &self.config.bot_token {
            Some(bot) => format!("Bot {}", bot),
            None => grant.authorization(),
        };
        debug!(endpoint = %endpoint, "Adding user to guild");

        let response = self
            .http
            .put(&endpoint)
            .header(AUTHORIZATION, header_value(&authorization)?)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(&serde_json::json!({ "access_token": grant.access_token }))
            .send()
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT => {
                debug!(guild_id = %guild_id, "User already a member");
                Ok(None)
            }
            status if status.is_success() => {
                info!(guild_id = %guild_id, "User added to guild");
                decode(response).await.map(Some)
            }
            _ => Err(extract_error(response, &endpoint).await),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal HTTP methods
    // ─────────────────────────────────────────────────────────────────────────

    async fn post_form<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        form: &[(&str, &str)],
    ) -> Result<T> {
        let response = self.http.post(endpoint).form(form).send().await?;
        handle_response(response, endpoint).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, grant: &Grant) -> Result<T> {
        let endpoint = self.endpoint(path);
        debug!(endpoint = %endpoint, "Fetching resource");

        let response = self
            .http
            .get(&endpoint)
            .header(AUTHORIZATION, header_value(&grant.authorization())?)
            .send()
            .await?;
        handle_response(response, &endpoint).await
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Reject codes that cannot be valid before making a network call.
fn validate_code(code: &str) -> Result<()> {
    if code.is_empty() {
        return Err(OAuthError::InvalidRequest(
            "Invalid authorization code: empty".to_string(),
        ));
    }
    if code.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(OAuthError::InvalidRequest(
            "Invalid authorization code: contains whitespace or control characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_snowflake(field: &str, value: &str) -> Result<()> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(OAuthError::InvalidRequest(format!(
            "{} must be a numeric snowflake, got '{}'",
            field, value
        )));
    }
    Ok(())
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| OAuthError::InvalidToken("credential is not a valid header value".to_string()))
}

async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
    endpoint: &str,
) -> Result<T> {
    if response.status().is_success() {
        decode(response).await
    } else {
        Err(extract_error(response, endpoint).await)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(OAuthError::from)
}

/// Turn a non-2xx response into an upstream error.
async fn extract_error(response: reqwest::Response, endpoint: &str) -> OAuthError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<ErrorResponse>(&body).unwrap_or_default();
    let err = parsed.into_error(status, endpoint);
    debug!(status = status, endpoint = %endpoint, error = %err, "Upstream request failed");
    err
}
