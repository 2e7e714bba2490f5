//! Main client implementation.

use std::sync::Arc;
use std::time::Duration;

use concord_cache::{CacheStats, TokenCache};
use concord_config::ClientConfig;
use concord_oauth::{
    AuthorizationRequest, Grant, OAuthClient, OAuthConfig, OAuthError, OpaqueToken, Result,
    TokenCodec, with_cancellation,
};
use concord_types::{Scope, ScopeSet};
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::managers::{Cached, ConnectionManager, GuildManager, UserManager};
use crate::prefetch::Prefetch;
use crate::views::{Connection, Guild, User};

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Discord OAuth2 broker client.
///
/// Owns the token codec, the exchange client, and the one shared resource
/// cache. Cloning is cheap and clones share all state.
///
/// # Example
///
/// ```no_run
/// use concord_client::ConcordClient;
///
/// # async fn example() -> concord_client::Result<()> {
/// let client = ConcordClient::builder()
///     .client_id("123456789012345678")
///     .client_secret("app-secret")
///     .signing_secret("server-signing-key")
///     .redirect_uri("https://example.com/callback")
///     .scopes(["identify", "guilds"])
///     .build()?;
///
/// println!("Visit {}", client.build_authorization_url()?);
///
/// let token = client.exchange_code("code-from-redirect").await?;
/// let user = client.get_user(&token, true).await?;
/// println!("Hello, {}", user.tag());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConcordClient {
    /// Inner shared state.
    inner: Arc<ClientInner>,
    /// Raced against every upstream call made through this handle.
    cancel: Option<CancellationToken>,
}

/// Inner client state (shared across clones).
pub(crate) struct ClientInner {
    pub(crate) oauth: Arc<OAuthClient>,
    pub(crate) codec: TokenCodec,
    pub(crate) cache: TokenCache<Cached>,
    scopes: RwLock<ScopeSet>,
    redirect_uri: RwLock<Option<String>>,
}

impl std::fmt::Debug for ConcordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcordClient")
            .field("oauth", &self.inner.oauth)
            .field("scopes", &*self.inner.scopes.read())
            .field("redirect_uri", &*self.inner.redirect_uri.read())
            .field("cancellable", &self.cancel.is_some())
            .finish_non_exhaustive()
    }
}

impl ConcordClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Build a client from a loaded configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut builder = ClientBuilder::new().scopes(config.scopes.iter().map(String::as_str));

        if let Some(v) = &config.client_id {
            builder = builder.client_id(v);
        }
        if let Some(v) = &config.client_secret {
            builder = builder.client_secret(v);
        }
        if let Some(v) = &config.signing_secret {
            builder = builder.signing_secret(v);
        }
        if let Some(v) = &config.bot_token {
            builder = builder.bot_token(v);
        }
        if let Some(v) = &config.redirect_uri {
            builder = builder.redirect_uri(v);
        }
        if let Some(v) = &config.api_base {
            builder = builder.api_base(v);
        }
        if let Some(v) = &config.api_version {
            builder = builder.api_version(v);
        }
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(v) = &config.user_agent {
            builder = builder.user_agent(v);
        }

        builder.build()
    }

    /// A handle whose upstream calls are all raced against `cancel`.
    ///
    /// The returned client shares the cache and settings with `self`.
    pub fn with_cancellation(&self, cancel: CancellationToken) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cancel: Some(cancel),
        }
    }

    /// The cancellation token attached to this handle, if any.
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Settings
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the requested scopes. Unknown names are dropped silently.
    ///
    /// Returns the scopes that were kept.
    pub fn set_scopes<I, S>(&self, names: I) -> Vec<Scope>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let scopes = ScopeSet::from_names(names);
        let kept = scopes.as_slice().to_vec();
        *self.inner.scopes.write() = scopes;
        debug!(scopes = ?kept, "Scopes updated");
        kept
    }

    /// The currently requested scopes.
    pub fn scopes(&self) -> ScopeSet {
        self.inner.scopes.read().clone()
    }

    /// Set the redirect URI. Stored as-is; checked when building a URL.
    pub fn set_redirect_uri(&self, uri: impl Into<String>) {
        *self.inner.redirect_uri.write() = Some(uri.into());
    }

    /// The configured redirect URI.
    pub fn redirect_uri(&self) -> Option<String> {
        self.inner.redirect_uri.read().clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Token lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Build the authorization URL for the current scopes and redirect URI.
    pub fn build_authorization_url(&self) -> Result<String> {
        self.inner
            .oauth
            .build_authorization_url(&self.authorization_request())
    }

    /// Build the authorization URL with a CSRF `state` value.
    pub fn build_authorization_url_with_state(&self, state: &str) -> Result<String> {
        self.inner
            .oauth
            .build_authorization_url(&self.authorization_request().with_state(state))
    }

    /// The authorization request for the current settings.
    pub fn authorization_request(&self) -> AuthorizationRequest {
        AuthorizationRequest::new(self.scopes(), self.redirect_uri())
    }

    /// Exchange an authorization code and sign the resulting grant.
    ///
    /// Nothing is fetched or cached here; use [`prefetch`](Self::prefetch) to
    /// warm the cache.
    pub async fn exchange_code(&self, code: &str) -> Result<OpaqueToken> {
        let redirect_uri = self.redirect_uri();
        let scopes = self.scopes();
        let grant = self
            .race(
                self.inner
                    .oauth
                    .exchange_code(code, redirect_uri.as_deref(), &scopes),
            )
            .await?;

        let token = self.inner.codec.sign(&grant)?;
        info!(token = %token.fingerprint(), "Issued token");
        Ok(token)
    }

    /// Refresh a token's grant and issue a new token.
    ///
    /// The old token's cached resources are dropped on success.
    pub async fn refresh(&self, token: &OpaqueToken) -> Result<OpaqueToken> {
        let grant = self.verify(token.as_str())?;
        let refreshed = self.race(self.inner.oauth.refresh(&grant)).await?;
        let new_token = self.inner.codec.sign(&refreshed)?;

        self.inner.cache.evict(token).await;
        info!(
            old = %token.fingerprint(),
            new = %new_token.fingerprint(),
            "Token refreshed, old cache slot retired"
        );
        Ok(new_token)
    }

    /// Revoke a token upstream and drop its cached resources.
    ///
    /// The slot is fenced for the duration of the call so no fetch can start
    /// or land. If the upstream call fails the fence is lifted and the cache
    /// is left as it was.
    pub async fn revoke(&self, token: &OpaqueToken) -> Result<()> {
        let grant = self.verify(token.as_str())?;
        self.inner.cache.fence(token).await;

        match self.race(self.inner.oauth.revoke(&grant)).await {
            Ok(()) => {
                self.inner.cache.evict(token).await;
                info!(token = %token.fingerprint(), "Token revoked");
                Ok(())
            }
            Err(e) => {
                self.inner.cache.unfence(token).await;
                warn!(token = %token.fingerprint(), error = %e, "Revocation failed, cache preserved");
                Err(e)
            }
        }
    }

    /// Verify a token and return the grant it carries.
    pub fn verify(&self, token: &str) -> Result<Grant> {
        self.inner.codec.verify(token)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resources
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the user manager.
    pub fn users(&self) -> UserManager {
        UserManager::new(self.clone())
    }

    /// Access the guild manager.
    pub fn guilds(&self) -> GuildManager {
        GuildManager::new(self.clone())
    }

    /// Access the connection manager.
    pub fn connections(&self) -> ConnectionManager {
        ConnectionManager::new(self.clone())
    }

    /// Shortcut for `users().get(token, use_cache)`.
    pub async fn get_user(&self, token: &OpaqueToken, use_cache: bool) -> Result<Arc<User>> {
        self.users().get(token, use_cache).await
    }

    /// Shortcut for `guilds().get(token, use_cache)`.
    pub async fn get_guilds(&self, token: &OpaqueToken, use_cache: bool) -> Result<Arc<[Guild]>> {
        self.guilds().get(token, use_cache).await
    }

    /// Shortcut for `connections().get(token, use_cache)`.
    pub async fn get_connections(
        &self,
        token: &OpaqueToken,
        use_cache: bool,
    ) -> Result<Arc<[Connection]>> {
        self.connections().get(token, use_cache).await
    }

    /// Fetch every resource the token's scopes allow, concurrently.
    ///
    /// Fails only if the token itself is invalid; per-resource failures are
    /// reported in the returned [`Prefetch`].
    pub async fn prefetch(&self, token: &OpaqueToken) -> Result<Prefetch> {
        let grant = self.verify(token.as_str())?;
        Ok(Prefetch::run(self, token, &grant.scopes()).await)
    }

    /// Get cache statistics.
    pub async fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats().await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn oauth(&self) -> &Arc<OAuthClient> {
        &self.inner.oauth
    }

    pub(crate) fn cache(&self) -> &TokenCache<Cached> {
        &self.inner.cache
    }

    /// Run an upstream call, honouring this handle's cancellation token.
    pub(crate) async fn race<F, T>(&self, fut: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        with_cancellation(self.cancel.as_ref(), fut).await
    }
}

/// Builder for creating a ConcordClient.
#[derive(Default)]
pub struct ClientBuilder {
    client_id: Option<String>,
    client_secret: Option<String>,
    signing_secret: Option<String>,
    bot_token: Option<String>,
    redirect_uri: Option<String>,
    scopes: ScopeSet,
    api_base: Option<String>,
    api_version: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("api_base", &self.api_base)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application (client) ID.
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// Set the application secret.
    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Set the key used to sign opaque tokens.
    pub fn signing_secret(mut self, secret: impl Into<String>) -> Self {
        self.signing_secret = Some(secret.into());
        self
    }

    /// Set the bot token used for guild joins.
    pub fn bot_token(mut self, token: impl Into<String>) -> Self {
        self.bot_token = Some(token.into());
        self
    }

    /// Set the redirect URI.
    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Set the requested scopes. Unknown names are dropped.
    pub fn scopes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.scopes = ScopeSet::from_names(names);
        self
    }

    /// Set the API root (without version).
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    /// Set the API version.
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ConcordClient> {
        let client_id = required(self.client_id, "client_id")?;
        let client_secret = required(self.client_secret, "client_secret")?;
        let signing_secret = required(self.signing_secret, "signing_secret")?;

        let mut config = OAuthConfig::new(client_id, client_secret)
            .with_timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT));
        if let Some(base) = self.api_base {
            config = config.with_api_base(base);
        }
        if let Some(version) = self.api_version {
            config = config.with_api_version(version);
        }
        if let Some(token) = self.bot_token {
            config = config.with_bot_token(token);
        }
        if let Some(agent) = self.user_agent {
            config = config.with_user_agent(agent);
        }

        let oauth = OAuthClient::new(config)?;
        let codec = TokenCodec::new(signing_secret)?;

        Ok(ConcordClient {
            inner: Arc::new(ClientInner {
                oauth: Arc::new(oauth),
                codec,
                cache: TokenCache::new(),
                scopes: RwLock::new(self.scopes),
                redirect_uri: RwLock::new(self.redirect_uri),
            }),
            cancel: None,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| OAuthError::Config(format!("{} is required", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> ClientBuilder {
        ClientBuilder::new()
            .client_id("1234")
            .client_secret("app-secret")
            .signing_secret("signing-secret")
    }

    #[test]
    fn test_builder_requires_credentials() {
        for missing in ["client_id", "client_secret", "signing_secret"] {
            let mut b = builder();
            match missing {
                "client_id" => b.client_id = None,
                "client_secret" => b.client_secret = None,
                _ => b.signing_secret = None,
            }
            match b.build() {
                Err(OAuthError::Config(msg)) => assert!(msg.contains(missing)),
                other => panic!("expected config error for {missing}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_set_scopes_drops_unknown() {
        let client = builder().build().unwrap();
        let kept = client.set_scopes(["identify", "guilds", "made_up_scope"]);
        assert_eq!(kept, vec![Scope::Identify, Scope::Guilds]);
        assert_eq!(client.scopes().as_slice(), &[Scope::Identify, Scope::Guilds]);
    }

    #[test]
    fn test_authorization_url_uses_settings() {
        let client = builder().scopes(["identify"]).build().unwrap();
        assert!(matches!(
            client.build_authorization_url(),
            Err(OAuthError::Config(_))
        ));

        client.set_redirect_uri("https://example.com/cb");
        let url = client.build_authorization_url_with_state("abc").unwrap();
        assert!(url.contains("scope=identify"));
        assert!(url.contains("state=abc"));
        assert_eq!(client.redirect_uri().as_deref(), Some("https://example.com/cb"));
    }

    #[test]
    fn test_redirect_uri_stored_as_is() {
        let client = builder().scopes(["identify"]).build().unwrap();
        client.set_redirect_uri("/oauth/callback");

        let url = client.build_authorization_url().unwrap();
        assert!(url.contains("redirect_uri=%2Foauth%2Fcallback"));
        assert_eq!(client.redirect_uri().as_deref(), Some("/oauth/callback"));
    }

    #[test]
    fn test_from_config() {
        let config = ClientConfig {
            client_id: Some("1234".to_string()),
            client_secret: Some("app-secret".to_string()),
            signing_secret: Some("signing-secret".to_string()),
            scopes: vec!["email".to_string(), "bogus".to_string()],
            api_version: Some("9".to_string()),
            ..Default::default()
        };
        let client = ConcordClient::from_config(&config).unwrap();
        assert_eq!(client.scopes().as_slice(), &[Scope::Email]);

        let missing = ClientConfig {
            signing_secret: None,
            ..config
        };
        assert!(ConcordClient::from_config(&missing).is_err());
    }

    #[test]
    fn test_cancellation_handle_shares_state() {
        let client = builder().build().unwrap();
        let cancel = CancellationToken::new();
        let handle = client.with_cancellation(cancel);

        assert!(client.cancellation().is_none());
        assert!(handle.cancellation().is_some());
        handle.set_scopes(["guilds"]);
        assert_eq!(client.scopes().as_slice(), &[Scope::Guilds]);
    }

    #[test]
    fn test_verify_rejects_foreign_token() {
        let client = builder().build().unwrap();
        assert!(matches!(
            client.verify("not.a-token"),
            Err(OAuthError::InvalidToken(_))
        ));
    }
}
