//! Connection manager.

use std::sync::Arc;

use concord_oauth::{OAuthError, OpaqueToken, Result};

use crate::client::ConcordClient;
use crate::managers::{cache_or_fetch, peek};
use crate::views::Connection;

/// Resolves the third-party accounts linked to a token's user.
pub struct ConnectionManager {
    client: ConcordClient,
}

impl ConnectionManager {
    pub(crate) fn new(client: ConcordClient) -> Self {
        Self { client }
    }

    /// Get the user's connections, from the cache when `use_cache` is set.
    pub async fn get(&self, token: &OpaqueToken, use_cache: bool) -> Result<Arc<[Connection]>> {
        let oauth = Arc::clone(self.client.oauth());
        cache_or_fetch(&self.client, token, use_cache, move |grant| async move {
            let connections = oauth.fetch_connections(&grant).await?;
            Ok::<_, OAuthError>(connections.into_iter().map(Connection::from).collect())
        })
        .await
    }

    /// The cached connection list, if any.
    pub async fn cached(&self, token: &OpaqueToken) -> Option<Arc<[Connection]>> {
        peek(&self.client, token).await
    }
}
