//! Guild manager.

use std::sync::Arc;

use concord_oauth::{OAuthError, OpaqueToken, Result};

use crate::client::ConcordClient;
use crate::managers::{cache_or_fetch, peek};
use crate::views::Guild;

/// Resolves the guilds a token's user belongs to.
pub struct GuildManager {
    client: ConcordClient,
}

impl GuildManager {
    pub(crate) fn new(client: ConcordClient) -> Self {
        Self { client }
    }

    /// Get the user's guilds, from the cache when `use_cache` is set.
    pub async fn get(&self, token: &OpaqueToken, use_cache: bool) -> Result<Arc<[Guild]>> {
        let oauth = Arc::clone(self.client.oauth());
        cache_or_fetch(&self.client, token, use_cache, move |grant| async move {
            let guilds = oauth.fetch_guilds(&grant).await?;
            Ok::<_, OAuthError>(guilds.into_iter().map(Guild::from).collect())
        })
        .await
    }

    /// The cached guild list, if any.
    pub async fn cached(&self, token: &OpaqueToken) -> Option<Arc<[Guild]>> {
        peek(&self.client, token).await
    }
}
