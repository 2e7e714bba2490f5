//! User manager.

use std::sync::Arc;

use concord_oauth::{OAuthError, OpaqueToken, Result};

use crate::client::ConcordClient;
use crate::managers::{cache_or_fetch, peek};
use crate::views::User;

/// Resolves the identity behind a token.
pub struct UserManager {
    client: ConcordClient,
}

impl UserManager {
    pub(crate) fn new(client: ConcordClient) -> Self {
        Self { client }
    }

    /// Get the user for `token`, from the cache when `use_cache` is set.
    ///
    /// Repeated cached gets return the same `Arc`.
    pub async fn get(&self, token: &OpaqueToken, use_cache: bool) -> Result<Arc<User>> {
        let oauth = Arc::clone(self.client.oauth());
        cache_or_fetch(&self.client, token, use_cache, move |grant| async move {
            let api = oauth.fetch_current_user(&grant).await?;
            Ok::<_, OAuthError>(Arc::new(User::new(api, grant, oauth)))
        })
        .await
    }

    /// The cached user, if any. Never calls upstream.
    pub async fn cached(&self, token: &OpaqueToken) -> Option<Arc<User>> {
        peek(&self.client, token).await
    }
}
