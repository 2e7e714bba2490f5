//! Cache-or-fetch managers, one per resource kind.
//!
//! Every manager runs the same steps: verify the token, serve from the cache
//! if allowed, otherwise open a fetch ticket, call upstream, and store the
//! result under the ticket. Errors propagate unchanged and nothing is retried.

mod connections;
mod guilds;
mod users;

use std::future::Future;
use std::sync::Arc;

use concord_cache::{Error as CacheError, ResourceKind};
use concord_oauth::{Grant, OAuthError, OpaqueToken, Result};
use tracing::debug;

use crate::client::ConcordClient;
use crate::views::{Connection, Guild, User};

pub use connections::ConnectionManager;
pub use guilds::GuildManager;
pub use users::UserManager;

/// A cached view, tagged by kind.
#[derive(Clone)]
pub(crate) enum Cached {
    User(Arc<User>),
    Guilds(Arc<[Guild]>),
    Connections(Arc<[Connection]>),
}

/// A value a manager can cache.
pub(crate) trait Resource: Clone + Sized {
    const KIND: ResourceKind;

    fn into_cached(self) -> Cached;

    fn from_cached(cached: Cached) -> Option<Self>;
}

impl Resource for Arc<User> {
    const KIND: ResourceKind = ResourceKind::User;

    fn into_cached(self) -> Cached {
        Cached::User(self)
    }

    fn from_cached(cached: Cached) -> Option<Self> {
        match cached {
            Cached::User(user) => Some(user),
            _ => None,
        }
    }
}

impl Resource for Arc<[Guild]> {
    const KIND: ResourceKind = ResourceKind::Guilds;

    fn into_cached(self) -> Cached {
        Cached::Guilds(self)
    }

    fn from_cached(cached: Cached) -> Option<Self> {
        match cached {
            Cached::Guilds(guilds) => Some(guilds),
            _ => None,
        }
    }
}

impl Resource for Arc<[Connection]> {
    const KIND: ResourceKind = ResourceKind::Connections;

    fn into_cached(self) -> Cached {
        Cached::Connections(self)
    }

    fn from_cached(cached: Cached) -> Option<Self> {
        match cached {
            Cached::Connections(connections) => Some(connections),
            _ => None,
        }
    }
}

/// Read a cached value without touching upstream.
pub(crate) async fn peek<R: Resource>(client: &ConcordClient, token: &OpaqueToken) -> Option<R> {
    client
        .cache()
        .get(token, R::KIND)
        .await
        .and_then(R::from_cached)
}

/// Serve `(token, R::KIND)` from the cache or fetch it with `fetch`.
pub(crate) async fn cache_or_fetch<R, F, Fut>(
    client: &ConcordClient,
    token: &OpaqueToken,
    use_cache: bool,
    fetch: F,
) -> Result<R>
where
    R: Resource,
    F: FnOnce(Grant) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let grant = client.verify(token.as_str())?;

    if use_cache {
        if let Some(hit) = peek::<R>(client, token).await {
            debug!(token = %token.fingerprint(), kind = %R::KIND, "Cache hit");
            return Ok(hit);
        }
        debug!(token = %token.fingerprint(), kind = %R::KIND, "Cache miss");
    }

    let ticket = client
        .cache()
        .begin_fetch(token, R::KIND)
        .await
        .map_err(|_| OAuthError::TokenRevoked)?;

    let value = match client.race(fetch(grant)).await {
        Ok(value) => value,
        Err(e) => {
            client.cache().abandon(ticket).await;
            return Err(e);
        }
    };

    match client.cache().store(ticket, value.clone().into_cached()).await {
        Ok(()) => Ok(value),
        // Slot retired mid-flight (refresh); the value is still good for this caller.
        Err(CacheError::StaleTicket(_)) => Ok(value),
        Err(CacheError::Fenced(_)) => Err(OAuthError::TokenRevoked),
    }
}
