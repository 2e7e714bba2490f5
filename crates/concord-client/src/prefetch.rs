//! Warming the cache for a freshly issued token.

use std::sync::Arc;

use concord_cache::ResourceKind;
use concord_oauth::{OAuthError, OpaqueToken, Result};
use concord_types::{Scope, ScopeSet};
use tracing::{debug, warn};

use crate::client::ConcordClient;
use crate::views::{Connection, Guild, User};

/// Per-resource outcome of [`ConcordClient::prefetch`].
///
/// A field is `None` when the grant's scopes do not cover that resource, so
/// it was never requested.
#[derive(Debug)]
pub struct Prefetch {
    pub user: Option<Result<Arc<User>>>,
    pub guilds: Option<Result<Arc<[Guild]>>>,
    pub connections: Option<Result<Arc<[Connection]>>>,
}

impl Prefetch {
    pub(crate) async fn run(client: &ConcordClient, token: &OpaqueToken, scopes: &ScopeSet) -> Self {
        let wants_user = scopes.contains(Scope::Identify) || scopes.contains(Scope::Email);
        let wants_guilds = scopes.contains(Scope::Guilds);
        let wants_connections = scopes.contains(Scope::Connections);

        let (user, guilds, connections) = tokio::join!(
            async {
                if wants_user {
                    Some(client.get_user(token, true).await)
                } else {
                    None
                }
            },
            async {
                if wants_guilds {
                    Some(client.get_guilds(token, true).await)
                } else {
                    None
                }
            },
            async {
                if wants_connections {
                    Some(client.get_connections(token, true).await)
                } else {
                    None
                }
            },
        );

        let prefetch = Self {
            user,
            guilds,
            connections,
        };
        for (kind, err) in prefetch.errors() {
            warn!(token = %token.fingerprint(), kind = %kind, error = %err, "Prefetch failed");
        }
        debug!(
            token = %token.fingerprint(),
            fetched = prefetch.fetched().len(),
            "Prefetch complete"
        );
        prefetch
    }

    /// Kinds that were requested and fetched successfully.
    pub fn fetched(&self) -> Vec<ResourceKind> {
        self.outcomes()
            .filter_map(|(kind, ok)| (ok == Some(true)).then_some(kind))
            .collect()
    }

    /// Kinds that were requested and failed, with their errors.
    pub fn errors(&self) -> Vec<(ResourceKind, &OAuthError)> {
        let mut errors = Vec::new();
        if let Some(Err(e)) = &self.user {
            errors.push((ResourceKind::User, e));
        }
        if let Some(Err(e)) = &self.guilds {
            errors.push((ResourceKind::Guilds, e));
        }
        if let Some(Err(e)) = &self.connections {
            errors.push((ResourceKind::Connections, e));
        }
        errors
    }

    /// Whether every requested resource was fetched.
    pub fn is_complete(&self) -> bool {
        self.errors().is_empty()
    }

    fn outcomes(&self) -> impl Iterator<Item = (ResourceKind, Option<bool>)> {
        [
            (ResourceKind::User, self.user.as_ref().map(|r| r.is_ok())),
            (ResourceKind::Guilds, self.guilds.as_ref().map(|r| r.is_ok())),
            (
                ResourceKind::Connections,
                self.connections.as_ref().map(|r| r.is_ok()),
            ),
        ]
        .into_iter()
    }
}
