//! Connection view.

use concord_types::{ApiConnection, ConnectionVisibility};
use serde::Serialize;

/// A third-party account linked to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connection {
    pub id: String,
    pub name: String,
    /// Service type, e.g. `"github"`.
    pub kind: String,
    pub revoked: bool,
    pub verified: bool,
    pub friend_sync: bool,
    pub show_activity: bool,
    pub two_way_link: bool,
    pub visibility: ConnectionVisibility,
}

impl Connection {
    /// Whether the connection is shown on the user's public profile.
    pub fn is_public(&self) -> bool {
        self.visibility == ConnectionVisibility::Everyone
    }
}

impl From<ApiConnection> for Connection {
    fn from(api: ApiConnection) -> Self {
        Self {
            id: api.id,
            name: api.name,
            kind: api.kind,
            revoked: api.revoked,
            verified: api.verified,
            friend_sync: api.friend_sync,
            show_activity: api.show_activity,
            two_way_link: api.two_way_link,
            visibility: api.visibility,
        }
    }
}
