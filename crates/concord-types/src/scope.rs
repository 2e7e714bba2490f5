//! OAuth2 scopes.
//!
//! Scope parsing is lenient: names Discord does not recognize are dropped
//! rather than rejected, both when configuring a client and when reading the
//! scope string echoed back in a token grant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! scopes {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// An OAuth2 scope recognized by Discord.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Scope {
            $(
                #[serde(rename = $name)]
                $variant,
            )+
        }

        impl Scope {
            /// Every recognized scope.
            pub const ALL: &'static [Scope] = &[$(Scope::$variant),+];

            /// Wire name of the scope.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Scope::$variant => $name,)+
                }
            }
        }

        impl FromStr for Scope {
            type Err = UnknownScope;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Scope::$variant),)+
                    other => Err(UnknownScope(other.to_string())),
                }
            }
        }
    };
}

scopes! {
    ActivitiesRead => "activities.read",
    ActivitiesWrite => "activities.write",
    ApplicationsBuildsRead => "applications.builds.read",
    ApplicationsBuildsUpload => "applications.builds.upload",
    ApplicationsCommands => "applications.commands",
    ApplicationsCommandsUpdate => "applications.commands.update",
    ApplicationsCommandsPermissionsUpdate => "applications.commands.permissions.update",
    ApplicationsEntitlements => "applications.entitlements",
    ApplicationsStoreUpdate => "applications.store.update",
    Bot => "bot",
    Connections => "connections",
    DmChannelsRead => "dm_channels.read",
    Email => "email",
    GdmJoin => "gdm.join",
    Guilds => "guilds",
    GuildsJoin => "guilds.join",
    GuildsMembersRead => "guilds.members.read",
    Identify => "identify",
    MessagesRead => "messages.read",
    RelationshipsRead => "relationships.read",
    RoleConnectionsWrite => "role_connections.write",
    Rpc => "rpc",
    RpcActivitiesWrite => "rpc.activities.write",
    RpcNotificationsRead => "rpc.notifications.read",
    RpcVoiceRead => "rpc.voice.read",
    RpcVoiceWrite => "rpc.voice.write",
    Voice => "voice",
    WebhookIncoming => "webhook.incoming",
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scope name that Discord does not recognize.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown OAuth2 scope '{0}'")]
pub struct UnknownScope(pub String);

/// An ordered, duplicate-free set of scopes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeSet(Vec<Scope>);

impl ScopeSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from names, silently dropping unrecognized entries.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for name in names {
            if let Ok(scope) = name.as_ref().trim().parse::<Scope>() {
                set.insert(scope);
            }
        }
        set
    }

    /// Parse a space-delimited scope string (as echoed in a token grant).
    pub fn parse(scope: &str) -> Self {
        Self::from_names(scope.split_whitespace())
    }

    /// Add a scope, keeping first-insertion order.
    pub fn insert(&mut self, scope: Scope) -> bool {
        if self.0.contains(&scope) {
            false
        } else {
            self.0.push(scope);
            true
        }
    }

    /// Whether the set grants the scope.
    pub fn contains(&self, scope: Scope) -> bool {
        self.0.contains(&scope)
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of scopes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the scopes in order.
    pub fn iter(&self) -> impl Iterator<Item = Scope> + '_ {
        self.0.iter().copied()
    }

    /// The scopes as a slice.
    pub fn as_slice(&self) -> &[Scope] {
        &self.0
    }

    /// Space-joined wire form.
    pub fn to_param(&self) -> String {
        self.0
            .iter()
            .map(Scope::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl FromIterator<Scope> for ScopeSet {
    fn from_iter<T: IntoIterator<Item = Scope>>(iter: T) -> Self {
        let mut set = Self::new();
        for scope in iter {
            set.insert(scope);
        }
        set
    }
}

impl From<ScopeSet> for Vec<Scope> {
    fn from(set: ScopeSet) -> Self {
        set.0
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_param())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_names_drops_unknown() {
        let set = ScopeSet::from_names(["identify", "guilds", "made_up_scope"]);
        assert_eq!(set.as_slice(), &[Scope::Identify, Scope::Guilds]);
    }

    #[test]
    fn test_parse_grant_scope_string() {
        let set = ScopeSet::parse("identify  guilds.join email");
        assert!(set.contains(Scope::GuildsJoin));
        assert!(set.contains(Scope::Email));
        assert!(!set.contains(Scope::Guilds));
        assert_eq!(set.to_param(), "identify guilds.join email");
    }

    #[test]
    fn test_duplicates_collapse() {
        let set = ScopeSet::from_names(["guilds", "identify", "guilds"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_param(), "guilds identify");
    }

    #[test]
    fn test_scope_round_trips_through_str() {
        for scope in Scope::ALL {
            assert_eq!(scope.as_str().parse::<Scope>().unwrap(), *scope);
        }
        assert!("nope".parse::<Scope>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&Scope::GuildsMembersRead).unwrap();
        assert_eq!(json, r#""guilds.members.read""#);
    }
}
