//! Upstream JSON shapes.
//!
//! Only the fields the broker reads are modelled; unknown fields are ignored
//! so additive upstream changes never break decoding.

use serde::{Deserialize, Deserializer, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

/// The user object returned by `GET /users/@me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiUser {
    /// Snowflake ID.
    pub id: String,
    /// Username.
    pub username: String,
    /// Legacy discriminator ("0" for migrated usernames).
    #[serde(default = "default_discriminator")]
    pub discriminator: String,
    /// Display name, if set.
    #[serde(default)]
    pub global_name: Option<String>,
    /// Avatar hash.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Banner hash.
    #[serde(default)]
    pub banner: Option<String>,
    /// Banner color as a hex string.
    #[serde(default)]
    pub banner_color: Option<String>,
    /// Accent color as an integer.
    #[serde(default)]
    pub accent_color: Option<u32>,
    /// Avatar decoration asset hash.
    #[serde(default)]
    pub avatar_decoration: Option<String>,
    /// Whether the account is a bot.
    #[serde(default)]
    pub bot: bool,
    /// Chosen locale.
    #[serde(default)]
    pub locale: Option<String>,
    /// Whether two-factor auth is enabled.
    #[serde(default)]
    pub mfa_enabled: bool,
    /// Nitro tier.
    #[serde(default)]
    pub premium_type: Option<u8>,
    /// Email address (requires the `email` scope).
    #[serde(default)]
    pub email: Option<String>,
    /// Whether the email is verified.
    #[serde(default)]
    pub verified: Option<bool>,
    /// Public flag mask.
    #[serde(default)]
    pub public_flags: u64,
}

fn default_discriminator() -> String {
    "0".to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// Guilds
// ─────────────────────────────────────────────────────────────────────────────

/// A partial guild as returned by `GET /users/@me/guilds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiGuild {
    /// Snowflake ID.
    pub id: String,
    /// Guild name.
    pub name: String,
    /// Icon hash.
    #[serde(default)]
    pub icon: Option<String>,
    /// Whether the user owns the guild.
    #[serde(default)]
    pub owner: bool,
    /// The user's permission mask in this guild.
    #[serde(default, deserialize_with = "deserialize_permissions")]
    pub permissions: u64,
    /// Enabled guild features.
    #[serde(default)]
    pub features: Vec<String>,
    /// Approximate member count (only with `with_counts=true`).
    #[serde(default)]
    pub approximate_member_count: Option<u64>,
}

/// Discord sends permission masks as decimal strings; older payloads used numbers.
fn deserialize_permissions<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Mask {
        Text(String),
        Number(u64),
    }

    match Mask::deserialize(deserializer)? {
        Mask::Number(n) => Ok(n),
        Mask::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// A guild member, returned when adding a user to a guild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiGuildMember {
    /// The member's user object.
    #[serde(default)]
    pub user: Option<ApiUser>,
    /// Guild nickname.
    #[serde(default)]
    pub nick: Option<String>,
    /// Role IDs.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Join time (ISO 8601).
    #[serde(default)]
    pub joined_at: Option<String>,
    /// Server-deafened.
    #[serde(default)]
    pub deaf: bool,
    /// Server-muted.
    #[serde(default)]
    pub mute: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Connections
// ─────────────────────────────────────────────────────────────────────────────

/// Who can see a connection on the user's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ConnectionVisibility {
    /// Only the user.
    #[default]
    None,
    /// Everyone.
    Everyone,
}

impl From<u8> for ConnectionVisibility {
    fn from(value: u8) -> Self {
        match value {
            1 => ConnectionVisibility::Everyone,
            _ => ConnectionVisibility::None,
        }
    }
}

impl From<ConnectionVisibility> for u8 {
    fn from(value: ConnectionVisibility) -> Self {
        match value {
            ConnectionVisibility::None => 0,
            ConnectionVisibility::Everyone => 1,
        }
    }
}

/// A linked third-party account from `GET /users/@me/connections`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConnection {
    /// Account ID on the third-party service.
    pub id: String,
    /// Account name on the third-party service.
    pub name: String,
    /// Service type (e.g. "github", "twitch").
    #[serde(rename = "type")]
    pub kind: String,
    /// Whether the connection has been revoked.
    #[serde(default)]
    pub revoked: bool,
    /// Whether the connection is verified.
    #[serde(default)]
    pub verified: bool,
    /// Whether friend sync is enabled.
    #[serde(default)]
    pub friend_sync: bool,
    /// Whether activities from this connection show in presence.
    #[serde(default)]
    pub show_activity: bool,
    /// Whether the connection has a two-way link.
    #[serde(default)]
    pub two_way_link: bool,
    /// Profile visibility.
    #[serde(default)]
    pub visibility: ConnectionVisibility,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_minimal_payload() {
        let user: ApiUser =
            serde_json::from_str(r#"{"id":"80351110224678912","username":"nelly"}"#).unwrap();
        assert_eq!(user.discriminator, "0");
        assert!(user.avatar.is_none());
        assert_eq!(user.public_flags, 0);
    }

    #[test]
    fn test_guild_permissions_as_string_or_number() {
        let guild: ApiGuild = serde_json::from_str(
            r#"{"id":"1","name":"a","permissions":"1099511627776","features":["COMMUNITY"]}"#,
        )
        .unwrap();
        assert_eq!(guild.permissions, 1 << 40);

        let guild: ApiGuild =
            serde_json::from_str(r#"{"id":"1","name":"a","permissions":8}"#).unwrap();
        assert_eq!(guild.permissions, 8);
    }

    #[test]
    fn test_guild_bad_permissions() {
        let result =
            serde_json::from_str::<ApiGuild>(r#"{"id":"1","name":"a","permissions":"lots"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_connection_type_and_visibility() {
        let conn: ApiConnection = serde_json::from_str(
            r#"{"id":"x","name":"octocat","type":"github","verified":true,"visibility":1}"#,
        )
        .unwrap();
        assert_eq!(conn.kind, "github");
        assert_eq!(conn.visibility, ConnectionVisibility::Everyone);
        assert!(!conn.revoked);
    }
}
