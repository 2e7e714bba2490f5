//! Identity view.

use std::fmt;
use std::sync::Arc;

use concord_oauth::{Grant, OAuthClient, OAuthError, Result, with_cancellation};
use concord_types::{
    ApiGuildMember, ApiUser, BitField, BitFieldError, CDN_BASE_URL, ImageOptions, Scope, ScopeSet,
    USER_FLAGS,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// The user a token was issued for.
#[derive(Clone, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    /// Legacy discriminator; `"0"` for migrated usernames.
    pub discriminator: String,
    pub global_name: Option<String>,
    /// Avatar hash.
    pub avatar: Option<String>,
    /// Banner hash.
    pub banner: Option<String>,
    pub banner_color: Option<String>,
    pub accent_color: Option<u32>,
    pub avatar_decoration: Option<String>,
    pub bot: bool,
    pub locale: Option<String>,
    pub mfa_enabled: bool,
    pub premium_type: Option<u8>,
    pub email: Option<String>,
    pub verified: Option<bool>,
    /// Raw public flag mask.
    pub public_flags: u64,
    /// Names of the public flags, in table order.
    pub flags: Vec<&'static str>,

    #[serde(skip)]
    grant: Grant,
    #[serde(skip)]
    oauth: Arc<OAuthClient>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("discriminator", &self.discriminator)
            .field("global_name", &self.global_name)
            .field("flags", &self.flags)
            .field("scope", &self.grant.scope)
            .finish_non_exhaustive()
    }
}

impl User {
    pub(crate) fn new(api: ApiUser, grant: Grant, oauth: Arc<OAuthClient>) -> Self {
        let flags = BitField::new(USER_FLAGS, api.public_flags).to_vec();
        Self {
            id: api.id,
            username: api.username,
            discriminator: api.discriminator,
            global_name: api.global_name,
            avatar: api.avatar,
            banner: api.banner,
            banner_color: api.banner_color,
            accent_color: api.accent_color,
            avatar_decoration: api.avatar_decoration,
            bot: api.bot,
            locale: api.locale,
            mfa_enabled: api.mfa_enabled,
            premium_type: api.premium_type,
            email: api.email,
            verified: api.verified,
            public_flags: api.public_flags,
            flags,
            grant,
            oauth,
        }
    }

    /// `username#1234`, or just the username once migrated off discriminators.
    pub fn tag(&self) -> String {
        if self.has_legacy_discriminator() {
            format!("{}#{}", self.username, self.discriminator)
        } else {
            self.username.clone()
        }
    }

    /// Global display name, falling back to the username.
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }

    fn has_legacy_discriminator(&self) -> bool {
        !self.discriminator.is_empty() && self.discriminator != "0"
    }

    // ─────────────────────────────────────────────────────────────────────────
    // CDN links
    // ─────────────────────────────────────────────────────────────────────────

    /// CDN link to the custom avatar, if one is set.
    pub fn avatar_url(&self, options: ImageOptions) -> Option<String> {
        self.avatar
            .as_deref()
            .map(|hash| options.url("avatars", &self.id, hash))
    }

    /// CDN link to the profile banner, if one is set.
    pub fn banner_url(&self, options: ImageOptions) -> Option<String> {
        self.banner
            .as_deref()
            .map(|hash| options.url("banners", &self.id, hash))
    }

    /// CDN link to the default avatar Discord assigns.
    pub fn default_avatar_url(&self) -> String {
        let index = if self.has_legacy_discriminator() {
            self.discriminator.parse::<u64>().unwrap_or(0) % 5
        } else {
            (self.id.parse::<u64>().unwrap_or(0) >> 22) % 6
        };
        format!("{}/embed/avatars/{}.png", CDN_BASE_URL, index)
    }

    /// The custom avatar if set, otherwise the default one.
    pub fn display_avatar_url(&self, options: ImageOptions) -> String {
        self.avatar_url(options)
            .unwrap_or_else(|| self.default_avatar_url())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Flags and scopes
    // ─────────────────────────────────────────────────────────────────────────

    /// Public flags as a bitfield.
    pub fn flag_set(&self) -> BitField {
        BitField::new(USER_FLAGS, self.public_flags)
    }

    /// Check a public flag by name, e.g. `"VERIFIED_DEVELOPER"`.
    pub fn has_flag(&self, name: &str) -> std::result::Result<bool, BitFieldError> {
        self.flag_set().has(name)
    }

    /// The scopes the user granted.
    pub fn scopes(&self) -> ScopeSet {
        self.grant.scopes()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Privileged actions
    // ─────────────────────────────────────────────────────────────────────────

    /// Add the user to a guild.
    ///
    /// Needs the `guilds.join` scope; without it this fails with
    /// [`OAuthError::MissingScope`] before any network call. Returns `None`
    /// if the user was already a member.
    pub async fn join_guild(&self, guild_id: &str) -> Result<Option<ApiGuildMember>> {
        self.join(guild_id, None).await
    }

    /// [`join_guild`](Self::join_guild), abandoned if `cancel` fires first.
    pub async fn join_guild_cancellable(
        &self,
        guild_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ApiGuildMember>> {
        self.join(guild_id, Some(cancel)).await
    }

    async fn join(
        &self,
        guild_id: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Option<ApiGuildMember>> {
        if !self.grant.scopes().contains(Scope::GuildsJoin) {
            return Err(OAuthError::MissingScope(Scope::GuildsJoin));
        }
        let guild_id = guild_id.trim();
        if guild_id.is_empty() {
            return Err(OAuthError::InvalidRequest("guild_id is empty".to_string()));
        }

        with_cancellation(
            cancel,
            self.oauth.add_guild_member(&self.grant, guild_id, &self.id),
        )
        .await
    }
}
