//! Discord OAuth2 broker client.
//!
//! Turns an authorization code into a signed opaque token and serves cached,
//! typed views of the user behind it.
//!
//! # Example
//!
//! ```no_run
//! use concord_client::{ConcordClient, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = ConcordClient::builder()
//!     .client_id("123456789012345678")
//!     .client_secret("app-secret")
//!     .signing_secret("server-signing-key")
//!     .redirect_uri("https://example.com/callback")
//!     .scopes(["identify", "guilds", "guilds.join"])
//!     .build()?;
//!
//! let token = client.exchange_code("code-from-redirect").await?;
//!
//! // Cached after the first call
//! let user = client.get_user(&token, true).await?;
//! for guild in client.get_guilds(&token, true).await?.iter() {
//!     println!("{} ({} permissions)", guild.name, guild.permission_names.len());
//! }
//!
//! user.join_guild("81384788765712384").await?;
//! client.revoke(&token).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Caching
//!
//! Views are cached per token and resource kind until the token is revoked
//! or refreshed. Pass `use_cache = false` to force a fetch; the result
//! replaces the cached value.

mod client;
mod managers;
mod prefetch;
mod views;

pub use client::{ClientBuilder, ConcordClient};
pub use managers::{ConnectionManager, GuildManager, UserManager};
pub use prefetch::Prefetch;
pub use views::{Connection, Guild, User};

pub use concord_cache::{CacheStats, ResourceKind};
pub use concord_oauth::{Grant, OAuthError as Error, OpaqueToken, Result, generate_state};
pub use concord_types::{
    ApiGuildMember, BitField, BitFieldError, ConnectionVisibility, ImageFormat, ImageOptions,
    Scope, ScopeSet,
};
pub use tokio_util::sync::CancellationToken;
