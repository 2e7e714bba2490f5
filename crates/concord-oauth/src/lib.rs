//! Discord OAuth2 token exchange and signed-token codec.
//!
//! # Components
//!
//! - [`grant`]: the provider's token-exchange result and its opaque, signed form
//! - [`codec`]: HMAC signing and verification of grants
//! - [`exchange`]: authorization URL, code exchange, refresh, revoke, and resource fetches
//! - [`cancel`]: racing upstream calls against a caller's cancellation token

pub mod cancel;
pub mod codec;
pub mod error;
pub mod exchange;
pub mod grant;

pub use cancel::with_cancellation;
pub use codec::TokenCodec;
pub use error::{OAuthError, Result};
pub use exchange::{
    AuthorizationRequest, DEFAULT_API_BASE, DEFAULT_API_VERSION, OAuthClient, OAuthConfig,
    generate_state,
};
pub use grant::{Grant, OpaqueToken};
