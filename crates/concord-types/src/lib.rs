//! Shared types for the Concord OAuth2 broker.
//!
//! Everything in this crate is pure data: no I/O, no async.
//!
//! - [`bitfield`]: decoding integer bitmasks into named flags
//! - [`flags`]: Discord user flag and permission tables
//! - [`scope`]: OAuth2 scopes and lenient scope-set parsing
//! - [`api`]: upstream JSON shapes consumed by the broker
//! - [`cdn`]: CDN image URL options

pub mod api;
pub mod bitfield;
pub mod cdn;
pub mod flags;
pub mod scope;

pub use api::{ApiConnection, ApiGuild, ApiGuildMember, ApiUser, ConnectionVisibility};
pub use bitfield::{BitField, BitFieldError, FlagRef, FlagTable};
pub use cdn::{CDN_BASE_URL, DEFAULT_IMAGE_SIZE, ImageFormat, ImageOptions};
pub use flags::{PERMISSIONS, USER_FLAGS, permission_names, user_flag_names};
pub use scope::{Scope, ScopeSet, UnknownScope};
