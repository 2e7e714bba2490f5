//! Token-keyed resource cache with revoke fencing.
//!
//! Values are cached per [`OpaqueToken`](concord_oauth::OpaqueToken) and per
//! [`ResourceKind`]. There is no TTL and no capacity bound: a slot lives until
//! its token is revoked or retired by a refresh.
//!
//! Writes go through a two-step protocol so the lock is never held across
//! upstream I/O:
//!
//! ```rust,ignore
//! let ticket = cache.begin_fetch(&token, ResourceKind::User).await?;
//! let value = fetch_upstream().await?;
//! cache.store(ticket, value).await?;
//! ```
//!
//! A ticket only lands if the slot was neither fenced nor replaced while the
//! fetch was in flight.

mod cache;
mod error;

pub use cache::{CacheEntry, CacheStats, FetchTicket, ResourceKind, TokenCache};
pub use error::{Error, Result};
