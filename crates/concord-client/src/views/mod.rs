//! Read-only views built from upstream JSON.
//!
//! Views are immutable once built. [`User`] also carries its grant and a
//! handle to the exchange client so it can act on the user's behalf.

mod connection;
mod guild;
mod user;

pub use connection::Connection;
pub use guild::Guild;
pub use user::User;
