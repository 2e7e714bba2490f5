//! Error types for cache operations.

/// Error type for cache operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The token's slot is fenced by an in-progress revocation.
    #[error("Token is fenced: {0}")]
    Fenced(String),

    /// The slot was evicted or re-created after the ticket was issued.
    #[error("Stale fetch ticket for {0}")]
    StaleTicket(String),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;
