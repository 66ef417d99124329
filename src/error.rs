//! Error types for the AgriBot gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the gateway
///
/// Each variant tags a distinct failure cause so callers and tests can branch
/// on the kind instead of matching on message text.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Webhook handshake rejection (mode/token/challenge mismatch)
    #[error("handshake rejected: {0}")]
    Handshake(String),

    /// Inbound envelope missing a required field
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Graph API call failed (transport error, bad status, unresolvable media)
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Object storage operation failed
    #[error("storage error: {0}")]
    Storage(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
