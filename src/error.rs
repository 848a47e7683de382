//! Error taxonomy for the session store.
//!
//! Every operation surfaces its failure to the immediate caller as a typed
//! [`SessionStoreError`]; nothing is swallowed except the documented per-row
//! skip in [`all`](crate::SeaOrmStore::all) and the sweeper's per-tick catch.

use thiserror::Error;
use tower_sessions::session_store;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SessionStoreError>;

/// Errors produced by the session store.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// Invalid configuration (unknown or empty schema identifier).
    ///
    /// Raised before any I/O; a store is never constructed from an invalid
    /// configuration.
    #[error("invalid session store configuration: {0}")]
    Configuration(String),

    /// Failed to establish or tear down the database connection.
    #[error("database connection error: {0}")]
    Connection(String),

    /// DDL failure other than "table already exists".
    #[error("failed to create session table: {0}")]
    Schema(String),

    /// A CRUD statement failed. The store itself remains usable.
    #[error("session query failed: {0}")]
    Query(String),

    /// A stored payload could not be deserialized.
    ///
    /// Fatal to `get` for that session; skipped (and logged) by `all`.
    #[error("corrupt payload for session \"{session_id}\": {reason}")]
    DataCorruption { session_id: String, reason: String },

    /// A payload could not be serialized on the write path.
    #[error("failed to encode payload for session \"{session_id}\": {reason}")]
    Encode { session_id: String, reason: String },

    /// An operation was attempted after `close()`.
    #[error("session store is closed")]
    ConnectionClosed,
}

impl From<SessionStoreError> for session_store::Error {
    fn from(err: SessionStoreError) -> Self {
        match err {
            SessionStoreError::DataCorruption { .. } => {
                session_store::Error::Decode(err.to_string())
            }
            SessionStoreError::Encode { .. } => session_store::Error::Encode(err.to_string()),
            _ => session_store::Error::Backend(err.to_string()),
        }
    }
}
