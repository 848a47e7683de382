//! The capability interface consumed by session middleware.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::session::SessionData;

/// Session persistence operations, independent of any concrete store.
///
/// Middleware should depend on this trait rather than on
/// [`SeaOrmStore`](crate::SeaOrmStore) directly.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Fetch a session by id; `None` if absent or expired.
    async fn get(&self, session_id: &str) -> Result<Option<SessionData>>;

    /// Insert or update a session.
    async fn set(&self, session_id: &str, data: &SessionData) -> Result<()>;

    /// Refresh a session's expiration without rewriting its payload.
    async fn touch(&self, session_id: &str, data: &SessionData) -> Result<()>;

    /// Delete a session; absence is not an error.
    async fn destroy(&self, session_id: &str) -> Result<()>;

    /// Number of sessions that have not expired.
    async fn length(&self) -> Result<u64>;

    /// All unexpired sessions keyed by id. Corrupt rows are skipped.
    async fn all(&self) -> Result<HashMap<String, SessionData>>;

    /// Delete every session unconditionally.
    async fn clear(&self) -> Result<()>;
}
