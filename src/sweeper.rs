//! Background expiration sweeper.

use std::time::Duration;

use sea_orm::DatabaseConnection;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::SchemaConfig;
use crate::query;
use crate::session::now_unix_seconds;

/// Handle to the periodic expired-session sweep task.
///
/// The task holds clones of the connection and schema config only; dropping
/// the handle without [`stop`](Self::stop) leaves the task running.
#[derive(Debug)]
pub(crate) struct ExpirationSweeper {
    handle: JoinHandle<()>,
}

impl ExpirationSweeper {
    /// Spawn a sweep task running every `period`.
    ///
    /// The first (immediate) interval tick is skipped so the first sweep
    /// happens one full period after start. A failed sweep is logged and the
    /// loop continues; only [`stop`](Self::stop) terminates it.
    pub(crate) fn start(
        conn: DatabaseConnection,
        schema: SchemaConfig,
        period: Duration,
    ) -> Self {
        // tokio::time::interval panics on a zero period.
        let period = period.max(Duration::from_millis(1));
        debug!(period_ms = period.as_millis() as u64, "starting expiration sweeper");

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // Skip the first immediate tick.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                match query::delete_expired_sessions(&conn, &schema, now_unix_seconds()).await {
                    Ok(0) => debug!("session sweep: no expired sessions"),
                    Ok(removed) => debug!(removed, "session sweep removed expired sessions"),
                    Err(err) => warn!(error = %err, "session sweep failed"),
                }
            }
        });

        Self { handle }
    }

    /// Cancel the sweep task. Synchronous and idempotent.
    pub(crate) fn stop(&self) {
        self.handle.abort();
    }
}
