//! Store configuration: typed options with documented defaults.
//!
//! [`SessionStoreConfig`] is resolved once at construction and immutable
//! afterwards. Unset fields take their defaults both through [`Default`] and
//! through `#[serde(default)]`, so partial configurations deserialized from a
//! file merge recursively (table name and each column independently
//! defaultable). Validation is a pure function; no I/O happens until the
//! configuration has passed it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionStoreError};

/// Default maximum age of a valid session: 24 hours.
pub const DEFAULT_EXPIRATION: Duration = Duration::from_millis(86_400_000);

/// Default period between expired-session sweeps: 15 minutes.
pub const DEFAULT_CHECK_EXPIRATION_INTERVAL: Duration = Duration::from_millis(900_000);

/// Configuration for a [`SeaOrmStore`](crate::SeaOrmStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionStoreConfig {
    /// Whether to periodically check for and clear expired sessions.
    pub clear_expired: bool,

    /// How frequently expired sessions are cleared.
    pub check_expiration_interval: Duration,

    /// The maximum age of a valid session, applied when the session payload
    /// carries no cookie expiry of its own.
    pub expiration: Duration,

    /// Whether to create the session table at construction if it does not
    /// already exist.
    pub create_table: bool,

    /// Pool size used when the store opens its own connection. Ignored for
    /// adopted connections and for [`ConnectOptions`](sea_orm::ConnectOptions)
    /// that already carry a pool size.
    pub connection_limit: u32,

    /// Whether `close()` ends the database connection. When unset, resolves
    /// to `true` only if the store created the connection itself.
    pub end_connection_on_close: Option<bool>,

    /// Turn `touch` into a no-op, trading sliding expiration for one fewer
    /// write per request.
    pub disable_touch: bool,

    /// Optional retry policy for the initial connection attempt.
    pub connect_retry: Option<ReconnectPolicy>,

    /// Table and column naming.
    pub schema: SchemaConfig,
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            clear_expired: true,
            check_expiration_interval: DEFAULT_CHECK_EXPIRATION_INTERVAL,
            expiration: DEFAULT_EXPIRATION,
            create_table: true,
            connection_limit: 1,
            end_connection_on_close: None,
            disable_touch: false,
            connect_retry: None,
            schema: SchemaConfig::default(),
        }
    }
}

impl SessionStoreConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the background expiration sweeper.
    pub fn with_clear_expired(mut self, clear_expired: bool) -> Self {
        self.clear_expired = clear_expired;
        self
    }

    /// Set the sweep period.
    pub fn with_check_expiration_interval(mut self, interval: Duration) -> Self {
        self.check_expiration_interval = interval;
        self
    }

    /// Set the default session TTL.
    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }

    /// Enable or disable table auto-creation.
    pub fn with_create_table(mut self, create_table: bool) -> Self {
        self.create_table = create_table;
        self
    }

    /// Set the pool size used when the store opens its own connection.
    pub fn with_connection_limit(mut self, connection_limit: u32) -> Self {
        self.connection_limit = connection_limit;
        self
    }

    /// Explicitly choose whether `close()` ends the connection.
    pub fn with_end_connection_on_close(mut self, end: bool) -> Self {
        self.end_connection_on_close = Some(end);
        self
    }

    /// Disable `touch` entirely.
    pub fn with_disable_touch(mut self, disable_touch: bool) -> Self {
        self.disable_touch = disable_touch;
        self
    }

    /// Set the initial-connect retry policy.
    pub fn with_connect_retry(mut self, policy: ReconnectPolicy) -> Self {
        self.connect_retry = Some(policy);
        self
    }

    /// Replace the schema naming configuration.
    pub fn with_schema(mut self, schema: SchemaConfig) -> Self {
        self.schema = schema;
        self
    }

    /// Validate the configuration. Pure; called by the store constructors
    /// before any I/O.
    pub fn validate(&self) -> Result<()> {
        self.schema.validate()
    }

    /// Resolve the effective teardown-on-close flag.
    ///
    /// The explicit option wins; otherwise the connection is ended on close
    /// only when the store created it.
    pub(crate) fn resolve_end_connection_on_close(&self, store_created_connection: bool) -> bool {
        self.end_connection_on_close
            .unwrap_or(store_created_connection)
    }
}

/// Table and column naming for the session table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Name of the session table.
    pub table_name: String,

    /// Column names; configurable only within the fixed allow-list.
    pub column_names: ColumnNames,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            table_name: "sessions".to_string(),
            column_names: ColumnNames::default(),
        }
    }
}

impl SchemaConfig {
    /// Create a schema configuration with default naming.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the table name.
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Override a column name.
    ///
    /// `key` must be one of the allow-listed logical columns `session_id`,
    /// `expires` or `data`; anything else fails with
    /// [`SessionStoreError::Configuration`] naming the offending key.
    pub fn set_column_name(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        match key {
            "session_id" => self.column_names.session_id = value,
            "expires" => self.column_names.expires = value,
            "data" => self.column_names.data = value,
            other => {
                return Err(SessionStoreError::Configuration(format!(
                    "unknown column specified (\"{other}\"); only \"session_id\", \
                     \"expires\" and \"data\" are configurable"
                )))
            }
        }
        Ok(())
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require_ident("table name", &self.table_name)?;
        require_ident("session_id column name", &self.column_names.session_id)?;
        require_ident("expires column name", &self.column_names.expires)?;
        require_ident("data column name", &self.column_names.data)?;
        Ok(())
    }
}

/// Physical names of the three logical columns.
///
/// `deny_unknown_fields` makes deserialized configurations fail on any key
/// outside the allow-list, mirroring [`SchemaConfig::set_column_name`] for
/// programmatic callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnNames {
    pub session_id: String,
    pub expires: String,
    pub data: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            session_id: "session_id".to_string(),
            expires: "expires".to_string(),
            data: "data".to_string(),
        }
    }
}

fn require_ident(kind: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SessionStoreError::Configuration(format!(
            "{kind} must not be empty"
        )));
    }
    Ok(())
}

/// Retry policy for the initial connection attempt.
///
/// Delays are grouped: the first `group_size` retries wait `delays[0]`, the
/// next `group_size` wait `delays[1]`, and so on, clamping to the last entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Maximum number of attempts; `0` means unlimited.
    pub max_attempts: u32,

    /// Delay schedule, one entry per attempt group.
    pub delays: Vec<Duration>,

    /// Number of attempts per delay group.
    pub group_size: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 25,
            delays: vec![
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(5),
                Duration::from_secs(30),
                Duration::from_secs(300),
            ],
            group_size: 5,
        }
    }
}

impl ReconnectPolicy {
    /// Delay to wait after the given zero-based failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.delays.is_empty() {
            return Duration::ZERO;
        }
        let group = (attempt / self.group_size.max(1)) as usize;
        self.delays[group.min(self.delays.len() - 1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SessionStoreConfig::default();
        assert!(config.clear_expired);
        assert_eq!(
            config.check_expiration_interval,
            Duration::from_millis(900_000)
        );
        assert_eq!(config.expiration, Duration::from_millis(86_400_000));
        assert!(config.create_table);
        assert_eq!(config.connection_limit, 1);
        assert_eq!(config.end_connection_on_close, None);
        assert!(!config.disable_touch);
        assert_eq!(config.schema.table_name, "sessions");
        assert_eq!(config.schema.column_names.session_id, "session_id");
        assert_eq!(config.schema.column_names.expires, "expires");
        assert_eq!(config.schema.column_names.data, "data");
    }

    #[test]
    fn builder_pattern() {
        let config = SessionStoreConfig::new()
            .with_expiration(Duration::from_secs(3600))
            .with_clear_expired(false)
            .with_schema(SchemaConfig::new().with_table_name("app_sessions"));

        assert_eq!(config.expiration, Duration::from_secs(3600));
        assert!(!config.clear_expired);
        assert_eq!(config.schema.table_name, "app_sessions");

        // Other values remain at their defaults.
        assert_eq!(config.connection_limit, 1);
        assert!(config.create_table);
    }

    #[test]
    fn allow_listed_column_overrides() {
        let mut schema = SchemaConfig::default();
        schema.set_column_name("session_id", "sid").unwrap();
        schema.set_column_name("expires", "valid_until").unwrap();
        schema.set_column_name("data", "payload").unwrap();
        assert_eq!(schema.column_names.session_id, "sid");
        assert_eq!(schema.column_names.expires, "valid_until");
        assert_eq!(schema.column_names.data, "payload");
    }

    #[test]
    fn unknown_column_is_rejected() {
        let mut schema = SchemaConfig::default();
        let err = schema.set_column_name("bogus", "x").unwrap_err();
        match err {
            SessionStoreError::Configuration(msg) => assert!(msg.contains("bogus")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn deserialized_unknown_column_is_rejected() {
        let err = serde_json::from_value::<ColumnNames>(serde_json::json!({ "bogus": "x" }))
            .unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn partial_config_merges_nested_defaults() {
        let config: SessionStoreConfig = serde_json::from_value(serde_json::json!({
            "schema": { "table_name": "custom" }
        }))
        .unwrap();
        assert_eq!(config.schema.table_name, "custom");
        assert_eq!(config.schema.column_names.session_id, "session_id");
        assert!(config.clear_expired);
    }

    #[test]
    fn empty_identifier_fails_validation() {
        let config =
            SessionStoreConfig::new().with_schema(SchemaConfig::new().with_table_name("  "));
        assert!(matches!(
            config.validate(),
            Err(SessionStoreError::Configuration(_))
        ));
    }

    #[test]
    fn end_connection_on_close_resolution() {
        let config = SessionStoreConfig::default();
        assert!(config.resolve_end_connection_on_close(true));
        assert!(!config.resolve_end_connection_on_close(false));

        let config = config.with_end_connection_on_close(true);
        assert!(config.resolve_end_connection_on_close(false));
    }

    #[test]
    fn reconnect_delay_schedule() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(4), Duration::from_millis(500));
        assert_eq!(policy.delay_for(5), Duration::from_secs(1));
        assert_eq!(policy.delay_for(14), Duration::from_secs(5));
        assert_eq!(policy.delay_for(20), Duration::from_secs(300));
        // Clamped to the last group.
        assert_eq!(policy.delay_for(1000), Duration::from_secs(300));
    }
}
