//! Session payload model and expiry arithmetic.
//!
//! A session payload is an arbitrary JSON object. The only convention the
//! store recognizes is an optional `cookie` object whose `expires` field
//! (RFC 3339, legacy alias `_expires`) overrides the default TTL when a row's
//! expiration is computed. Everything else passes through untouched.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

/// A session's attribute bag.
///
/// Round-trips arbitrary JSON objects losslessly: unrecognized keys land in
/// `attributes`, and a present `cookie` keeps its own unrecognized keys in
/// [`SessionCookie::attributes`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// Cookie metadata, when the middleware stores any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<SessionCookie>,

    /// All other session attributes.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl SessionData {
    /// Resolve the row expiration for this payload: the cookie's expiry hint
    /// when present, otherwise now plus the default TTL. Whole Unix seconds.
    pub(crate) fn resolve_expiry(&self, default_ttl: Duration) -> i64 {
        match self.cookie.as_ref().and_then(|cookie| cookie.expires) {
            Some(at) => unix_seconds(at),
            None => unix_seconds(OffsetDateTime::now_utc() + default_ttl),
        }
    }
}

/// The `cookie` object of a session payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionCookie {
    /// Absolute expiration instant. Serialized as RFC 3339; the legacy
    /// `_expires` spelling is accepted on input.
    #[serde(
        default,
        alias = "_expires",
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires: Option<OffsetDateTime>,

    /// Remaining cookie attributes (path, httpOnly, ...), passed through.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Whole Unix seconds for an instant, rounding half-up from milliseconds.
///
/// Reads and writes both go through this helper so the stored value and the
/// expiration comparisons can never disagree by a fraction of a second.
pub(crate) fn unix_seconds(at: OffsetDateTime) -> i64 {
    let millis = at.unix_timestamp_nanos() / 1_000_000;
    (millis + 500).div_euclid(1000) as i64
}

/// The current time in whole Unix seconds.
pub(crate) fn now_unix_seconds() -> i64 {
    unix_seconds(OffsetDateTime::now_utc())
}
