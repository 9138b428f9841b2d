use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State a client echoes back to resume a multi-step authentication exchange
/// without the server holding a session for it.
///
/// Nothing in this crate checks `expires_at`; whoever honors `state` must.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuationState {
    /// Opaque to everyone except the issuing provider.
    pub state: String,
    pub provider_identifier: String,
    pub query_identifier: String,
    /// Milliseconds since the UNIX epoch.
    pub expires_at: i64,
}

impl ContinuationState {
    pub fn new<S: Into<String>>(state: S, provider_identifier: S, query_identifier: S, expires_at: i64) -> Self {
        Self {
            state: state.into(),
            provider_identifier: provider_identifier.into(),
            query_identifier: query_identifier.into(),
            expires_at,
        }
    }

    /// `None` if the timestamp is outside chrono's representable range.
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.expires_at)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() >= self.expires_at
    }
}
