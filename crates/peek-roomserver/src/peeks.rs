//! Remote peek grants.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Grants are keyed by room, peeking server, and the server's own peek ID.
pub(crate) type PeekKey = (String, String, String);

/// A remote server's read-only observation grant on a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemotePeek {
    pub room_id: String,
    pub server_name: String,
    pub peek_id: String,
    pub creation_ts: DateTime<Utc>,
    pub renewed_ts: DateTime<Utc>,
    /// How long after `renewed_ts` the grant stays live.
    pub renewal_interval_ms: u64,
}

impl RemotePeek {
    pub(crate) fn new(
        room_id: &str,
        server_name: &str,
        peek_id: &str,
        now: DateTime<Utc>,
        renewal_interval_ms: u64,
    ) -> Self {
        Self {
            room_id: room_id.to_owned(),
            server_name: server_name.to_owned(),
            peek_id: peek_id.to_owned(),
            creation_ts: now,
            renewed_ts: now,
            renewal_interval_ms,
        }
    }

    pub(crate) fn key(&self) -> PeekKey {
        (self.room_id.clone(), self.server_name.clone(), self.peek_id.clone())
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        i64::try_from(self.renewal_interval_ms)
            .ok()
            .and_then(Duration::try_milliseconds)
            .and_then(|d| self.renewed_ts.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at()
    }
}

/// Whether an admission created a grant or refreshed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PeekGrant {
    Created,
    Renewed,
}

/// Announced on the room server's broadcast channel for each admitted peek.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InboundPeek {
    pub grant: PeekGrant,
    pub peek: RemotePeek,
}
