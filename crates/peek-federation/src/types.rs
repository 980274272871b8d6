//! Federation data types — room versions, event shapes, and the peek
//! request/response envelopes.
//!
//! Event shapes follow the Matrix federation PDU layout so that remote
//! homeservers can parse them without translation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// How often a peeking server must re-issue its peek to keep the grant alive,
/// in microseconds (one hour).
pub const PEEK_RENEWAL_INTERVAL_US: u64 = 60 * 60 * 1000 * 1000;

// ─── Room version ────────────────────────────────────────────────────────────

/// Identifier of the event-format / authorization-rules dialect a room uses
/// (`"1"` … `"11"`, or an experimental string).
///
/// Opaque: compared by exact string equality only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomVersion(String);

impl RoomVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomVersion {
    fn from(v: &str) -> Self {
        Self(v.to_owned())
    }
}

impl From<String> for RoomVersion {
    fn from(v: String) -> Self {
        Self(v)
    }
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// A persistent federation event (PDU — Persistent Data Unit) in its bare,
/// on-the-wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pdu {
    /// Present on the wire for room versions 1 and 2 only; later versions
    /// derive it from the reference hash. Kept locally for indexing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub room_id: String,
    /// User who sent the event (`@user:server_name`).
    pub sender: String,
    #[serde(rename = "type")]
    pub event_type: String,
    /// Set on state events only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_key: Option<String>,
    pub content: Value,
    /// Unix millisecond timestamp on the origin server.
    pub origin_server_ts: i64,
    pub depth: i64,
    #[serde(default)]
    pub prev_events: Vec<String>,
    /// Events that authorise this one.
    #[serde(default)]
    pub auth_events: Vec<String>,
    #[serde(default)]
    pub hashes: BTreeMap<String, String>,
    /// `server_name → key_id → signature`.
    #[serde(default)]
    pub signatures: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsigned: Option<Value>,
}

impl Pdu {
    pub fn is_state(&self) -> bool {
        self.state_key.is_some()
    }
}

/// A PDU together with the room version it was encoded under.
///
/// The header never goes on the wire; [`HeaderedEvent::into_event`] strips it.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderedEvent {
    pub room_version: RoomVersion,
    pub event: Pdu,
}

impl HeaderedEvent {
    pub fn new(room_version: RoomVersion, event: Pdu) -> Self {
        Self { room_version, event }
    }

    pub fn into_event(self) -> Pdu {
        self.event
    }
}

/// Strip the room-version header from each event, keeping order.
pub fn unwrap_event_headers(events: Vec<HeaderedEvent>) -> Vec<Pdu> {
    events.into_iter().map(HeaderedEvent::into_event).collect()
}

// ─── Peek protocol ───────────────────────────────────────────────────────────

/// What the room server's remote-peek manager is asked to do for one
/// inbound `/peek`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeekRequest {
    pub room_id: String,
    /// Chosen by the peeking server; the same ID on a later request renews
    /// the grant.
    pub peek_id: String,
    /// The peeking server.
    pub server_name: String,
}

/// The remote-peek manager's answer.
#[derive(Debug, Clone, PartialEq)]
pub struct PeekResult {
    /// `false` when the room is unknown to the peek manager.
    pub room_exists: bool,
    pub room_version: RoomVersion,
    /// Current room state, in the order the room server returned it.
    pub state_events: Vec<HeaderedEvent>,
    /// Events that authorise `state_events`.
    pub auth_chain_events: Vec<HeaderedEvent>,
}

impl PeekResult {
    /// Answer for a room the peek manager does not know.
    pub fn room_not_found() -> Self {
        Self {
            room_exists: false,
            room_version: RoomVersion::default(),
            state_events: Vec::new(),
            auth_chain_events: Vec::new(),
        }
    }
}

/// Payload returned by `PUT /_matrix/federation/v1/peek/{roomId}/{peekId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeekResponse {
    /// Current room state snapshot.
    pub state: Vec<Pdu>,
    /// Auth chain (events needed to validate the state).
    pub auth_chain: Vec<Pdu>,
    pub room_version: RoomVersion,
    /// Microseconds until the peek must be renewed.
    pub renewal_interval: u64,
}

impl PeekResponse {
    /// Build the wire response from an admitted peek.
    pub fn from_result(result: PeekResult) -> Self {
        Self {
            state: unwrap_event_headers(result.state_events),
            auth_chain: unwrap_event_headers(result.auth_chain_events),
            room_version: result.room_version,
            renewal_interval: PEEK_RENEWAL_INTERVAL_US,
        }
    }
}
