//! Room server errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoomServerError {
    // ── Seeding ──────────────────────────────────────────────────────────────

    #[error("Failed to read seed file '{0}': {1}")]
    SeedRead(String, #[source] std::io::Error),

    #[error("Failed to parse seed file: {0}")]
    SeedParse(#[from] serde_json::Error),

    // ── Room validation ──────────────────────────────────────────────────────

    #[error("Room '{room_id}' uses room version '{room_version}', which this server does not support")]
    UnsupportedRoomVersion { room_id: String, room_version: String },

    #[error("Room '{0}' is already loaded")]
    DuplicateRoom(String),

    #[error("Event in room '{0}' has no event_id")]
    MissingEventId(String),

    #[error("Event '{event_id}' belongs to room '{actual}', not '{expected}'")]
    WrongRoom { event_id: String, expected: String, actual: String },

    #[error("Event '{0}' is listed as room state but has no state_key")]
    NotAStateEvent(String),
}
