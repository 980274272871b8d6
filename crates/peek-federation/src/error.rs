//! Federation-specific error types.

use thiserror::Error;

/// Errors raised by the room-version source and other collaborator plumbing.
///
/// None of these are shown to remote servers; the peek handler reports them
/// as a generic internal fault.
#[derive(Debug, Error)]
pub enum FederationError {
    // ── Room lookups ─────────────────────────────────────────────────────────

    #[error("Missing room info for room '{0}'")]
    UnknownRoom(String),

    #[error("Room version lookup for '{0}' failed: {1}")]
    RoomVersionLookup(String, String),
}
