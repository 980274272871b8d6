//! Contract for the room server's remote-peek manager.

use async_trait::async_trait;
use peek_common::MatrixError;

use crate::types::{PeekRequest, PeekResult};

/// Creates or renews a remote server's peek grant on a room and returns the
/// state it needs to start following the room.
///
/// Implementations own the peek records. A request whose
/// `(room_id, server_name, peek_id)` matches a live grant renews it; anything
/// else creates one. Callers never branch on which of the two happened.
///
/// An unknown room is **not** an error: return a [`PeekResult`] with
/// `room_exists: false`. Errors are fully-formed federation errors and are
/// relayed to the remote server as-is.
#[async_trait]
pub trait PeekAdmission: Send + Sync {
    async fn admit_or_renew(&self, request: &PeekRequest) -> Result<PeekResult, MatrixError>;
}
