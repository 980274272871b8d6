//! Room-version compatibility gate.
//!
//! A remote server lists the room versions it can parse (`?ver=` on the peek
//! URL). Nothing about the room may be disclosed unless the room's actual
//! version is one of them: authorization rules and event formats differ per
//! version, and a peer that cannot parse them must be refused outright.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::{error::FederationError, types::RoomVersion};

/// Authoritative source of a room's version.
#[async_trait]
pub trait RoomVersionSource: Send + Sync {
    /// Resolve the version of `room_id`. Errors are infrastructure faults.
    async fn query_room_version(&self, room_id: &str) -> Result<RoomVersion, FederationError>;
}

/// Result of a successful version lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    /// The room's actual version.
    pub room_version: RoomVersion,
    /// Whether the remote listed `room_version`.
    pub admitted: bool,
}

/// Read-only check that a remote server can parse a room's version.
#[derive(Clone)]
pub struct VersionGate {
    source: Arc<dyn RoomVersionSource>,
}

impl VersionGate {
    pub fn new(source: Arc<dyn RoomVersionSource>) -> Self {
        Self { source }
    }

    /// Look up `room_id`'s version and test it against `remote_versions`.
    ///
    /// A lookup failure is returned as `Err` and the caller must stop. A
    /// version the remote does not list is **not** an error: it comes back
    /// as `admitted: false`.
    pub async fn check(
        &self,
        room_id: &str,
        remote_versions: &[RoomVersion],
    ) -> Result<GateDecision, FederationError> {
        let room_version = self.source.query_room_version(room_id).await?;
        let admitted = remote_supports(&room_version, remote_versions);
        debug!(
            "Version gate for {}: room is v{}, remote supports {:?} → admitted={}",
            room_id, room_version, remote_versions, admitted
        );
        Ok(GateDecision { room_version, admitted })
    }
}

/// `true` iff `remote_versions` contains a value exactly equal to `room_version`.
pub fn remote_supports(room_version: &RoomVersion, remote_versions: &[RoomVersion]) -> bool {
    remote_versions.iter().any(|v| v == room_version)
}
