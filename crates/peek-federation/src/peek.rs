//! Inbound peek handling: version gate, admission, response assembly.
//!
//! | Situation | Outcome |
//! |-----------|---------|
//! | version lookup fails | `500 M_UNKNOWN` |
//! | room server reports a different version than the gate | `500 M_UNKNOWN` |
//! | remote cannot parse the room's version | `400 M_INCOMPATIBLE_ROOM_VERSION` + `room_version` |
//! | admission returns an error | that error's status and body, unchanged |
//! | admission says the room does not exist | `404`, empty body |
//! | admitted | `200` with state, auth chain, room version, renewal interval |

use std::sync::Arc;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use peek_common::{ApiError, MatrixError};
use tracing::{error, info, warn};

use crate::{
    admission::PeekAdmission,
    types::{PeekRequest, PeekResponse, RoomVersion},
    version_gate::{RoomVersionSource, VersionGate},
};

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// Terminal result of one peek request. Each variant maps to exactly one
/// response; nothing is ever partially sent.
#[derive(Debug)]
pub enum PeekOutcome {
    /// Peek granted or renewed.
    Peeked(PeekResponse),
    /// The remote did not list the room's version.
    IncompatibleRoomVersion(RoomVersion),
    /// The peek manager does not know the room.
    RoomNotFound,
    /// The room version could not be resolved, or the room server disagreed
    /// with the version gate about it.
    InternalFault,
    /// The peek manager refused; relayed verbatim.
    Rejected(MatrixError),
}

impl PeekOutcome {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Peeked(_) => StatusCode::OK,
            Self::IncompatibleRoomVersion(_) => StatusCode::BAD_REQUEST,
            Self::RoomNotFound => StatusCode::NOT_FOUND,
            Self::InternalFault => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Rejected(e) => e.status,
        }
    }
}

impl IntoResponse for PeekOutcome {
    fn into_response(self) -> Response {
        match self {
            Self::Peeked(body) => (StatusCode::OK, Json(body)).into_response(),
            Self::IncompatibleRoomVersion(room_version) => {
                ApiError::IncompatibleRoomVersion { room_version: room_version.to_string() }
                    .into_response()
            }
            Self::RoomNotFound => StatusCode::NOT_FOUND.into_response(),
            Self::InternalFault => MatrixError::unknown().into_response(),
            Self::Rejected(e) => e.into_response(),
        }
    }
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Handles `/peek` for one server. Stateless; clone freely.
#[derive(Clone)]
pub struct PeekService {
    gate: VersionGate,
    admission: Arc<dyn PeekAdmission>,
}

impl PeekService {
    pub fn new(versions: Arc<dyn RoomVersionSource>, admission: Arc<dyn PeekAdmission>) -> Self {
        Self { gate: VersionGate::new(versions), admission }
    }

    /// Process a peek from `origin` on `room_id`.
    ///
    /// Identifiers are passed to the peek manager exactly as given; syntax
    /// checks belong to the transport layer.
    pub async fn peek(
        &self,
        room_id: &str,
        peek_id: &str,
        origin: &str,
        remote_versions: &[RoomVersion],
    ) -> PeekOutcome {
        // ── 1. Version gate ──────────────────────────────────────────────────
        let decision = match self.gate.check(room_id, remote_versions).await {
            Ok(d) => d,
            Err(e) => {
                error!("Peek of {} by {}: room version lookup failed: {}", room_id, origin, e);
                return PeekOutcome::InternalFault;
            }
        };

        if !decision.admitted {
            warn!(
                "Refusing peek of {} by {}: room is v{}, remote supports {:?}",
                room_id, origin, decision.room_version, remote_versions
            );
            return PeekOutcome::IncompatibleRoomVersion(decision.room_version);
        }

        // History visibility is not consulted here.

        // ── 2. Admission ─────────────────────────────────────────────────────
        // New grant vs renewal is decided by the room server.
        let request = PeekRequest {
            room_id: room_id.to_owned(),
            peek_id: peek_id.to_owned(),
            server_name: origin.to_owned(),
        };

        let result = match self.admission.admit_or_renew(&request).await {
            Ok(r) => r,
            Err(e) => {
                warn!("Peek of {} by {} rejected by room server: {}", room_id, origin, e);
                return PeekOutcome::Rejected(e);
            }
        };

        // ── 3. Response ──────────────────────────────────────────────────────
        if !result.room_exists {
            info!("Peek of {} by {}: room not known to the room server", room_id, origin);
            return PeekOutcome::RoomNotFound;
        }

        // The body must only ever describe the version the gate admitted.
        if result.room_version != decision.room_version {
            error!(
                "Peek of {} by {}: room server reports v{}, version gate admitted v{}",
                room_id, origin, result.room_version, decision.room_version
            );
            return PeekOutcome::InternalFault;
        }

        info!(
            "Peek {} of {} by {} admitted: {} state events, {} auth events",
            peek_id,
            room_id,
            origin,
            result.state_events.len(),
            result.auth_chain_events.len()
        );
        PeekOutcome::Peeked(PeekResponse::from_result(result))
    }
}
