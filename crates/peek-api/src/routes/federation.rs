//! Server-to-server federation routes.
//!
//! These endpoints are called by *remote homeservers*, not by clients. Every
//! request carries an `Authorization: X-Matrix origin=…` header naming the
//! calling server; signature checking is done in front of this service, so
//! only the origin is read here.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | PUT    | `/_matrix/federation/v1/peek/{roomId}/{peekId}?ver=…` | Start or renew a peek on a room |

use axum::{
    Router,
    extract::{Path, RawQuery, State},
    http::HeaderMap,
    routing::put,
};
use peek_common::{
    ApiError, ApiResult,
    validation::{validate_peek_id, validate_room_id, validate_server_name},
};
use peek_federation::{PeekOutcome, RoomVersion};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::AppState;

// ─── Router ───────────────────────────────────────────────────────────────────

/// Mount all federation routes.
pub fn federation_router() -> Router<Arc<AppState>> {
    Router::new().route("/_matrix/federation/v1/peek/{room_id}/{peek_id}", put(peek))
}

// ─── Peek ─────────────────────────────────────────────────────────────────────

/// `PUT /_matrix/federation/v1/peek/{roomId}/{peekId}?ver=9&ver=10`
///
/// Starts a peek on the room for the calling server, or renews it if the
/// same peek ID was used before. The `ver` parameters list every room version
/// the caller can parse.
async fn peek(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((room_id, peek_id)): Path<(String, String)>,
    RawQuery(query): RawQuery,
) -> ApiResult<PeekOutcome> {
    let origin = match extract_federation_origin(&headers, &state.server_name) {
        Ok(o) => o,
        Err(e) => {
            warn!("Rejected peek of {}: {}", room_id, e);
            return Err(e);
        }
    };

    validate_room_id(&room_id)?;
    validate_peek_id(&peek_id)?;

    let remote_versions = remote_versions(query.as_deref());
    debug!(
        "Peek {} of {} from {} (ver={:?})",
        peek_id, room_id, origin, remote_versions
    );

    Ok(state.peek.peek(&room_id, &peek_id, &origin, &remote_versions).await)
}

/// Collect every `ver` query parameter, in order.
fn remote_versions(query: Option<&str>) -> Vec<RoomVersion> {
    let Some(query) = query else {
        return Vec::new();
    };
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| key == "ver")
        .map(|(_, value)| RoomVersion::from(value.into_owned()))
        .collect()
}

// ─── Auth helpers ─────────────────────────────────────────────────────────────

/// Read the originating server from the `X-Matrix` Authorization header.
///
/// If the header names a `destination`, it must be this server.
fn extract_federation_origin(headers: &HeaderMap, server_name: &str) -> ApiResult<String> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    let params = auth
        .strip_prefix("X-Matrix ")
        .ok_or_else(|| ApiError::unauthorized("Authorization scheme must be 'X-Matrix'"))?;

    let mut origin = None;
    let mut destination = None;
    for part in params.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        let value = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(value);
        match key {
            "origin" => origin = Some(value.to_owned()),
            "destination" => destination = Some(value.to_owned()),
            _ => {}
        }
    }

    if let Some(destination) = destination {
        if destination != server_name {
            return Err(ApiError::unauthorized(format!(
                "Request is addressed to '{destination}', not this server"
            )));
        }
    }

    let origin =
        origin.ok_or_else(|| ApiError::unauthorized("X-Matrix header missing 'origin' field"))?;
    validate_server_name(&origin)
        .map_err(|_| ApiError::unauthorized(format!("Invalid origin '{origin}'")))?;
    Ok(origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(auth: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert("authorization", HeaderValue::from_str(auth).unwrap());
        h
    }

    #[test]
    fn origin_quoted_and_bare() {
        let quoted = headers(r#"X-Matrix origin="remote.example",key="ed25519:a",sig="xyz""#);
        assert_eq!(extract_federation_origin(&quoted, "local.example").unwrap(), "remote.example");

        let bare = headers("X-Matrix origin=remote.example:8448,key=\"ed25519:a\",sig=\"xyz\"");
        assert_eq!(extract_federation_origin(&bare, "local.example").unwrap(), "remote.example:8448");
    }

    #[test]
    fn origin_errors() {
        assert!(extract_federation_origin(&HeaderMap::new(), "local.example").is_err());
        assert!(extract_federation_origin(&headers("Bearer abc"), "local.example").is_err());
        assert!(extract_federation_origin(&headers("X-Matrix key=\"k\""), "local.example").is_err());
        assert!(
            extract_federation_origin(&headers("X-Matrix origin=\"bad host!\""), "local.example")
                .is_err()
        );
    }

    #[test]
    fn destination_must_be_us() {
        let h = headers(r#"X-Matrix origin="remote.example",destination="local.example",sig="x""#);
        assert!(extract_federation_origin(&h, "local.example").is_ok());
        assert!(matches!(
            extract_federation_origin(&h, "elsewhere.example"),
            Err(ApiError::Unauthorized { .. })
        ));
    }

    #[test]
    fn repeated_ver_parameters() {
        let v = remote_versions(Some("ver=6&ver=7&other=1&ver=org.example%2Ev1"));
        let v: Vec<_> = v.iter().map(RoomVersion::as_str).collect();
        assert_eq!(v, ["6", "7", "org.example.v1"]);
        assert!(remote_versions(None).is_empty());
        assert!(remote_versions(Some("")).is_empty());
    }
}
