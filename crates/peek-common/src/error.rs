//! Centralized error types for the peek service.
//!
//! Uses `thiserror` for ergonomic error definitions. Every variant maps onto a
//! Matrix-style federation error body (`{"errcode": ..., "error": ...}`) so it
//! can be returned directly from an axum handler.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Map, Value};

const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

// ─── Relayable federation error ──────────────────────────────────────────────

/// A fully-formed federation error: HTTP status plus the JSON body a remote
/// server should see.
///
/// Collaborators return this when they want their own status and body passed
/// through unchanged. Nothing on the way out rewrites it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixError {
    #[serde(skip)]
    pub status: StatusCode,
    pub errcode: String,
    pub error: String,
    /// Additional top-level body fields (e.g. `room_version`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MatrixError {
    pub fn new(status: StatusCode, errcode: impl Into<String>, error: impl Into<String>) -> Self {
        Self { status, errcode: errcode.into(), error: error.into(), extra: Map::new() }
    }

    /// `500 M_UNKNOWN` with the generic message.
    pub fn unknown() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "M_UNKNOWN", INTERNAL_ERROR_MESSAGE)
    }

    pub fn forbidden(error: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "M_FORBIDDEN", error)
    }

    /// Attach an extra top-level field to the body.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

impl std::fmt::Display for MatrixError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.status.as_u16(), self.errcode, self.error)
    }
}

impl std::error::Error for MatrixError {}

impl IntoResponse for MatrixError {
    fn into_response(self) -> Response {
        (self.status, axum::Json(self)).into_response()
    }
}

// ─── API error ───────────────────────────────────────────────────────────────

/// Error type returned by the federation HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // === Request errors ===
    #[error("{message}")]
    Unauthorized { message: String },

    #[error("{message}")]
    InvalidParam { message: String },

    // === Protocol rejections ===
    #[error("Your homeserver does not support the features required to interact with this room")]
    IncompatibleRoomVersion { room_version: String },
}

/// JSON error body sent to remote servers.
#[derive(Serialize)]
struct ErrorBody {
    errcode: &'static str,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    room_version: Option<String>,
}

impl ApiError {
    /// Map error to HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::InvalidParam { .. } | Self::IncompatibleRoomVersion { .. } => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    /// Matrix `errcode` for programmatic handling by remote servers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "M_UNAUTHORIZED",
            Self::InvalidParam { .. } => "M_INVALID_PARAM",
            Self::IncompatibleRoomVersion { .. } => "M_INCOMPATIBLE_ROOM_VERSION",
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn invalid_param(message: impl Into<String>) -> Self {
        Self::InvalidParam { message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let errcode = self.error_code();
        let message = self.to_string();

        let room_version = match self {
            ApiError::IncompatibleRoomVersion { room_version } => Some(room_version),
            ApiError::Unauthorized { .. } | ApiError::InvalidParam { .. } => None,
        };

        (status, axum::Json(ErrorBody { errcode, error: message, room_version })).into_response()
    }
}

/// Convenience type alias for Results using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(resp: Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn incompatible_room_version_carries_version() {
        let resp = ApiError::IncompatibleRoomVersion { room_version: "10".into() }.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = body_json(resp).await;
        assert_eq!(body["errcode"], "M_INCOMPATIBLE_ROOM_VERSION");
        assert_eq!(body["room_version"], "10");
    }

    #[tokio::test]
    async fn unknown_hides_detail() {
        let resp = MatrixError::unknown().into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(resp).await;
        assert_eq!(body, serde_json::json!({ "errcode": "M_UNKNOWN", "error": "Internal Server Error" }));
    }

    #[tokio::test]
    async fn matrix_error_is_relayed_verbatim() {
        let err = MatrixError::new(StatusCode::TOO_MANY_REQUESTS, "M_LIMIT_EXCEEDED", "slow down")
            .with_field("retry_after_ms", 2000);
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        let body = body_json(resp).await;
        assert_eq!(
            body,
            serde_json::json!({
                "errcode": "M_LIMIT_EXCEEDED",
                "error": "slow down",
                "retry_after_ms": 2000,
            })
        );
    }

    #[test]
    fn error_codes() {
        assert_eq!(ApiError::unauthorized("x").error_code(), "M_UNAUTHORIZED");
        assert_eq!(ApiError::invalid_param("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::invalid_param("x").error_code(), "M_INVALID_PARAM");
    }
}
