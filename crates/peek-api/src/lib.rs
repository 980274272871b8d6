//! # peek-api
//!
//! HTTP layer for the federation peek endpoint. Extracts the requesting
//! server, checks identifier syntax, and hands the request to
//! [`PeekService`].

pub mod routes;

use axum::{Router, http::StatusCode};
use peek_federation::PeekService;
use std::{sync::Arc, time::Duration};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Public server name used in federation (e.g. "peek.example.com").
    /// Inbound requests addressed to another destination are refused.
    pub server_name: String,
    pub peek: PeekService,
}

/// Build the complete router with all routes and middleware.
///
/// `request_timeout` bounds each request, collaborator calls included; on
/// expiry the in-flight handler future is dropped and the caller gets a
/// `408`.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::federation::federation_router())
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}
