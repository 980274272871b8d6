//! Identifier validation utilities.
//!
//! The transport layer checks identifier syntax before anything reaches the
//! peek core; the core itself passes identifiers through untouched.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ApiError;

/// Matrix identifiers are capped at 255 bytes including sigil and domain.
const MAX_ID_BYTES: usize = 255;

/// `hostname | IPv4 | [IPv6]`, optionally followed by `:port`.
static SERVER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\[[0-9A-Fa-f:.]+\]|[0-9A-Za-z.\-]+)(:[0-9]{1,5})?$")
        .unwrap_or_else(|e| panic!("server name pattern is invalid: {e}"))
});

/// Validate a federation server name (`example.org`, `example.org:8448`, `[::1]:8448`).
pub fn validate_server_name(name: &str) -> Result<(), ApiError> {
    if name.is_empty() || name.len() > MAX_ID_BYTES || !SERVER_NAME.is_match(name) {
        return Err(ApiError::invalid_param(format!("Invalid server name '{name}'")));
    }
    Ok(())
}

/// Validate a room ID of the form `!opaque:server_name`.
pub fn validate_room_id(room_id: &str) -> Result<(), ApiError> {
    let invalid = || ApiError::invalid_param(format!("Invalid room ID '{room_id}'"));

    if room_id.len() > MAX_ID_BYTES {
        return Err(invalid());
    }
    let rest = room_id.strip_prefix('!').ok_or_else(invalid)?;
    let (localpart, server_name) = rest.split_once(':').ok_or_else(invalid)?;
    if localpart.is_empty() {
        return Err(invalid());
    }
    validate_server_name(server_name).map_err(|_| invalid())
}

/// Peek IDs are chosen by the remote server and are otherwise opaque.
pub fn validate_peek_id(peek_id: &str) -> Result<(), ApiError> {
    if peek_id.is_empty() || peek_id.len() > MAX_ID_BYTES {
        return Err(ApiError::invalid_param("Peek ID must be between 1 and 255 bytes"));
    }
    Ok(())
}
