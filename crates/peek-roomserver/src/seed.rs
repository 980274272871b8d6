//! JSON seed files.
//!
//! A seed file is a JSON array of rooms:
//!
//! ```json
//! [
//!   {
//!     "room_id": "!abc:example.org",
//!     "room_version": "9",
//!     "state": [ { "event_id": "$create", "type": "m.room.create", ... } ],
//!     "auth_events": [ ... ]
//!   }
//! ]
//! ```
//!
//! `auth_events` holds events referenced from the state's auth chain that are
//! no longer part of current state. It may be omitted.

use peek_federation::{Pdu, RoomVersion};
use serde::Deserialize;

use crate::{error::RoomServerError, room::Room};

#[derive(Debug, Clone, Deserialize)]
pub struct RoomSeed {
    pub room_id: String,
    pub room_version: RoomVersion,
    pub state: Vec<Pdu>,
    #[serde(default)]
    pub auth_events: Vec<Pdu>,
}

impl RoomSeed {
    pub fn into_room(self) -> Result<Room, RoomServerError> {
        Room::new(self.room_id, self.room_version, self.state, self.auth_events)
    }
}

pub fn parse_seed(json: &str) -> Result<Vec<RoomSeed>, RoomServerError> {
    Ok(serde_json::from_str(json)?)
}

pub async fn read_seed_file(path: &str) -> Result<Vec<RoomSeed>, RoomServerError> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| RoomServerError::SeedRead(path.to_owned(), e))?;
    parse_seed(&json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rooms_with_optional_auth_events() {
        let seeds = parse_seed(
            r#"[
                {
                    "room_id": "!abc:example.org",
                    "room_version": "9",
                    "state": [{
                        "event_id": "$create",
                        "room_id": "!abc:example.org",
                        "sender": "@alice:example.org",
                        "type": "m.room.create",
                        "state_key": "",
                        "content": { "creator": "@alice:example.org", "room_version": "9" },
                        "origin_server_ts": 1600000000000,
                        "depth": 1
                    }]
                }
            ]"#,
        )
        .unwrap();

        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].room_version.as_str(), "9");
        assert!(seeds[0].auth_events.is_empty());

        let room = seeds[0].clone().into_room().unwrap();
        assert_eq!(room.current_state().len(), 1);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(parse_seed("{ not json"), Err(RoomServerError::SeedParse(_))));
    }

    #[tokio::test]
    async fn missing_file_is_reported_with_path() {
        let err = read_seed_file("/nonexistent/peek-seed.json").await.unwrap_err();
        assert!(matches!(&err, RoomServerError::SeedRead(p, _) if p == "/nonexistent/peek-seed.json"));
    }
}
