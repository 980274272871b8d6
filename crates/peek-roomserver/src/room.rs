//! A room's version, current state, and the event pool its auth chain is
//! drawn from.

use std::collections::{HashMap, HashSet, VecDeque};

use peek_federation::{HeaderedEvent, Pdu, RoomVersion};
use tracing::debug;

use crate::error::RoomServerError;

#[derive(Debug, Clone)]
pub struct Room {
    room_id: String,
    room_version: RoomVersion,
    /// Event IDs of the current state, in presentation order.
    state: Vec<String>,
    /// Every event known for the room, state and auth alike.
    events: HashMap<String, Pdu>,
}

impl Room {
    /// Build a room from its current state and any further events that the
    /// state's `auth_events` may reference.
    ///
    /// Every event must carry an `event_id` and belong to `room_id`; every
    /// state event must carry a `state_key`.
    pub fn new(
        room_id: impl Into<String>,
        room_version: RoomVersion,
        state: Vec<Pdu>,
        auth_events: Vec<Pdu>,
    ) -> Result<Self, RoomServerError> {
        let room_id = room_id.into();
        let mut events = HashMap::with_capacity(state.len() + auth_events.len());
        let mut state_ids = Vec::with_capacity(state.len());

        for event in state {
            let event_id = check_event(&room_id, &event)?;
            if !event.is_state() {
                return Err(RoomServerError::NotAStateEvent(event_id));
            }
            state_ids.push(event_id.clone());
            events.insert(event_id, event);
        }
        for event in auth_events {
            let event_id = check_event(&room_id, &event)?;
            events.entry(event_id).or_insert(event);
        }

        Ok(Self { room_id, room_version, state: state_ids, events })
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn room_version(&self) -> &RoomVersion {
        &self.room_version
    }

    /// Current state, headered with the room version.
    pub fn current_state(&self) -> Vec<HeaderedEvent> {
        self.state
            .iter()
            .filter_map(|id| self.events.get(id))
            .map(|e| HeaderedEvent::new(self.room_version.clone(), e.clone()))
            .collect()
    }

    /// Transitive closure of `auth_events` starting from the current state,
    /// ordered by depth then event ID.
    ///
    /// References to events the room does not hold are skipped.
    pub fn auth_chain(&self) -> Vec<HeaderedEvent> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = self
            .state
            .iter()
            .filter_map(|id| self.events.get(id))
            .flat_map(|e| e.auth_events.iter().map(String::as_str))
            .collect();

        let mut chain: Vec<&Pdu> = Vec::new();
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            match self.events.get(id) {
                Some(event) => {
                    chain.push(event);
                    queue.extend(event.auth_events.iter().map(String::as_str));
                }
                None => debug!("Auth event {} of room {} is not held locally", id, self.room_id),
            }
        }

        chain.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.event_id.cmp(&b.event_id)));
        chain
            .into_iter()
            .map(|e| HeaderedEvent::new(self.room_version.clone(), e.clone()))
            .collect()
    }
}

fn check_event(room_id: &str, event: &Pdu) -> Result<String, RoomServerError> {
    let event_id = event
        .event_id
        .clone()
        .ok_or_else(|| RoomServerError::MissingEventId(room_id.to_owned()))?;
    if event.room_id != room_id {
        return Err(RoomServerError::WrongRoom {
            event_id,
            expected: room_id.to_owned(),
            actual: event.room_id.clone(),
        });
    }
    Ok(event_id)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    pub(crate) const ROOM: &str = "!abc:example.org";

    pub(crate) fn pdu(id: &str, event_type: &str, depth: i64, auth: &[&str]) -> Pdu {
        Pdu {
            event_id: Some(id.to_owned()),
            room_id: ROOM.into(),
            sender: "@alice:example.org".into(),
            event_type: event_type.into(),
            state_key: Some(String::new()),
            content: json!({}),
            origin_server_ts: 1_600_000_000_000 + depth,
            depth,
            prev_events: vec![],
            auth_events: auth.iter().map(|a| (*a).to_owned()).collect(),
            hashes: BTreeMap::new(),
            signatures: BTreeMap::new(),
            unsigned: None,
        }
    }

    /// create ← member ← power_levels ← join_rules, plus a topic in state.
    pub(crate) fn sample_room() -> Room {
        let create = pdu("$create", "m.room.create", 1, &[]);
        let member = pdu("$member", "m.room.member", 2, &["$create"]);
        let power = pdu("$power", "m.room.power_levels", 3, &["$create", "$member"]);
        let join_rules = pdu("$join_rules", "m.room.join_rules", 4, &["$create", "$member", "$power"]);
        let topic = pdu("$topic", "m.room.topic", 5, &["$create", "$power"]);
        let old_power = pdu("$old_power", "m.room.power_levels", 2, &["$create"]);

        Room::new(
            ROOM,
            RoomVersion::from("9"),
            vec![create, member, power, join_rules, topic],
            vec![old_power],
        )
        .unwrap()
    }

    fn ids(events: &[HeaderedEvent]) -> Vec<&str> {
        events.iter().filter_map(|e| e.event.event_id.as_deref()).collect()
    }

    #[test]
    fn state_keeps_seed_order() {
        let room = sample_room();
        assert_eq!(
            ids(&room.current_state()),
            ["$create", "$member", "$power", "$join_rules", "$topic"]
        );
        assert!(room.current_state().iter().all(|e| e.room_version.as_str() == "9"));
    }

    #[test]
    fn auth_chain_is_closure_ordered_by_depth() {
        let room = sample_room();
        // $old_power is never referenced by current state.
        assert_eq!(ids(&room.auth_chain()), ["$create", "$member", "$power"]);
    }

    #[test]
    fn auth_chain_skips_missing_events() {
        let room = Room::new(
            ROOM,
            RoomVersion::from("9"),
            vec![pdu("$member", "m.room.member", 2, &["$gone", "$create"]), pdu("$create", "m.room.create", 1, &[])],
            vec![],
        )
        .unwrap();
        assert_eq!(ids(&room.auth_chain()), ["$create"]);
    }

    #[test]
    fn rejects_malformed_events() {
        let mut no_id = pdu("$x", "m.room.create", 1, &[]);
        no_id.event_id = None;
        assert!(matches!(
            Room::new(ROOM, "9".into(), vec![no_id], vec![]),
            Err(RoomServerError::MissingEventId(_))
        ));

        let mut message = pdu("$msg", "m.room.message", 1, &[]);
        message.state_key = None;
        assert!(matches!(
            Room::new(ROOM, "9".into(), vec![message], vec![]),
            Err(RoomServerError::NotAStateEvent(id)) if id == "$msg"
        ));

        let mut elsewhere = pdu("$e", "m.room.create", 1, &[]);
        elsewhere.room_id = "!other:example.org".into();
        assert!(matches!(
            Room::new(ROOM, "9".into(), vec![], vec![elsewhere]),
            Err(RoomServerError::WrongRoom { .. })
        ));
    }
}
