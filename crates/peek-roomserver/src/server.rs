//! The in-memory room server.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use peek_common::MatrixError;
use peek_federation::{
    FederationError, PeekAdmission, PeekRequest, PeekResult, RoomVersion, RoomVersionSource,
};
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info};

use crate::{
    error::RoomServerError,
    peeks::{InboundPeek, PeekGrant, PeekKey, RemotePeek},
    room::Room,
    seed::RoomSeed,
};

/// Capacity of the inbound-peek broadcast channel.
const PEEK_CHANNEL_CAPACITY: usize = 1_024;

/// Rooms and remote peek grants, shared behind `Arc`.
///
/// Thread-safe; clone to share between the HTTP layer and anything
/// subscribed to inbound peeks.
///
/// Grants are never swept. A peek that arrives after its grant expired
/// replaces it, but abandoned grants stay in the table until the process
/// exits.
#[derive(Clone)]
pub struct RoomServer {
    inner: Arc<Inner>,
}

struct Inner {
    supported_versions: Vec<RoomVersion>,
    peek_renewal_interval_ms: u64,
    rooms: RwLock<HashMap<String, Room>>,
    peeks: RwLock<HashMap<PeekKey, RemotePeek>>,
    peek_tx: broadcast::Sender<InboundPeek>,
}

impl RoomServer {
    /// `supported_versions` bounds which rooms may be loaded;
    /// `peek_renewal_interval_ms` is how long a grant stays live after its
    /// last renewal.
    pub fn new(supported_versions: Vec<RoomVersion>, peek_renewal_interval_ms: u64) -> Self {
        let (peek_tx, _) = broadcast::channel(PEEK_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                supported_versions,
                peek_renewal_interval_ms,
                rooms: RwLock::new(HashMap::new()),
                peeks: RwLock::new(HashMap::new()),
                peek_tx,
            }),
        }
    }

    // ── Rooms ────────────────────────────────────────────────────────────────

    /// Add a room. Fails if its version is not supported locally or a room
    /// with the same ID is already loaded.
    pub async fn insert_room(&self, room: Room) -> Result<(), RoomServerError> {
        if !self.inner.supported_versions.contains(room.room_version()) {
            return Err(RoomServerError::UnsupportedRoomVersion {
                room_id: room.room_id().to_owned(),
                room_version: room.room_version().to_string(),
            });
        }

        let mut rooms = self.inner.rooms.write().await;
        if rooms.contains_key(room.room_id()) {
            return Err(RoomServerError::DuplicateRoom(room.room_id().to_owned()));
        }
        debug!("Loaded room {} (v{})", room.room_id(), room.room_version());
        rooms.insert(room.room_id().to_owned(), room);
        Ok(())
    }

    /// Load every room in `seeds`, stopping at the first invalid one.
    pub async fn load_seeds(&self, seeds: Vec<RoomSeed>) -> Result<usize, RoomServerError> {
        let count = seeds.len();
        for seed in seeds {
            self.insert_room(seed.into_room()?).await?;
        }
        info!("Room server loaded {} room(s)", count);
        Ok(count)
    }

    pub async fn room_count(&self) -> usize {
        self.inner.rooms.read().await.len()
    }

    // ── Peeks ────────────────────────────────────────────────────────────────

    /// Subscribe to new and renewed peeks.
    pub fn subscribe(&self) -> broadcast::Receiver<InboundPeek> {
        self.inner.peek_tx.subscribe()
    }

    pub async fn remote_peek(
        &self,
        room_id: &str,
        server_name: &str,
        peek_id: &str,
    ) -> Option<RemotePeek> {
        let key = (room_id.to_owned(), server_name.to_owned(), peek_id.to_owned());
        self.inner.peeks.read().await.get(&key).cloned()
    }

    /// All grants on `room_id`, live or not.
    pub async fn remote_peeks_in_room(&self, room_id: &str) -> Vec<RemotePeek> {
        self.inner
            .peeks
            .read()
            .await
            .values()
            .filter(|p| p.room_id == room_id)
            .cloned()
            .collect()
    }

    /// Record a peek, refreshing `renewed_ts` on a live grant. A missing or
    /// expired grant is replaced by a new one.
    async fn store_remote_peek(&self, request: &PeekRequest, now: DateTime<Utc>) -> InboundPeek {
        let fresh = RemotePeek::new(
            &request.room_id,
            &request.server_name,
            &request.peek_id,
            now,
            self.inner.peek_renewal_interval_ms,
        );

        let mut peeks = self.inner.peeks.write().await;
        match peeks.get_mut(&fresh.key()) {
            Some(existing) if existing.is_live_at(now) => {
                existing.renewed_ts = now;
                existing.renewal_interval_ms = self.inner.peek_renewal_interval_ms;
                InboundPeek { grant: PeekGrant::Renewed, peek: existing.clone() }
            }
            _ => {
                peeks.insert(fresh.key(), fresh.clone());
                InboundPeek { grant: PeekGrant::Created, peek: fresh }
            }
        }
    }
}

#[async_trait]
impl RoomVersionSource for RoomServer {
    async fn query_room_version(&self, room_id: &str) -> Result<RoomVersion, FederationError> {
        self.inner
            .rooms
            .read()
            .await
            .get(room_id)
            .map(|room| room.room_version().clone())
            .ok_or_else(|| FederationError::UnknownRoom(room_id.to_owned()))
    }
}

#[async_trait]
impl PeekAdmission for RoomServer {
    async fn admit_or_renew(&self, request: &PeekRequest) -> Result<PeekResult, MatrixError> {
        // Snapshot first so the grant is only stored for rooms we hold.
        let snapshot = {
            let rooms = self.inner.rooms.read().await;
            rooms.get(&request.room_id).map(|room| {
                (room.room_version().clone(), room.current_state(), room.auth_chain())
            })
        };

        let Some((room_version, state_events, auth_chain_events)) = snapshot else {
            debug!("Peek request for unknown room {}", request.room_id);
            return Ok(PeekResult::room_not_found());
        };

        let inbound = self.store_remote_peek(request, Utc::now()).await;
        info!(
            "Remote peek {} on {} by {}: {:?}",
            request.peek_id, request.room_id, request.server_name, inbound.grant
        );
        // No subscribers is fine.
        let _ = self.inner.peek_tx.send(inbound);

        Ok(PeekResult { room_exists: true, room_version, state_events, auth_chain_events })
    }
}
