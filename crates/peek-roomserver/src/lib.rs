//! # peek-roomserver
//!
//! In-memory room server backing the federation peek endpoint.
//!
//! It answers the two questions the peek handler asks:
//!
//! - **What version is this room?** ([`RoomVersionSource`])
//! - **Let this server peek / keep peeking** ([`PeekAdmission`]): records or
//!   refreshes the grant and returns current state plus its auth chain.
//!
//! Rooms are loaded at start-up from a JSON seed file (`seed.rs`). Peek
//! grants live in memory and every new or renewed grant is announced on a
//! broadcast channel.
//!
//! [`RoomVersionSource`]: peek_federation::RoomVersionSource
//! [`PeekAdmission`]: peek_federation::PeekAdmission

pub mod error;
pub mod peeks;
pub mod room;
pub mod seed;
pub mod server;

pub use error::RoomServerError;
pub use peeks::{InboundPeek, PeekGrant, RemotePeek};
pub use room::Room;
pub use server::RoomServer;
