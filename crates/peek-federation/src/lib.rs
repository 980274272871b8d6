//! # peek-federation
//!
//! Server-side handling of the federation `/peek` request.
//!
//! ## Flow
//!
//! ```text
//!  remote server            VersionGate            PeekAdmission
//!       │                        │                       │
//!       ├── PUT /peek ─────────► │                       │
//!       │                        ├─ query_room_version   │
//!       │                        │  (V ∈ ver?)           │
//!       │                        ├──── admit_or_renew ──►│
//!       │ ◄────── PeekOutcome ───┴───────────────────────┘
//! ```
//!
//! ## Key concepts
//!
//! - **Version gate** (`version_gate.rs`): resolves the room's version and
//!   refuses to go further unless the remote listed it in `?ver=`.
//! - **Admission** (`admission.rs`): the contract for the room server's
//!   remote-peek manager, which creates or renews the peek grant and returns
//!   the state snapshot.
//! - **Peek service** (`peek.rs`): runs gate then admission and assembles the
//!   [`PeekOutcome`] returned to the remote server.

pub mod admission;
pub mod error;
pub mod peek;
pub mod types;
pub mod version_gate;

pub use admission::PeekAdmission;
pub use error::FederationError;
pub use peek::{PeekOutcome, PeekService};
pub use types::{HeaderedEvent, Pdu, PeekRequest, PeekResponse, PeekResult, RoomVersion};
pub use version_gate::{GateDecision, RoomVersionSource, VersionGate};
