//! Stride Netcode - Client prediction and server reconciliation
//!
//! This crate keeps a client's locally controlled entity responsive while the
//! server stays authoritative:
//!
//! - **Input Sequencing**: Stamp, predict and buffer each tick of input
//! - **Authority**: Apply each input exactly once on the server
//! - **Reconciliation**: Rewind to the server's position and replay
//! - **Replication**: Re-deliver the latest snapshot, last write wins
//! - **Transport**: Unreliable datagrams, lossy in-memory link for tests
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────── Client ─────────────────────────────┐
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────┐    │
//! │  │ InputSource  │─▶│  Sequencer   │─▶│ InputBuffer (≤ 50)   │    │
//! │  └──────────────┘  └──────┬───────┘  └──────────┬───────────┘    │
//! │                           │ predict             │ batch          │
//! │                    ┌──────▼───────┐             │                │
//! │                    │  Simulator   │◀─┐ replay   │                │
//! │                    └──────────────┘  │          │                │
//! │                    ┌──────────────┐  │          │                │
//! │                    │  Reconciler  │──┘          │                │
//! │                    └──────▲───────┘             │                │
//! └───────────────────────────┼─────────────────────┼────────────────┘
//!                  (seq, pos) │                     │ inputs
//! ┌───────────────────────────┼───── Server ────────▼────────────────┐
//! │                    ┌──────┴────────────────────────────────┐     │
//! │                    │ AuthoritativeProcessor (skip seq ≤ n) │     │
//! │                    └───────────────────────────────────────┘     │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use stride_core::{FacingQuadrant, GroundPlane, InputSource, Vec3};
//! use stride_netcode::{Role, Session, StrideConfig};
//!
//! struct Forward;
//!
//! impl InputSource for Forward {
//!     fn sample_raw_axes(&mut self) -> (f32, f32) {
//!         (0.0, 1.0)
//!     }
//!
//!     fn sample_jump(&mut self) -> bool {
//!         false
//!     }
//! }
//!
//! let mut client = Session::new(StrideConfig::default()).unwrap();
//! let mut server = Session::new(StrideConfig::default()).unwrap();
//! client.spawn(1, Role::Predicted, Vec3::ZERO).unwrap();
//! server.spawn(1, Role::Authority, Vec3::ZERO).unwrap();
//! let mut ground = GroundPlane::default();
//!
//! for packet in client.fixed_update(&mut Forward, FacingQuadrant::default(), &mut ground) {
//!     if let Some(reply) = server.dispatch(packet, &mut ground).unwrap() {
//!         client.dispatch(reply, &mut ground).unwrap();
//!     }
//! }
//!
//! let client_pos = client.entity(1).unwrap().position();
//! assert_eq!(server.entity(1).unwrap().position(), client_pos);
//! ```

mod authority;
mod config;
mod entity;
mod error;
mod input_buffer;
mod link;
mod reconciliation;
mod sequencer;
mod session;
mod step;
mod transport;
mod wire;

pub use authority::AuthoritativeProcessor;
pub use config::{
    NetcodeConfig, StrideConfig, DEFAULT_CORRECTION_THRESHOLD, DEFAULT_INPUT_BUFFER_CAPACITY,
    DEFAULT_SEND_INTERVAL_SECS,
};
pub use entity::{NetworkedControl, NetworkedEntity, Role};
pub use error::{Error, Result};
pub use input_buffer::InputBuffer;
pub use link::{LinkConditions, LinkEnd, LinkError, LinkStats, LossyLink};
pub use reconciliation::{
    AxisCorrection, AxisDivergence, Correction, CorrectionBasis, CorrectionPolicy,
    ReconcileOutcome, ReconcilePhase, Reconciler,
};
pub use sequencer::{InputSequencer, SequencedTick};
pub use session::Session;
pub use step::StepContext;
pub use transport::Transport;
pub use wire::{AuthoritativeSnapshot, EntityId, Packet};
