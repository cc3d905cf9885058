//! Stride Core - Deterministic locomotion for networked movement
//!
//! This crate holds everything a node needs to simulate a player-controlled
//! body, with no networking knowledge:
//! - Vector math and the critically-damped smoothing spring (`Vec3`)
//! - Fixed-timestep clock and send scheduling (`FixedClock`, `SendSchedule`)
//! - Sequenced input samples with camera-relative intent (`InputSample`)
//! - The collision-resolution seam (`MovementResolver`)
//! - The movement step itself (`Locomotion`, `MovementSimulator`)
//!
//! The host environment supplies input devices, physics and rendering. The
//! core only consumes their results through the traits above.
//!
//! # Example
//!
//! ```
//! use stride_core::{
//!     FacingQuadrant, GroundPlane, InputSample, Locomotion, LocomotionTuning,
//!     MovementSimulator, SimulationState, Vec3,
//! };
//!
//! let simulator = MovementSimulator::new(LocomotionTuning::default()).unwrap();
//! let mut ground = GroundPlane::default();
//! let mut state = SimulationState::at(Vec3::ZERO);
//!
//! let sample = InputSample::new(1, 0.0, 1.0, false, FacingQuadrant::default());
//! simulator.apply(&mut state, &sample, 0.02, &mut ground);
//! assert!(state.position.z > 0.0);
//! ```

mod error;
pub mod input;
pub mod locomotion;
pub mod math;
pub mod resolver;
pub mod time;

pub use error::{Error, Result};
pub use input::{FacingQuadrant, InputSample, InputSource, MoveIntent};
pub use locomotion::{Facing, Locomotion, LocomotionTuning, MovementSimulator, SimulationState};
pub use math::Vec3;
pub use resolver::{FreeSpace, GroundPlane, MovementResolver, Resolution};
pub use time::{FixedClock, SendSchedule, Sequence, Tick};
