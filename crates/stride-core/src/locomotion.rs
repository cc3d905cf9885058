//! Locomotion: the deterministic movement step
//!
//! One step of a walking, jumping body:
//!
//! 1. A grounded jump sets vertical velocity to the launch speed for the
//!    configured apex height.
//! 2. Gravity accumulates into vertical velocity.
//! 3. Horizontal velocity approaches `direction * move_speed` through a
//!    critically-damped spring, with a tight smoothing time on the ground and
//!    a loose one in the air.
//! 4. The resolver turns `velocity * dt` into an actual position.
//! 5. Vertical velocity is cancelled on landing or on hitting a ceiling while
//!    rising.
//!
//! Given the same state, intent, `dt` and a deterministic resolver, `step`
//! returns bit-identical results. Replay during reconciliation depends on it.

use crate::error::{Error, Result};
use crate::input::{InputSample, MoveIntent};
use crate::math::{smooth_damp, Vec3};
use crate::resolver::MovementResolver;
use serde::{Deserialize, Serialize};

/// Movement tuning shared by every node simulating an entity
///
/// Client and server must agree on these values or replay diverges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionTuning {
    /// Target horizontal speed at full deflection (units/s)
    pub move_speed: f32,
    /// Horizontal smoothing time while grounded (s)
    pub move_smooth_time: f32,
    /// Horizontal smoothing time while airborne (s)
    pub air_smooth_time: f32,
    /// Jump apex height (units)
    pub jump_height: f32,
    /// Vertical acceleration, negative is down (units/s²)
    pub gravity: f32,
}

impl Default for LocomotionTuning {
    fn default() -> Self {
        Self {
            move_speed: 3.5,
            move_smooth_time: 0.025,
            air_smooth_time: 0.25,
            jump_height: 1.3,
            gravity: -9.81,
        }
    }
}

impl LocomotionTuning {
    /// Check that every parameter is physically meaningful
    pub fn validate(&self) -> Result<()> {
        positive("move_speed", self.move_speed)?;
        positive("move_smooth_time", self.move_smooth_time)?;
        positive("air_smooth_time", self.air_smooth_time)?;
        if self.jump_height.is_nan() || self.jump_height < 0.0 {
            return Err(Error::InvalidTuning {
                field: "jump_height",
                requirement: "non-negative",
                value: self.jump_height,
            });
        }
        if self.gravity.is_nan() || self.gravity >= 0.0 {
            return Err(Error::InvalidTuning {
                field: "gravity",
                requirement: "negative",
                value: self.gravity,
            });
        }
        Ok(())
    }

    /// Vertical speed that reaches exactly `jump_height` under `gravity`
    pub fn launch_velocity(&self) -> f32 {
        (-2.0 * self.jump_height * self.gravity).sqrt()
    }
}

fn positive(field: &'static str, value: f32) -> Result<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidTuning {
            field,
            requirement: "positive",
            value,
        })
    }
}

/// Kinematic state of one simulated body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Grounded flag reported by the resolver on the last step
    pub grounded: bool,
    /// Internal rate of the horizontal smoothing spring
    pub smoothing_rate: Vec3,
    /// Last non-zero movement heading, degrees clockwise from +Z
    pub heading_degrees: f32,
}

impl SimulationState {
    /// A body at rest at `position`
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

impl Default for SimulationState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            grounded: false,
            smoothing_rate: Vec3::ZERO,
            heading_degrees: -180.0,
        }
    }
}

/// Four-way facing relative to the camera, used to pick sprite sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    /// Toward the camera
    #[default]
    Down,
    /// Away from the camera
    Up,
    Left,
    Right,
}

impl Facing {
    /// Classify a heading relative to a camera yaw. `None` when the angle is
    /// not a number.
    pub fn from_relative_heading(heading_degrees: f32, camera_yaw_degrees: f32) -> Option<Facing> {
        let relative = ((heading_degrees - camera_yaw_degrees + 180.0).rem_euclid(360.0) - 180.0).round();

        if relative <= -135.0 || relative >= 135.0 {
            Some(Facing::Down)
        } else if (-45.0..=45.0).contains(&relative) {
            Some(Facing::Up)
        } else if relative < -45.0 && relative > -135.0 {
            Some(Facing::Left)
        } else if relative > 45.0 && relative < 135.0 {
            Some(Facing::Right)
        } else {
            None
        }
    }

    /// Whether a side-facing sprite should be mirrored
    pub fn is_mirrored(self) -> bool {
        self == Facing::Left
    }
}

/// Movement capability of a simulated entity
pub trait Locomotion {
    /// Advance `state` by one fixed step
    fn step(
        &self,
        state: &SimulationState,
        intent: MoveIntent,
        dt: f32,
        resolver: &mut dyn MovementResolver,
    ) -> SimulationState;

    /// Facing hook for presentation; `previous` is kept when the heading
    /// cannot be classified.
    fn facing(&self, state: &SimulationState, camera_yaw_degrees: f32, previous: Facing) -> Facing {
        Facing::from_relative_heading(state.heading_degrees, camera_yaw_degrees).unwrap_or(previous)
    }

    /// Step `state` in place with a sampled input
    fn apply(
        &self,
        state: &mut SimulationState,
        sample: &InputSample,
        dt: f32,
        resolver: &mut dyn MovementResolver,
    ) {
        *state = self.step(state, sample.intent(), dt, resolver);
    }
}

/// The walking/jumping movement model
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementSimulator {
    tuning: LocomotionTuning,
}

impl MovementSimulator {
    /// Create a simulator, rejecting invalid tuning
    pub fn new(tuning: LocomotionTuning) -> Result<Self> {
        tuning.validate()?;
        Ok(Self { tuning })
    }

    pub fn tuning(&self) -> &LocomotionTuning {
        &self.tuning
    }
}

impl Locomotion for MovementSimulator {
    fn step(
        &self,
        state: &SimulationState,
        intent: MoveIntent,
        dt: f32,
        resolver: &mut dyn MovementResolver,
    ) -> SimulationState {
        let tuning = &self.tuning;
        let mut next = *state;
        let direction = intent.direction.clamp_magnitude(1.0);

        if intent.jump && state.grounded {
            next.velocity.y = tuning.launch_velocity();
        }

        next.velocity.y += tuning.gravity * dt;

        let smooth_time = if state.grounded {
            tuning.move_smooth_time
        } else {
            tuning.air_smooth_time
        };
        let horizontal = smooth_damp(
            next.velocity.only_xz(),
            direction.only_xz() * tuning.move_speed,
            &mut next.smoothing_rate,
            smooth_time,
            dt,
        );
        next.velocity = horizontal.with_y(next.velocity.y);

        let resolution = resolver.resolve(state.position, next.velocity * dt);
        next.position = resolution.position;
        next.grounded = resolution.grounded;

        if resolution.grounded || (next.velocity.y > 0.0 && resolution.collided_above) {
            next.velocity.y = 0.0;
        }

        if !direction.is_zero() {
            next.heading_degrees = direction.heading_degrees().round();
        }

        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::FacingQuadrant;
    use crate::resolver::{FreeSpace, GroundPlane};

    const DT: f32 = 0.02;

    fn simulator() -> MovementSimulator {
        MovementSimulator::new(LocomotionTuning::default()).unwrap()
    }

    fn forward() -> MoveIntent {
        MoveIntent {
            direction: Vec3::FORWARD,
            jump: false,
        }
    }

    #[test]
    fn test_jump_launch_velocity() {
        let tuning = LocomotionTuning::default();
        let launch = tuning.launch_velocity();
        assert!((launch - (2.0f32 * 1.3 * 9.81).sqrt()).abs() < 1e-5);
        assert!((launch - 5.05).abs() < 0.01);

        let sim = simulator();
        let mut state = SimulationState::at(Vec3::ZERO);
        state.grounded = true;

        let intent = MoveIntent {
            direction: Vec3::ZERO,
            jump: true,
        };
        let next = sim.step(&state, intent, DT, &mut FreeSpace);

        assert_eq!(next.velocity.y, launch + tuning.gravity * DT);
        assert!(next.position.y > 0.0);
        assert!(!next.grounded);
    }

    #[test]
    fn test_jump_ignored_when_airborne() {
        let sim = simulator();
        let state = SimulationState::at(Vec3::new(0.0, 2.0, 0.0));

        let intent = MoveIntent {
            direction: Vec3::ZERO,
            jump: true,
        };
        let next = sim.step(&state, intent, DT, &mut FreeSpace);

        assert_eq!(next.velocity.y, -9.81 * DT);
    }

    #[test]
    fn test_gravity_accumulates() {
        let sim = simulator();
        let mut state = SimulationState::at(Vec3::new(0.0, 100.0, 0.0));

        for _ in 0..10 {
            state = sim.step(&state, MoveIntent::idle(), DT, &mut FreeSpace);
        }

        assert!((state.velocity.y - (-9.81 * DT * 10.0)).abs() < 1e-4);
        assert!(state.position.y < 100.0);
    }

    #[test]
    fn test_landing_zeroes_vertical_velocity() {
        let sim = simulator();
        let mut state = SimulationState::at(Vec3::new(0.0, 0.01, 0.0));
        state.velocity.y = -3.0;

        let next = sim.step(&state, MoveIntent::idle(), DT, &mut GroundPlane::default());

        assert!(next.grounded);
        assert_eq!(next.velocity.y, 0.0);
        assert_eq!(next.position.y, 0.0);
    }

    #[test]
    fn test_ceiling_stops_rise() {
        let sim = simulator();
        let mut room = GroundPlane::new(0.0).with_ceiling(1.0);
        let mut state = SimulationState::at(Vec3::new(0.0, 0.95, 0.0));
        state.velocity.y = 5.0;

        let next = sim.step(&state, MoveIntent::idle(), DT, &mut room);

        assert_eq!(next.velocity.y, 0.0);
        assert_eq!(next.position.y, 1.0);
    }

    #[test]
    fn test_ground_smoothing_is_tighter_than_air() {
        let sim = simulator();

        let mut on_ground = SimulationState::at(Vec3::ZERO);
        on_ground.grounded = true;
        let ground_next = sim.step(&on_ground, forward(), DT, &mut GroundPlane::default());

        let in_air = SimulationState::at(Vec3::new(0.0, 5.0, 0.0));
        let air_next = sim.step(&in_air, forward(), DT, &mut FreeSpace);

        assert!(ground_next.velocity.z > air_next.velocity.z);
        assert!(ground_next.velocity.z <= 3.5);
    }

    #[test]
    fn test_walk_reaches_move_speed() {
        let sim = simulator();
        let mut ground = GroundPlane::default();
        let mut state = SimulationState::at(Vec3::ZERO);
        state.grounded = true;

        for _ in 0..50 {
            state = sim.step(&state, forward(), DT, &mut ground);
        }

        assert!((state.velocity.z - 3.5).abs() < 1e-3);
        assert!(state.grounded);
        assert_eq!(state.heading_degrees, 0.0);
    }

    #[test]
    fn test_replay_is_bit_identical() {
        let sim = simulator();
        let samples: Vec<InputSample> = (1..=120)
            .map(|seq| {
                let h = if seq % 40 < 20 { 1.0 } else { -0.5 };
                InputSample::new(seq, h, 1.0, seq % 30 == 0, FacingQuadrant::from_side((seq / 25) as i8))
            })
            .collect();

        let run = || {
            let mut ground = GroundPlane::default();
            let mut state = SimulationState::at(Vec3::new(1.0, 0.0, -2.0));
            for sample in &samples {
                sim.apply(&mut state, sample, DT, &mut ground);
            }
            state
        };

        let first = run();
        let second = run();
        assert_eq!(first.position.x.to_bits(), second.position.x.to_bits());
        assert_eq!(first.position.y.to_bits(), second.position.y.to_bits());
        assert_eq!(first.position.z.to_bits(), second.position.z.to_bits());
        assert_eq!(first, second);
    }

    #[test]
    fn test_facing_sectors() {
        assert_eq!(Facing::from_relative_heading(0.0, 0.0), Some(Facing::Up));
        assert_eq!(Facing::from_relative_heading(180.0, 0.0), Some(Facing::Down));
        assert_eq!(Facing::from_relative_heading(90.0, 0.0), Some(Facing::Right));
        assert_eq!(Facing::from_relative_heading(-90.0, 0.0), Some(Facing::Left));
        assert_eq!(Facing::from_relative_heading(90.0, 90.0), Some(Facing::Up));
        assert_eq!(Facing::from_relative_heading(90.0, 270.0), Some(Facing::Down));
        assert_eq!(Facing::from_relative_heading(f32::NAN, 0.0), None);
    }

    #[test]
    fn test_only_left_is_mirrored() {
        assert!(Facing::Left.is_mirrored());
        assert!(!Facing::Right.is_mirrored());
        assert!(!Facing::Up.is_mirrored());
        assert!(!Facing::Down.is_mirrored());
    }

    #[test]
    fn test_facing_hook_keeps_previous() {
        let sim = simulator();
        let mut state = SimulationState::default();
        state.heading_degrees = f32::NAN;
        assert_eq!(sim.facing(&state, 0.0, Facing::Left), Facing::Left);

        state.heading_degrees = 90.0;
        assert_eq!(sim.facing(&state, 0.0, Facing::Left), Facing::Right);
    }

    #[test]
    fn test_tuning_validation() {
        assert!(LocomotionTuning::default().validate().is_ok());

        let bad_gravity = LocomotionTuning {
            gravity: 9.81,
            ..LocomotionTuning::default()
        };
        assert!(matches!(
            MovementSimulator::new(bad_gravity),
            Err(Error::InvalidTuning { field: "gravity", .. })
        ));

        let bad_smoothing = LocomotionTuning {
            air_smooth_time: 0.0,
            ..LocomotionTuning::default()
        };
        assert!(bad_smoothing.validate().is_err());
    }

    #[test]
    fn test_tuning_from_partial_ron() {
        let tuning: LocomotionTuning = ron::from_str("(move_speed: 5.0)").unwrap();
        assert_eq!(tuning.move_speed, 5.0);
        assert_eq!(tuning.jump_height, 1.3);
    }
}
