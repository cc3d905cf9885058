//! Per-tick input samples and the input-source seam
//!
//! Axes are quantized to 8-bit fixed point when a sample is built, not when it
//! is sent. The predicting client and the authoritative server therefore step
//! the simulator with exactly the same values.

use crate::math::Vec3;
use crate::time::Sequence;
use serde::{Deserialize, Serialize};

/// Fixed-point scale for a full axis deflection
pub const AXIS_SCALE: f32 = 127.0;

/// Camera-relative rotation in quarter turns, always in `0..=3`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i8", into = "i8")]
pub struct FacingQuadrant(u8);

impl FacingQuadrant {
    /// Build from a camera side counter that may have been stepped past
    /// either end; wraps modulo 4.
    pub fn from_side(side: i8) -> Self {
        Self(side.rem_euclid(4) as u8)
    }

    /// Quarter turns in `0..=3`
    pub fn get(self) -> u8 {
        self.0
    }

    /// Rotate one quarter turn counter-clockwise
    pub fn turned_left(self) -> Self {
        Self((self.0 + 3) % 4)
    }

    /// Rotate one quarter turn clockwise
    pub fn turned_right(self) -> Self {
        Self((self.0 + 1) % 4)
    }

    /// Camera yaw for this quadrant in degrees
    pub fn yaw_degrees(self) -> f32 {
        f32::from(self.0) * 90.0
    }
}

impl From<i8> for FacingQuadrant {
    fn from(side: i8) -> Self {
        Self::from_side(side)
    }
}

impl From<FacingQuadrant> for i8 {
    fn from(q: FacingQuadrant) -> Self {
        q.0 as i8
    }
}

/// Convert a raw axis value to fixed point, clamping to `[-1, 1]`
pub fn quantize_axis(value: f32) -> i8 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(-1.0, 1.0) * AXIS_SCALE).round() as i8
}

/// Convert a fixed-point axis back to `[-1, 1]`
pub fn dequantize_axis(value: i8) -> f32 {
    f32::from(value.max(-127)) / AXIS_SCALE
}

/// One tick of local input, tagged with its sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSample {
    pub sequence: Sequence,
    horizontal: i8,
    vertical: i8,
    pub jump_pressed: bool,
    pub facing: FacingQuadrant,
}

impl InputSample {
    /// Build a sample from raw axis values
    pub fn new(
        sequence: Sequence,
        horizontal: f32,
        vertical: f32,
        jump_pressed: bool,
        facing: FacingQuadrant,
    ) -> Self {
        Self {
            sequence,
            horizontal: quantize_axis(horizontal),
            vertical: quantize_axis(vertical),
            jump_pressed,
            facing,
        }
    }

    pub fn horizontal_axis(&self) -> f32 {
        dequantize_axis(self.horizontal)
    }

    pub fn vertical_axis(&self) -> f32 {
        dequantize_axis(self.vertical)
    }

    /// Resolve this sample into a world-space movement intent.
    ///
    /// The axes are rotated by the sample's camera quadrant and clamped to
    /// unit length so diagonal input is not faster.
    pub fn intent(&self) -> MoveIntent {
        let local = Vec3::new(self.horizontal_axis(), 0.0, self.vertical_axis());
        MoveIntent {
            direction: local.rotate_quadrant(self.facing.get()).clamp_magnitude(1.0),
            jump: self.jump_pressed,
        }
    }
}

/// What the simulator is asked to do for one step
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MoveIntent {
    /// Desired horizontal direction, magnitude <= 1
    pub direction: Vec3,
    pub jump: bool,
}

impl MoveIntent {
    /// An intent with no movement and no jump
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Host-provided input device, polled once per fixed tick on the local player
pub trait InputSource {
    /// Raw horizontal and vertical axes in `[-1, 1]`
    fn sample_raw_axes(&mut self) -> (f32, f32);

    /// Whether jump is held this tick
    fn sample_jump(&mut self) -> bool;
}
