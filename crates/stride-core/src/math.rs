//! Minimal vector math for the locomotion step
//!
//! Only the operations the simulator needs. Everything here is plain `f32`
//! arithmetic with no platform intrinsics, so identical inputs produce
//! bit-identical outputs on a given target.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Squared-magnitude tolerance below which a vector counts as zero
pub const ZERO_TOLERANCE_SQ: f32 = 9.999_999_4e-11;

/// Lower bound applied to smoothing times to avoid dividing by zero
const MIN_SMOOTH_TIME: f32 = 0.0001;

/// A 3D vector. `y` is up; the horizontal plane is XZ.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const FORWARD: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    /// Create a new vector
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn sqr_magnitude(self) -> f32 {
        self.dot(self)
    }

    pub fn magnitude(self) -> f32 {
        self.sqr_magnitude().sqrt()
    }

    /// Whether the vector is zero within [`ZERO_TOLERANCE_SQ`]
    pub fn is_zero(self) -> bool {
        self.sqr_magnitude() < ZERO_TOLERANCE_SQ
    }

    /// Copy with the vertical component removed
    pub fn only_xz(self) -> Vec3 {
        Vec3::new(self.x, 0.0, self.z)
    }

    /// Copy with only the vertical component kept
    pub fn only_y(self) -> Vec3 {
        Vec3::new(0.0, self.y, 0.0)
    }

    /// Copy with the vertical component replaced
    pub fn with_y(self, y: f32) -> Vec3 {
        Vec3::new(self.x, y, self.z)
    }

    /// Distance between two points on the horizontal plane
    pub fn horizontal_distance(self, other: Vec3) -> f32 {
        (self - other).only_xz().magnitude()
    }

    /// Absolute distance between two points along the vertical axis
    pub fn vertical_distance(self, other: Vec3) -> f32 {
        (self.y - other.y).abs()
    }

    /// Scale down to `max` magnitude if longer; shorter vectors are unchanged
    pub fn clamp_magnitude(self, max: f32) -> Vec3 {
        let sq = self.sqr_magnitude();
        if sq > max * max {
            self * (max / sq.sqrt())
        } else {
            self
        }
    }

    /// Rotate about the vertical axis by `quadrant` quarter turns (clockwise
    /// seen from above, so forward turns toward +X).
    ///
    /// Quarter turns are exact component swaps, which keeps camera-relative
    /// input free of trigonometric rounding.
    pub fn rotate_quadrant(self, quadrant: u8) -> Vec3 {
        match quadrant % 4 {
            0 => self,
            1 => Vec3::new(self.z, self.y, -self.x),
            2 => Vec3::new(-self.x, self.y, -self.z),
            _ => Vec3::new(-self.z, self.y, self.x),
        }
    }

    /// Heading of the horizontal component in degrees, clockwise from +Z
    pub fn heading_degrees(self) -> f32 {
        self.x.atan2(self.z).to_degrees()
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Vec3) {
        *self = *self - rhs;
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f32> for Vec3 {
    type Output = Vec3;

    fn div(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(v: [f32; 3]) -> Self {
        Vec3::new(v[0], v[1], v[2])
    }
}

impl From<Vec3> for [f32; 3] {
    fn from(v: Vec3) -> Self {
        [v.x, v.y, v.z]
    }
}

/// Critically-damped spring approach of `current` toward `target`.
///
/// `rate` is the spring's internal velocity and must be carried from one call
/// to the next. Uses the closed-form approximation of `exp(-omega * dt)` so
/// results do not depend on a libm `exp` implementation. The output never
/// overshoots `target`.
pub fn smooth_damp(current: Vec3, target: Vec3, rate: &mut Vec3, smooth_time: f32, dt: f32) -> Vec3 {
    let smooth_time = smooth_time.max(MIN_SMOOTH_TIME);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*rate + change * omega) * dt;
    *rate = (*rate - temp * omega) * decay;
    let mut output = target + (change + temp) * decay;

    if (target - current).dot(output - target) > 0.0 {
        output = target;
        *rate = Vec3::ZERO;
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_magnitude() {
        let v = Vec3::new(2.0, 0.0, 0.0).clamp_magnitude(1.0);
        assert!((v.x - 1.0).abs() < 1e-6);

        let diagonal = Vec3::new(1.0, 0.0, 1.0).clamp_magnitude(1.0);
        assert!((diagonal.magnitude() - 1.0).abs() < 1e-6);

        let short = Vec3::new(0.5, 0.0, 0.5);
        assert_eq!(short.clamp_magnitude(1.0), short);
    }

    #[test]
    fn test_rotate_quadrant() {
        let forward = Vec3::FORWARD;
        assert_eq!(forward.rotate_quadrant(0), forward);
        assert_eq!(forward.rotate_quadrant(1), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(forward.rotate_quadrant(2), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(forward.rotate_quadrant(3), Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(forward.rotate_quadrant(4), forward);
    }

    #[test]
    fn test_heading_degrees() {
        assert_eq!(Vec3::FORWARD.heading_degrees(), 0.0);
        assert!((Vec3::new(1.0, 0.0, 0.0).heading_degrees() - 90.0).abs() < 1e-4);
        assert!((Vec3::new(-1.0, 0.0, 0.0).heading_degrees() + 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_axis_group_distances() {
        let a = Vec3::new(0.0, 5.0, 0.0);
        let b = Vec3::new(3.0, 1.0, 4.0);
        assert!((a.horizontal_distance(b) - 5.0).abs() < 1e-6);
        assert!((a.vertical_distance(b) - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_is_zero() {
        assert!(Vec3::ZERO.is_zero());
        assert!(Vec3::new(1e-6, 0.0, 0.0).is_zero());
        assert!(!Vec3::new(0.01, 0.0, 0.0).is_zero());
    }

    #[test]
    fn test_smooth_damp_converges_without_overshoot() {
        let target = Vec3::new(3.5, 0.0, 0.0);
        let mut current = Vec3::ZERO;
        let mut rate = Vec3::ZERO;

        for _ in 0..200 {
            current = smooth_damp(current, target, &mut rate, 0.25, 0.02);
            assert!(current.x <= target.x);
        }

        assert!((current.x - target.x).abs() < 1e-3);
    }

    #[test]
    fn test_smooth_damp_tighter_time_is_faster() {
        let target = Vec3::new(3.5, 0.0, 0.0);

        let mut ground_rate = Vec3::ZERO;
        let ground = smooth_damp(Vec3::ZERO, target, &mut ground_rate, 0.025, 0.02);

        let mut air_rate = Vec3::ZERO;
        let air = smooth_damp(Vec3::ZERO, target, &mut air_rate, 0.25, 0.02);

        assert!(ground.x > air.x);
    }
}
