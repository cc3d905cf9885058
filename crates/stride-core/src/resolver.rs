//! Collision-resolution seam
//!
//! The host's physics turns a desired displacement into an actual one. The
//! simulator only ever talks to it through [`MovementResolver`].

use crate::math::Vec3;
use serde::{Deserialize, Serialize};

/// Outcome of resolving one displacement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// Position after the move, possibly clamped against obstacles
    pub position: Vec3,
    /// The move touched something above the body
    pub collided_above: bool,
    /// The body is standing on ground after the move
    pub grounded: bool,
}

/// Host physics: move a body from `origin` by at most `desired`.
///
/// Implementations should be deterministic for a given environment. A
/// resolver whose environment differs between client and server is an
/// accepted source of divergence; reconciliation absorbs it.
pub trait MovementResolver {
    fn resolve(&mut self, origin: Vec3, desired: Vec3) -> Resolution;
}

/// Unobstructed space: every move succeeds and nothing is ever ground
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeSpace;

impl MovementResolver for FreeSpace {
    fn resolve(&mut self, origin: Vec3, desired: Vec3) -> Resolution {
        Resolution {
            position: origin + desired,
            collided_above: false,
            grounded: false,
        }
    }
}

/// Infinite horizontal floor with an optional ceiling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundPlane {
    pub floor: f32,
    pub ceiling: Option<f32>,
}

impl GroundPlane {
    /// A floor at `height` with open sky
    pub fn new(floor: f32) -> Self {
        Self {
            floor,
            ceiling: None,
        }
    }

    pub fn with_ceiling(mut self, ceiling: f32) -> Self {
        self.ceiling = Some(ceiling);
        self
    }
}

impl Default for GroundPlane {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl MovementResolver for GroundPlane {
    fn resolve(&mut self, origin: Vec3, desired: Vec3) -> Resolution {
        let mut position = origin + desired;
        let mut grounded = false;
        let mut collided_above = false;

        if position.y <= self.floor {
            position.y = self.floor;
            grounded = true;
        }

        if let Some(ceiling) = self.ceiling {
            if position.y >= ceiling {
                position.y = ceiling;
                collided_above = true;
            }
        }

        Resolution {
            position,
            collided_above,
            grounded,
        }
    }
}
