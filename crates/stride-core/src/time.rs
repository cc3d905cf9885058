//! Fixed-timestep time keeping
//!
//! - `Tick` - Logical time unit
//! - `Sequence` - Per-input counter used for ordering and acknowledgment
//! - `FixedClock` - Simulation clock with a constant delta time
//! - `SendSchedule` - Interval gate for batched network sends

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A discrete tick identifier (logical time unit)
pub type Tick = u64;

/// Monotonic input sequence number. Zero means "nothing yet".
pub type Sequence = u32;

/// Default fixed tick rate (a 0.02 s physics step)
pub const DEFAULT_TICK_RATE_HZ: u32 = 50;

/// Fixed-timestep simulation clock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedClock {
    /// Current tick number
    tick: Tick,
    /// Configured tick rate
    tick_rate_hz: u32,
    /// Seconds per tick
    delta_time: f32,
}

impl FixedClock {
    /// Create a clock at tick 0
    pub fn new(tick_rate_hz: u32) -> Result<Self> {
        if tick_rate_hz == 0 {
            return Err(Error::InvalidTickRate(tick_rate_hz));
        }
        Ok(Self {
            tick: 0,
            tick_rate_hz,
            delta_time: 1.0 / tick_rate_hz as f32,
        })
    }

    /// Advance to the next tick
    pub fn advance(&mut self) {
        self.tick += 1;
    }

    /// Current tick
    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.tick_rate_hz
    }

    /// Constant step duration in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Simulated seconds elapsed since tick 0
    pub fn elapsed_secs(&self) -> f64 {
        self.tick as f64 / f64::from(self.tick_rate_hz)
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self {
            tick: 0,
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            delta_time: 1.0 / DEFAULT_TICK_RATE_HZ as f32,
        }
    }
}

/// Gate that opens at most once per interval
///
/// Once the gate opens at time `t`, it stays shut until strictly after
/// `t + interval`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendSchedule {
    interval_secs: f64,
    next_send_at: f64,
}

impl SendSchedule {
    /// Create a schedule that is due immediately
    pub fn new(interval_secs: f64) -> Self {
        Self {
            interval_secs,
            next_send_at: f64::NEG_INFINITY,
        }
    }

    /// Check whether a send is due at `now`; `force` bypasses the interval.
    ///
    /// Opening the gate re-arms it for `now + interval`.
    pub fn poll(&mut self, now: f64, force: bool) -> bool {
        if force || self.next_send_at < now {
            self.next_send_at = now + self.interval_secs;
            true
        } else {
            false
        }
    }
}
