//! Netcode configuration
//!
//! All values have defaults, so a RON file only needs the fields it changes:
//!
//! ```ron
//! (
//!     tick_rate_hz: 60,
//!     netcode: (send_interval_secs: 0.1),
//! )
//! ```

use crate::error::{Error, Result};
use crate::reconciliation::CorrectionBasis;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use stride_core::time::DEFAULT_TICK_RATE_HZ;
use stride_core::LocomotionTuning;

/// Maximum number of unacknowledged inputs kept for replay
pub const DEFAULT_INPUT_BUFFER_CAPACITY: usize = 50;

/// Seconds between input batches sent by a remote client
pub const DEFAULT_SEND_INTERVAL_SECS: f64 = 0.3;

/// Divergence, per axis group, beyond which the client snaps to the server
pub const DEFAULT_CORRECTION_THRESHOLD: f32 = 0.6;

/// Prediction and reconciliation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetcodeConfig {
    /// Input buffer cap; the oldest sample is evicted beyond it
    pub input_buffer_capacity: usize,
    /// Interval between input batches when not colocated with the server
    pub send_interval_secs: f64,
    /// Snap threshold, evaluated separately for XZ and Y
    pub correction_threshold: f32,
    /// Which position is compared against the snapshot
    pub correction_basis: CorrectionBasis,
}

impl Default for NetcodeConfig {
    fn default() -> Self {
        Self {
            input_buffer_capacity: DEFAULT_INPUT_BUFFER_CAPACITY,
            send_interval_secs: DEFAULT_SEND_INTERVAL_SECS,
            correction_threshold: DEFAULT_CORRECTION_THRESHOLD,
            correction_basis: CorrectionBasis::default(),
        }
    }
}

impl NetcodeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.input_buffer_capacity == 0 {
            return Err(Error::InvalidConfig(
                "input_buffer_capacity must be at least 1".to_string(),
            ));
        }
        if !(self.send_interval_secs.is_finite() && self.send_interval_secs >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "send_interval_secs must be a finite non-negative number, got {}",
                self.send_interval_secs
            )));
        }
        if !(self.correction_threshold.is_finite() && self.correction_threshold >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "correction_threshold must be a finite non-negative number, got {}",
                self.correction_threshold
            )));
        }
        Ok(())
    }
}

/// Everything a session needs: tick rate, movement tuning, netcode settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrideConfig {
    pub tick_rate_hz: u32,
    pub locomotion: LocomotionTuning,
    pub netcode: NetcodeConfig,
}

impl Default for StrideConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            locomotion: LocomotionTuning::default(),
            netcode: NetcodeConfig::default(),
        }
    }
}

impl StrideConfig {
    /// Parse and validate a RON document
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let config: StrideConfig = ron::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a RON file
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_ron_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_rate_hz == 0 {
            return Err(Error::Core(stride_core::Error::InvalidTickRate(0)));
        }
        self.locomotion.validate()?;
        self.netcode.validate()
    }
}
