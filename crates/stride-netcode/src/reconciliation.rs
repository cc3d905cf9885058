//! Server state reconciliation
//!
//! When a newer authoritative snapshot arrives the client:
//!
//! 1. acknowledges and drops every buffered input the snapshot covers,
//! 2. remembers its current predicted state,
//! 3. moves to the snapshot position and replays the inputs still pending,
//! 4. decides per axis group (horizontal plane, vertical axis) whether the
//!    divergence is large enough to take the server's position, or small
//!    enough to keep the prediction untouched.
//!
//! Snapshots at or below the last acknowledged sequence are ignored, so
//! duplicated and reordered delivery cannot move acknowledgment backwards.

use crate::config::NetcodeConfig;
use crate::input_buffer::InputBuffer;
use crate::step::StepContext;
use crate::wire::AuthoritativeSnapshot;
use serde::{Deserialize, Serialize};
use stride_core::{Sequence, SimulationState, Vec3};

/// Which position is measured against the snapshot to decide on a snap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CorrectionBasis {
    /// The position reconstructed by replaying pending inputs from the
    /// snapshot
    #[default]
    Replayed,
    /// The predicted position held before reconciliation started
    Predicted,
}

/// Decision for one axis group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisCorrection {
    /// Divergence within threshold; the prediction was kept
    Smoothed,
    /// Divergence beyond threshold; the snapshot position was taken
    Snapped,
}

impl AxisCorrection {
    fn decide(error: f32, threshold: f32) -> Self {
        if error > threshold {
            AxisCorrection::Snapped
        } else {
            AxisCorrection::Smoothed
        }
    }

    pub fn is_snap(self) -> bool {
        self == AxisCorrection::Snapped
    }
}

/// Threshold policy choosing between the prediction and the snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionPolicy {
    threshold: f32,
    basis: CorrectionBasis,
}

impl CorrectionPolicy {
    pub fn new(threshold: f32, basis: CorrectionBasis) -> Self {
        Self { threshold, basis }
    }

    pub fn from_config(config: &NetcodeConfig) -> Self {
        Self::new(config.correction_threshold, config.correction_basis)
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn basis(&self) -> CorrectionBasis {
        self.basis
    }

    /// Combine the pre-reconciliation prediction and the replayed state.
    ///
    /// A snapped group takes the snapshot position with the replayed motion
    /// for that group; a smoothed group restores the predicted position and
    /// motion exactly.
    pub fn resolve(
        &self,
        predicted: &SimulationState,
        replayed: &SimulationState,
        authoritative: Vec3,
    ) -> (SimulationState, AxisDivergence) {
        let compared = match self.basis {
            CorrectionBasis::Replayed => replayed.position,
            CorrectionBasis::Predicted => predicted.position,
        };

        let horizontal_error = compared.horizontal_distance(authoritative);
        let vertical_error = compared.vertical_distance(authoritative);
        let divergence = AxisDivergence {
            horizontal_error,
            vertical_error,
            horizontal: AxisCorrection::decide(horizontal_error, self.threshold),
            vertical: AxisCorrection::decide(vertical_error, self.threshold),
        };

        let mut result = *predicted;

        if divergence.horizontal.is_snap() {
            result.position.x = authoritative.x;
            result.position.z = authoritative.z;
            result.velocity.x = replayed.velocity.x;
            result.velocity.z = replayed.velocity.z;
            result.smoothing_rate = replayed.smoothing_rate;
            result.heading_degrees = replayed.heading_degrees;
        }

        if divergence.vertical.is_snap() {
            result.position.y = authoritative.y;
            result.velocity.y = replayed.velocity.y;
            result.grounded = replayed.grounded;
        }

        (result, divergence)
    }
}

impl Default for CorrectionPolicy {
    fn default() -> Self {
        Self::from_config(&NetcodeConfig::default())
    }
}

/// Measured divergence and the decision taken, per axis group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisDivergence {
    pub horizontal_error: f32,
    pub vertical_error: f32,
    pub horizontal: AxisCorrection,
    pub vertical: AxisCorrection,
}

/// Summary of a completed reconciliation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    /// Snapshot sequence now acknowledged
    pub acknowledged: Sequence,
    /// Buffered inputs dropped as covered by the snapshot
    pub pruned_inputs: usize,
    /// Pending inputs replayed on top of the snapshot
    pub replayed_inputs: usize,
    /// Position reached by the replay, before the policy ran
    pub replayed_position: Vec3,
    pub divergence: AxisDivergence,
}

/// Outcome of offering a snapshot to the reconciler
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReconcileOutcome {
    /// Snapshot was not newer than the last acknowledged one
    Stale {
        sequence: Sequence,
        last_acknowledged: Sequence,
    },
    /// Snapshot was applied
    Reconciled(Correction),
}

impl ReconcileOutcome {
    pub fn is_stale(&self) -> bool {
        matches!(self, ReconcileOutcome::Stale { .. })
    }

    pub fn correction(&self) -> Option<&Correction> {
        match self {
            ReconcileOutcome::Reconciled(correction) => Some(correction),
            ReconcileOutcome::Stale { .. } => None,
        }
    }
}

/// Reconciler life cycle; one pass per accepted snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcilePhase {
    #[default]
    Idle,
    Reconciling,
}

/// Client-side reconciliation against authoritative snapshots
#[derive(Debug, Clone)]
pub struct Reconciler {
    /// Highest snapshot sequence accepted so far
    last_acknowledged_sequence: Sequence,
    phase: ReconcilePhase,
    policy: CorrectionPolicy,
}

impl Reconciler {
    /// Create a new reconciler
    pub fn new(policy: CorrectionPolicy) -> Self {
        Self {
            last_acknowledged_sequence: 0,
            phase: ReconcilePhase::Idle,
            policy,
        }
    }

    pub fn from_config(config: &NetcodeConfig) -> Self {
        Self::new(CorrectionPolicy::from_config(config))
    }

    /// Reconcile the predicted `state` with an authoritative snapshot.
    ///
    /// `buffer` holds the inputs predicted since the last acknowledgment;
    /// covered inputs are removed from it.
    pub fn reconcile(
        &mut self,
        snapshot: &AuthoritativeSnapshot,
        buffer: &mut InputBuffer,
        state: &mut SimulationState,
        ctx: &mut StepContext<'_>,
    ) -> ReconcileOutcome {
        if !snapshot.is_newer_than(self.last_acknowledged_sequence) {
            tracing::debug!(
                sequence = snapshot.sequence,
                last_acknowledged = self.last_acknowledged_sequence,
                "ignoring stale snapshot"
            );
            return ReconcileOutcome::Stale {
                sequence: snapshot.sequence,
                last_acknowledged: self.last_acknowledged_sequence,
            };
        }

        debug_assert_eq!(self.phase, ReconcilePhase::Idle);
        self.phase = ReconcilePhase::Reconciling;

        self.last_acknowledged_sequence = snapshot.sequence;
        let pruned_inputs = buffer.acknowledge(snapshot.sequence);

        let predicted = *state;

        let mut replayed = predicted;
        replayed.position = snapshot.position;
        let replayed_inputs = ctx.replay(&mut replayed, buffer.iter());

        let (result, divergence) = self.policy.resolve(&predicted, &replayed, snapshot.position);
        *state = result;

        if divergence.horizontal.is_snap() || divergence.vertical.is_snap() {
            tracing::debug!(
                sequence = snapshot.sequence,
                horizontal = ?divergence.horizontal,
                vertical = ?divergence.vertical,
                horizontal_error = divergence.horizontal_error,
                vertical_error = divergence.vertical_error,
                "snapped to authoritative position"
            );
        }

        self.phase = ReconcilePhase::Idle;

        ReconcileOutcome::Reconciled(Correction {
            acknowledged: snapshot.sequence,
            pruned_inputs,
            replayed_inputs,
            replayed_position: replayed.position,
            divergence,
        })
    }

    /// Highest snapshot sequence accepted so far
    pub fn last_acknowledged_sequence(&self) -> Sequence {
        self.last_acknowledged_sequence
    }

    pub fn phase(&self) -> ReconcilePhase {
        self.phase
    }

    pub fn policy(&self) -> &CorrectionPolicy {
        &self.policy
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(CorrectionPolicy::default())
    }
}
