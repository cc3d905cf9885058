//! Server-side authoritative input processing
//!
//! The server applies each client input exactly once, however many times and
//! in whatever order batches arrive, and answers every batch with the
//! resulting `(sequence, position)` snapshot.

use crate::step::StepContext;
use crate::wire::AuthoritativeSnapshot;
use stride_core::{InputSample, Sequence, SimulationState};

/// Applies input batches to the authoritative state of one entity
#[derive(Debug, Clone, Default)]
pub struct AuthoritativeProcessor {
    /// Highest input sequence applied so far
    last_applied_sequence: Sequence,
    /// The local player on this node already predicted its own inputs
    predicts_locally: bool,
    /// Most recent snapshot, kept for re-delivery
    latest: Option<AuthoritativeSnapshot>,
}

impl AuthoritativeProcessor {
    /// Processor for an entity controlled by a remote client
    pub fn new() -> Self {
        Self::default()
    }

    /// Processor for the host's own player, whose inputs were already applied
    /// by local prediction and must not be simulated twice
    pub fn for_local_player() -> Self {
        Self {
            predicts_locally: true,
            ..Self::default()
        }
    }

    /// Apply a batch and return the snapshot to send back.
    ///
    /// Samples at or below the last applied sequence are skipped, which makes
    /// duplicate, overlapping and out-of-order batches harmless.
    pub fn apply(
        &mut self,
        batch: &[InputSample],
        state: &mut SimulationState,
        ctx: &mut StepContext<'_>,
    ) -> AuthoritativeSnapshot {
        let mut applied = 0usize;
        for sample in batch {
            if sample.sequence <= self.last_applied_sequence {
                continue;
            }
            self.last_applied_sequence = sample.sequence;
            if !self.predicts_locally {
                ctx.apply(state, sample);
            }
            applied += 1;
        }

        tracing::trace!(
            received = batch.len(),
            applied,
            last_applied = self.last_applied_sequence,
            "applied input batch"
        );

        let snapshot = AuthoritativeSnapshot::new(self.last_applied_sequence, state.position);
        self.latest = Some(snapshot);
        snapshot
    }

    /// Highest input sequence applied so far
    pub fn last_applied_sequence(&self) -> Sequence {
        self.last_applied_sequence
    }

    /// The snapshot to re-deliver on the replication schedule
    pub fn latest_snapshot(&self) -> Option<AuthoritativeSnapshot> {
        self.latest
    }

    pub fn predicts_locally(&self) -> bool {
        self.predicts_locally
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_core::{FacingQuadrant, GroundPlane, LocomotionTuning, MovementSimulator, Vec3};

    const DT: f32 = 0.02;

    fn batch(sequences: impl IntoIterator<Item = Sequence>) -> Vec<InputSample> {
        sequences
            .into_iter()
            .map(|seq| InputSample::new(seq, 1.0, 0.5, seq % 4 == 0, FacingQuadrant::default()))
            .collect()
    }

    fn sim() -> MovementSimulator {
        MovementSimulator::new(LocomotionTuning::default()).unwrap()
    }

    #[test]
    fn test_duplicate_batch_is_idempotent() {
        let sim = sim();
        let mut ground = GroundPlane::default();
        let mut ctx = StepContext::new(&sim, &mut ground, DT);
        let inputs = batch(1..=6);

        let mut once = AuthoritativeProcessor::new();
        let mut once_state = SimulationState::at(Vec3::ZERO);
        let first = once.apply(&inputs, &mut once_state, &mut ctx);

        let mut twice = AuthoritativeProcessor::new();
        let mut twice_state = SimulationState::at(Vec3::ZERO);
        twice.apply(&inputs, &mut twice_state, &mut ctx);
        let second = twice.apply(&inputs, &mut twice_state, &mut ctx);

        assert_eq!(once.last_applied_sequence(), twice.last_applied_sequence());
        assert_eq!(once_state, twice_state);
        assert_eq!(first, second);
        assert_eq!(second.sequence, 6);
    }

    #[test]
    fn test_overlapping_batches_apply_each_input_once() {
        let sim = sim();
        let mut ground = GroundPlane::default();
        let mut ctx = StepContext::new(&sim, &mut ground, DT);

        let mut overlapping = AuthoritativeProcessor::new();
        let mut overlapping_state = SimulationState::at(Vec3::ZERO);
        overlapping.apply(&batch(1..=4), &mut overlapping_state, &mut ctx);
        overlapping.apply(&batch(2..=7), &mut overlapping_state, &mut ctx);

        let mut single = AuthoritativeProcessor::new();
        let mut single_state = SimulationState::at(Vec3::ZERO);
        single.apply(&batch(1..=7), &mut single_state, &mut ctx);

        assert_eq!(overlapping_state, single_state);
        assert_eq!(overlapping.last_applied_sequence(), 7);
    }

    #[test]
    fn test_stale_batch_after_newer_is_ignored() {
        let sim = sim();
        let mut ground = GroundPlane::default();
        let mut ctx = StepContext::new(&sim, &mut ground, DT);
        let mut processor = AuthoritativeProcessor::new();
        let mut state = SimulationState::at(Vec3::ZERO);

        let newer = processor.apply(&batch(1..=10), &mut state, &mut ctx);
        let before = state;
        let stale = processor.apply(&batch(3..=8), &mut state, &mut ctx);

        assert_eq!(state, before);
        assert_eq!(stale, newer);
    }

    #[test]
    fn test_local_player_not_simulated_twice() {
        let sim = sim();
        let mut ground = GroundPlane::default();
        let mut ctx = StepContext::new(&sim, &mut ground, DT);
        let mut processor = AuthoritativeProcessor::for_local_player();
        let mut state = SimulationState::at(Vec3::new(2.0, 0.0, 2.0));

        let snapshot = processor.apply(&batch(1..=3), &mut state, &mut ctx);

        assert_eq!(state.position, Vec3::new(2.0, 0.0, 2.0));
        assert_eq!(snapshot.sequence, 3);
        assert_eq!(snapshot.position, Vec3::new(2.0, 0.0, 2.0));
    }

    #[test]
    fn test_latest_snapshot_retained() {
        let sim = sim();
        let mut ground = GroundPlane::default();
        let mut ctx = StepContext::new(&sim, &mut ground, DT);
        let mut processor = AuthoritativeProcessor::new();
        let mut state = SimulationState::default();

        assert!(processor.latest_snapshot().is_none());
        let snapshot = processor.apply(&batch([1]), &mut state, &mut ctx);
        assert_eq!(processor.latest_snapshot(), Some(snapshot));
    }
}
