//! Client-side input sequencing and prediction
//!
//! Runs once per fixed tick on the node that owns local input. Each tick it
//! stamps a new sample, applies it immediately so the player sees no delay,
//! and keeps it for replay until the server acknowledges it.

use crate::config::NetcodeConfig;
use crate::input_buffer::InputBuffer;
use crate::step::StepContext;
use stride_core::{FacingQuadrant, InputSample, InputSource, SendSchedule, Sequence, SimulationState};

/// Result of one sequencer tick
#[derive(Debug, Clone, PartialEq)]
pub struct SequencedTick {
    /// The sample produced and predicted this tick
    pub sample: InputSample,
    /// Buffer contents to send, when the send schedule fired
    pub batch: Option<Vec<InputSample>>,
}

/// Stamps, predicts, buffers and batches local input
#[derive(Debug, Clone)]
pub struct InputSequencer {
    /// Sequence of the most recent sample; 0 before the first tick
    current_sequence: Sequence,
    /// Pending inputs not yet confirmed by the server
    buffer: InputBuffer,
    /// Batch send gate
    schedule: SendSchedule,
    /// This node is also the server; every tick is sent
    colocated: bool,
}

impl InputSequencer {
    /// Create a sequencer. `colocated` is true when the local player runs
    /// on the authoritative node.
    pub fn new(config: &NetcodeConfig, colocated: bool) -> Self {
        Self {
            current_sequence: 0,
            buffer: InputBuffer::new(config.input_buffer_capacity),
            schedule: SendSchedule::new(config.send_interval_secs),
            colocated,
        }
    }

    /// Sample, predict and buffer one tick of input.
    ///
    /// `camera` is the current camera quadrant; it is recorded on the sample
    /// so replay on any node rotates the input the same way.
    pub fn tick(
        &mut self,
        source: &mut dyn InputSource,
        camera: FacingQuadrant,
        now_secs: f64,
        state: &mut SimulationState,
        ctx: &mut StepContext<'_>,
    ) -> SequencedTick {
        let (horizontal, vertical) = source.sample_raw_axes();
        let jump = source.sample_jump();

        let sample = self.record(horizontal, vertical, jump, camera);
        ctx.apply(state, &sample);

        SequencedTick {
            sample,
            batch: self.poll_batch(now_secs),
        }
    }

    /// Stamp a new sample with the next sequence number and buffer it
    pub fn record(&mut self, horizontal: f32, vertical: f32, jump: bool, camera: FacingQuadrant) -> InputSample {
        self.current_sequence = self.current_sequence.wrapping_add(1);
        let sample = InputSample::new(self.current_sequence, horizontal, vertical, jump, camera);
        if !self.buffer.push(sample) {
            tracing::warn!(
                sequence = sample.sequence,
                newest = ?self.buffer.newest_sequence(),
                "sample out of sequence order, predicted but not buffered"
            );
        }
        sample
    }

    /// Return the whole buffer if a send is due
    pub fn poll_batch(&mut self, now_secs: f64) -> Option<Vec<InputSample>> {
        if self.buffer.is_empty() {
            return None;
        }
        if self.schedule.poll(now_secs, self.colocated) {
            Some(self.buffer.to_batch())
        } else {
            None
        }
    }

    /// Sequence of the most recent sample
    pub fn current_sequence(&self) -> Sequence {
        self.current_sequence
    }

    /// Number of inputs awaiting acknowledgment
    pub fn pending_inputs(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_colocated(&self) -> bool {
        self.colocated
    }

    pub fn buffer(&self) -> &InputBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut InputBuffer {
        &mut self.buffer
    }

    /// Drop pending inputs without resending them.
    ///
    /// Numbering continues from the current sequence, so later samples stay
    /// above anything the server or the reconciler has already seen.
    pub fn discard_pending(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_core::{GroundPlane, LocomotionTuning, MovementSimulator, Vec3};

    const DT: f32 = 0.02;

    struct HoldForward;

    impl InputSource for HoldForward {
        fn sample_raw_axes(&mut self) -> (f32, f32) {
            (0.0, 1.0)
        }

        fn sample_jump(&mut self) -> bool {
            false
        }
    }

    fn config(capacity: usize) -> NetcodeConfig {
        NetcodeConfig {
            input_buffer_capacity: capacity,
            ..NetcodeConfig::default()
        }
    }

    #[test]
    fn test_tick_predicts_immediately() {
        let sim = MovementSimulator::new(LocomotionTuning::default()).unwrap();
        let mut ground = GroundPlane::default();
        let mut ctx = StepContext::new(&sim, &mut ground, DT);
        let mut state = SimulationState::at(Vec3::ZERO);
        let mut sequencer = InputSequencer::new(&NetcodeConfig::default(), false);

        let out = sequencer.tick(&mut HoldForward, FacingQuadrant::default(), 0.0, &mut state, &mut ctx);

        assert_eq!(out.sample.sequence, 1);
        assert!(state.position.z > 0.0);
        assert_eq!(sequencer.pending_inputs(), 1);
        assert_eq!(out.batch.map(|b| b.len()), Some(1));
    }

    #[test]
    fn test_sequences_are_monotonic() {
        let mut sequencer = InputSequencer::new(&NetcodeConfig::default(), false);

        let seqs: Vec<_> = (0..5)
            .map(|_| sequencer.record(0.0, 0.0, false, FacingQuadrant::default()).sequence)
            .collect();

        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
        assert_eq!(sequencer.current_sequence(), 5);
    }

    #[test]
    fn test_capacity_bound_independent_of_ack() {
        let mut sequencer = InputSequencer::new(&config(50), false);

        for _ in 0..80 {
            sequencer.record(1.0, 0.0, false, FacingQuadrant::default());
        }

        assert_eq!(sequencer.pending_inputs(), 50);
        assert_eq!(sequencer.buffer().oldest_sequence(), Some(31));
        assert_eq!(sequencer.buffer().newest_sequence(), Some(80));
    }

    #[test]
    fn test_remote_client_batches_on_interval() {
        let config = NetcodeConfig {
            send_interval_secs: 0.25,
            ..NetcodeConfig::default()
        };
        let mut sequencer = InputSequencer::new(&config, false);
        let mut sends = Vec::new();

        // 1/16 s ticks keep the arithmetic exact
        for tick in 0..20u32 {
            sequencer.record(0.0, 1.0, false, FacingQuadrant::default());
            let now = f64::from(tick) * 0.0625;
            if let Some(batch) = sequencer.poll_batch(now) {
                sends.push((tick, batch.len()));
            }
        }

        // Sends at t=0, then on the first tick strictly after each window
        assert_eq!(sends.len(), 4);
        assert_eq!(sends[0], (0, 1));
        assert_eq!(sends[1].0, 5);
        // Unacknowledged inputs accumulate in every batch
        assert_eq!(sends[1].1, 6);
    }

    #[test]
    fn test_colocated_sends_every_tick() {
        let mut sequencer = InputSequencer::new(&NetcodeConfig::default(), true);

        for tick in 0..10u32 {
            sequencer.record(0.0, 1.0, false, FacingQuadrant::default());
            assert!(sequencer.poll_batch(f64::from(tick) * 0.02).is_some());
        }
    }

    #[test]
    fn test_empty_buffer_sends_nothing() {
        let mut sequencer = InputSequencer::new(&NetcodeConfig::default(), true);
        assert!(sequencer.poll_batch(0.0).is_none());
    }

    #[test]
    fn test_discard_pending_keeps_numbering() {
        let mut sequencer = InputSequencer::new(&NetcodeConfig::default(), false);
        for _ in 0..3 {
            sequencer.record(0.0, 1.0, false, FacingQuadrant::default());
        }
        sequencer.discard_pending();

        assert_eq!(sequencer.pending_inputs(), 0);
        assert!(sequencer.poll_batch(0.0).is_none());
        assert_eq!(sequencer.current_sequence(), 3);
        let next = sequencer.record(0.0, 1.0, false, FacingQuadrant::default());
        assert_eq!(next.sequence, 4);
    }

    #[test]
    fn test_out_of_order_sample_still_returned() {
        let mut sequencer = InputSequencer::new(&NetcodeConfig::default(), false);
        sequencer.record(0.0, 1.0, false, FacingQuadrant::default());
        // Force the counter back, as a wrap would
        sequencer.current_sequence = 0;

        let sample = sequencer.record(0.0, 1.0, false, FacingQuadrant::default());

        assert_eq!(sample.sequence, 1);
        assert_eq!(sequencer.pending_inputs(), 1);
    }
}
