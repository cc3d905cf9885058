//! Bundles what a node needs to run inputs through the simulator

use stride_core::{InputSample, Locomotion, MovementResolver, SimulationState};

/// Movement model, host physics and step length for one node
pub struct StepContext<'a> {
    pub locomotion: &'a dyn Locomotion,
    pub resolver: &'a mut dyn MovementResolver,
    pub dt: f32,
}

impl<'a> StepContext<'a> {
    pub fn new(locomotion: &'a dyn Locomotion, resolver: &'a mut dyn MovementResolver, dt: f32) -> Self {
        Self {
            locomotion,
            resolver,
            dt,
        }
    }

    /// Step `state` with one sample
    pub fn apply(&mut self, state: &mut SimulationState, sample: &InputSample) {
        self.locomotion.apply(state, sample, self.dt, &mut *self.resolver);
    }

    /// Step `state` with each sample in order; returns how many were applied
    pub fn replay<'s>(
        &mut self,
        state: &mut SimulationState,
        samples: impl IntoIterator<Item = &'s InputSample>,
    ) -> usize {
        let mut count = 0;
        for sample in samples {
            self.apply(state, sample);
            count += 1;
        }
        count
    }
}
