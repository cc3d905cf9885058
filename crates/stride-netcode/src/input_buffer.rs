//! Input buffering for prediction and replay
//!
//! Holds inputs that have been applied locally but not yet acknowledged by the
//! server. Once full, the oldest sample is dropped whether or not the server
//! has seen it.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use stride_core::{InputSample, Sequence};

/// Ordered buffer of unacknowledged inputs
///
/// Sequence numbers are strictly increasing from front to back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputBuffer {
    /// Pending inputs (oldest first)
    inputs: VecDeque<InputSample>,
    /// Maximum number of inputs to buffer
    capacity: usize,
    /// Samples dropped by the capacity bound since creation
    evicted: u64,
}

impl InputBuffer {
    /// Create a new input buffer with the given capacity
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");
        Self {
            inputs: VecDeque::with_capacity(capacity + 1),
            capacity,
            evicted: 0,
        }
    }

    /// Append an input, evicting the oldest beyond capacity.
    ///
    /// Returns `false` and leaves the buffer untouched if the sample does not
    /// extend the strictly increasing sequence order.
    pub fn push(&mut self, sample: InputSample) -> bool {
        if let Some(newest) = self.inputs.back() {
            if sample.sequence <= newest.sequence {
                return false;
            }
        }

        self.inputs.push_back(sample);
        while self.inputs.len() > self.capacity {
            if let Some(dropped) = self.inputs.pop_front() {
                self.evicted += 1;
                tracing::trace!(sequence = dropped.sequence, "input buffer full, evicted oldest");
            }
        }
        true
    }

    /// Remove all inputs up to and including `sequence`.
    ///
    /// Returns how many were removed.
    pub fn acknowledge(&mut self, sequence: Sequence) -> usize {
        let mut removed = 0;
        while let Some(front) = self.inputs.front() {
            if front.sequence <= sequence {
                self.inputs.pop_front();
                removed += 1;
            } else {
                break;
            }
        }
        removed
    }

    /// All buffered inputs, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &InputSample> {
        self.inputs.iter()
    }

    /// Copy the buffer contents into a batch for sending
    pub fn to_batch(&self) -> Vec<InputSample> {
        self.inputs.iter().copied().collect()
    }

    /// Get the oldest buffered sequence
    pub fn oldest_sequence(&self) -> Option<Sequence> {
        self.inputs.front().map(|s| s.sequence)
    }

    /// Get the newest buffered sequence
    pub fn newest_sequence(&self) -> Option<Sequence> {
        self.inputs.back().map(|s| s.sequence)
    }

    /// Get the number of pending inputs
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Check if the buffer is full
    pub fn is_full(&self) -> bool {
        self.inputs.len() >= self.capacity
    }

    /// Total samples lost to the capacity bound
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Clear all inputs
    pub fn clear(&mut self) {
        self.inputs.clear();
    }

    /// Get the capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
