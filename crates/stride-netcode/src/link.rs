//! Deterministic in-memory lossy link
//!
//! Connects two [`LinkEnd`]s through a shared queue that applies latency,
//! jitter, loss and duplication, all driven by a seeded xorshift generator so
//! a run with the same seed delivers the same packets in the same order.
//! Time advances only when [`LossyLink::advance`] is called, once per tick.

use crate::error::{Error, Result};
use crate::transport::Transport;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Link impairments, applied independently in each direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConditions {
    /// Base delay in link ticks
    pub latency_ticks: u32,
    /// Extra random delay in `0..=jitter_ticks`; reorders packets
    pub jitter_ticks: u32,
    /// Probability a packet is lost
    pub drop_chance: f64,
    /// Probability a delivered packet arrives twice
    pub duplicate_chance: f64,
    pub seed: u64,
}

impl Default for LinkConditions {
    fn default() -> Self {
        Self {
            latency_ticks: 0,
            jitter_ticks: 0,
            drop_chance: 0.0,
            duplicate_chance: 0.0,
            seed: 0x5eed,
        }
    }
}

impl LinkConditions {
    /// A link that delivers everything immediately and exactly once
    pub fn perfect() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        for (name, chance) in [
            ("drop_chance", self.drop_chance),
            ("duplicate_chance", self.duplicate_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be within 0..=1, got {chance}"
                )));
            }
        }
        Ok(())
    }
}

/// Error raised by a link end
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("link state poisoned by a panicked holder")]
    Poisoned,
}

/// Counters over the whole link, both directions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub sent: u64,
    pub dropped: u64,
    pub duplicated: u64,
    pub delivered: u64,
}

/// xorshift64, reproducible across platforms
#[derive(Debug, Clone)]
struct LinkRng {
    state: u64,
}

impl LinkRng {
    fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform in [0, 1)
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn chance(&mut self, probability: f64) -> bool {
        probability > 0.0 && self.next_f64() < probability
    }

    /// Uniform in `0..=max`
    fn up_to(&mut self, max: u32) -> u64 {
        if max == 0 {
            0
        } else {
            self.next_u64() % (u64::from(max) + 1)
        }
    }
}

#[derive(Debug)]
struct InFlight {
    deliver_at: u64,
    order: u64,
    bytes: Vec<u8>,
}

/// One direction of the link
#[derive(Debug)]
struct Lane {
    in_flight: Vec<InFlight>,
    ready: VecDeque<Vec<u8>>,
    next_order: u64,
}

impl Lane {
    fn new() -> Self {
        Self {
            in_flight: Vec::new(),
            ready: VecDeque::new(),
            next_order: 0,
        }
    }

    fn schedule(&mut self, deliver_at: u64, now: u64, bytes: Vec<u8>) {
        if deliver_at <= now {
            self.ready.push_back(bytes);
            return;
        }
        self.in_flight.push(InFlight {
            deliver_at,
            order: self.next_order,
            bytes,
        });
        self.next_order += 1;
    }

    fn release(&mut self, now: u64) -> u64 {
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.in_flight)
            .into_iter()
            .partition(|packet| packet.deliver_at <= now);
        self.in_flight = pending;

        let mut due = due;
        due.sort_by_key(|packet| (packet.deliver_at, packet.order));
        let released = due.len() as u64;
        self.ready.extend(due.into_iter().map(|packet| packet.bytes));
        released
    }
}

#[derive(Debug)]
struct LinkState {
    conditions: LinkConditions,
    rng: LinkRng,
    now: u64,
    lanes: [Lane; 2],
    stats: LinkStats,
}

impl LinkState {
    fn send(&mut self, lane: usize, bytes: &[u8]) {
        self.stats.sent += 1;
        if self.rng.chance(self.conditions.drop_chance) {
            self.stats.dropped += 1;
            tracing::trace!(lane, len = bytes.len(), "link dropped packet");
            return;
        }

        let copies = if self.rng.chance(self.conditions.duplicate_chance) {
            self.stats.duplicated += 1;
            2
        } else {
            1
        };

        for _ in 0..copies {
            let delay =
                u64::from(self.conditions.latency_ticks) + self.rng.up_to(self.conditions.jitter_ticks);
            let now = self.now;
            self.lanes[lane].schedule(now + delay, now, bytes.to_vec());
        }
    }
}

/// Shared handle to the link; owns the link clock
#[derive(Debug, Clone)]
pub struct LossyLink {
    state: Arc<Mutex<LinkState>>,
}

impl LossyLink {
    /// Build a link and its two ends
    pub fn pair(conditions: LinkConditions) -> Result<(LossyLink, LinkEnd, LinkEnd)> {
        conditions.validate()?;
        let state = Arc::new(Mutex::new(LinkState {
            rng: LinkRng::new(conditions.seed),
            conditions,
            now: 0,
            lanes: [Lane::new(), Lane::new()],
            stats: LinkStats::default(),
        }));

        let link = LossyLink {
            state: Arc::clone(&state),
        };
        let a = LinkEnd {
            state: Arc::clone(&state),
            outgoing: 0,
        };
        let b = LinkEnd { state, outgoing: 1 };
        Ok((link, a, b))
    }

    /// Advance the link clock one tick and release packets now due
    pub fn advance(&self) -> Result<()> {
        let mut state = lock(&self.state).map_err(|e| Error::Transport(e.to_string()))?;
        state.now += 1;
        let now = state.now;
        let released: u64 = state.lanes.iter_mut().map(|lane| lane.release(now)).sum();
        if released > 0 {
            tracing::trace!(tick = now, released, "link released packets");
        }
        Ok(())
    }

    pub fn stats(&self) -> Result<LinkStats> {
        let state = lock(&self.state).map_err(|e| Error::Transport(e.to_string()))?;
        Ok(state.stats)
    }

    /// Packets still travelling in either direction
    pub fn in_flight(&self) -> Result<usize> {
        let state = lock(&self.state).map_err(|e| Error::Transport(e.to_string()))?;
        Ok(state.lanes.iter().map(|lane| lane.in_flight.len()).sum())
    }
}

/// One endpoint of a [`LossyLink`]
#[derive(Debug, Clone)]
pub struct LinkEnd {
    state: Arc<Mutex<LinkState>>,
    /// Lane this end writes to; it reads from the other one
    outgoing: usize,
}

impl Transport for LinkEnd {
    type Error = LinkError;

    fn send(&self, data: &[u8]) -> std::result::Result<(), LinkError> {
        let mut state = lock(&self.state)?;
        state.send(self.outgoing, data);
        Ok(())
    }

    fn recv(&self) -> std::result::Result<Option<Vec<u8>>, LinkError> {
        let mut state = lock(&self.state)?;
        let incoming = 1 - self.outgoing;
        let bytes = state.lanes[incoming].ready.pop_front();
        if bytes.is_some() {
            state.stats.delivered += 1;
        }
        Ok(bytes)
    }
}

fn lock(state: &Mutex<LinkState>) -> std::result::Result<MutexGuard<'_, LinkState>, LinkError> {
    state.lock().map_err(|_| LinkError::Poisoned)
}
