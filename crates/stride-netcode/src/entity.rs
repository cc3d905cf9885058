//! Networked entities and their roles
//!
//! Every node holds its own copy of each entity, in one of four roles:
//!
//! | Role        | Node                     | Runs                                   |
//! |-------------|--------------------------|----------------------------------------|
//! | `Host`      | server, local player     | sequencer + processor (no re-simulate) |
//! | `Predicted` | client, local player     | sequencer + reconciler                 |
//! | `Authority` | server, remote player    | processor                              |
//! | `Observer`  | client, remote player    | adopts newer snapshot positions        |

use crate::authority::AuthoritativeProcessor;
use crate::config::StrideConfig;
use crate::error::{Error, Result};
use crate::reconciliation::{ReconcileOutcome, Reconciler};
use crate::sequencer::InputSequencer;
use crate::step::StepContext;
use crate::wire::{AuthoritativeSnapshot, EntityId, Packet};
use serde::{Deserialize, Serialize};
use stride_core::{
    Facing, FacingQuadrant, InputSource, Locomotion, MovementResolver, MovementSimulator, Sequence,
    SimulationState, Vec3,
};

/// How this node participates in an entity's simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Authoritative node that is also the controlling player
    Host,
    /// Controlling client, predicting ahead of the server
    Predicted,
    /// Authoritative node for a remote player
    Authority,
    /// Non-controlling, non-authoritative view
    Observer,
}

impl Role {
    /// Local input drives this entity
    pub fn is_controlled(self) -> bool {
        matches!(self, Role::Host | Role::Predicted)
    }
}

/// Client-side prediction machinery for a controlled entity
#[derive(Debug, Clone)]
pub struct NetworkedControl {
    pub sequencer: InputSequencer,
    pub reconciler: Reconciler,
}

/// One entity as seen by one node
#[derive(Debug, Clone)]
pub struct NetworkedEntity {
    id: EntityId,
    role: Role,
    state: SimulationState,
    facing: Facing,
    simulator: MovementSimulator,
    control: Option<NetworkedControl>,
    authority: Option<AuthoritativeProcessor>,
    /// Highest snapshot sequence adopted by an observer
    last_observed: Sequence,
}

impl NetworkedEntity {
    /// Create an entity at `position` with the components its role needs
    pub fn new(id: EntityId, role: Role, position: Vec3, config: &StrideConfig) -> Result<Self> {
        let simulator = MovementSimulator::new(config.locomotion)?;

        let control = role.is_controlled().then(|| NetworkedControl {
            sequencer: InputSequencer::new(&config.netcode, role == Role::Host),
            reconciler: Reconciler::from_config(&config.netcode),
        });

        let authority = match role {
            Role::Host => Some(AuthoritativeProcessor::for_local_player()),
            Role::Authority => Some(AuthoritativeProcessor::new()),
            Role::Predicted | Role::Observer => None,
        };

        Ok(Self {
            id,
            role,
            state: SimulationState::at(position),
            facing: Facing::default(),
            simulator,
            control,
            authority,
            last_observed: 0,
        })
    }

    /// Run one fixed tick. Returns the packet to send, if any.
    ///
    /// Only controlled entities sample input; the others wait for packets.
    pub fn fixed_update(
        &mut self,
        source: &mut dyn InputSource,
        camera: FacingQuadrant,
        now_secs: f64,
        dt: f32,
        resolver: &mut dyn MovementResolver,
    ) -> Option<Packet> {
        let control = self.control.as_mut()?;
        let mut ctx = StepContext::new(&self.simulator, resolver, dt);

        let tick = control.sequencer.tick(source, camera, now_secs, &mut self.state, &mut ctx);
        self.facing = self
            .simulator
            .facing(&self.state, camera.yaw_degrees(), self.facing);

        let batch = tick.batch?;

        match self.authority.as_mut() {
            // The host is its own server: apply, acknowledge, and publish
            Some(authority) => {
                let snapshot = authority.apply(&batch, &mut self.state, &mut ctx);
                control.reconciler.reconcile(
                    &snapshot,
                    control.sequencer.buffer_mut(),
                    &mut self.state,
                    &mut ctx,
                );
                Some(self.snapshot_packet(snapshot))
            }
            None => Some(Packet::Inputs {
                entity: self.id,
                batch,
            }),
        }
    }

    /// Handle a packet addressed to this entity. Returns a reply, if any.
    pub fn handle(
        &mut self,
        packet: Packet,
        dt: f32,
        resolver: &mut dyn MovementResolver,
    ) -> Result<Option<Packet>> {
        match (self.role, packet) {
            (Role::Authority, Packet::Inputs { batch, .. }) => {
                let Some(authority) = self.authority.as_mut() else {
                    return Err(self.unexpected("inputs"));
                };
                let mut ctx = StepContext::new(&self.simulator, resolver, dt);
                let snapshot = authority.apply(&batch, &mut self.state, &mut ctx);
                Ok(Some(self.snapshot_packet(snapshot)))
            }
            (Role::Predicted, Packet::Snapshot { snapshot, .. }) => {
                let Some(control) = self.control.as_mut() else {
                    return Err(self.unexpected("snapshot"));
                };
                let mut ctx = StepContext::new(&self.simulator, resolver, dt);
                let outcome = control.reconciler.reconcile(
                    &snapshot,
                    control.sequencer.buffer_mut(),
                    &mut self.state,
                    &mut ctx,
                );
                if let ReconcileOutcome::Reconciled(correction) = outcome {
                    tracing::trace!(
                        entity = self.id,
                        acknowledged = correction.acknowledged,
                        pending = control.sequencer.pending_inputs(),
                        "reconciled"
                    );
                }
                Ok(None)
            }
            (Role::Observer, Packet::Snapshot { snapshot, .. }) => {
                self.observe(&snapshot);
                Ok(None)
            }
            (_, packet) => Err(self.unexpected(packet.kind())),
        }
    }

    /// Re-emit the latest authoritative snapshot, if this node has one
    pub fn replicate(&self) -> Option<Packet> {
        let snapshot = self.authority.as_ref()?.latest_snapshot()?;
        Some(self.snapshot_packet(snapshot))
    }

    fn observe(&mut self, snapshot: &AuthoritativeSnapshot) {
        if !snapshot.is_newer_than(self.last_observed) {
            tracing::debug!(
                entity = self.id,
                sequence = snapshot.sequence,
                last_observed = self.last_observed,
                "ignoring stale snapshot"
            );
            return;
        }
        self.last_observed = snapshot.sequence;
        self.state.position = snapshot.position;
    }

    fn snapshot_packet(&self, snapshot: AuthoritativeSnapshot) -> Packet {
        Packet::Snapshot {
            entity: self.id,
            snapshot,
        }
    }

    fn unexpected(&self, packet: &'static str) -> Error {
        Error::UnexpectedPacket {
            entity: self.id,
            role: self.role,
            packet,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn position(&self) -> Vec3 {
        self.state.position
    }

    /// Four-way facing for sprite selection
    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn control(&self) -> Option<&NetworkedControl> {
        self.control.as_ref()
    }

    pub fn control_mut(&mut self) -> Option<&mut NetworkedControl> {
        self.control.as_mut()
    }

    pub fn authority(&self) -> Option<&AuthoritativeProcessor> {
        self.authority.as_ref()
    }

    /// Last snapshot sequence accepted by the reconciler or the observer
    pub fn last_acknowledged_sequence(&self) -> Sequence {
        match &self.control {
            Some(control) => control.reconciler.last_acknowledged_sequence(),
            None => self.last_observed,
        }
    }
}
