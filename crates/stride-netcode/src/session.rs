//! Per-node container of networked entities
//!
//! A session owns the fixed clock, steps every entity once per tick, routes
//! decoded packets to the entity they address, and hands outgoing packets
//! back to the caller, which decides how to send them.

use crate::config::StrideConfig;
use crate::entity::{NetworkedEntity, Role};
use crate::error::{Error, Result};
use crate::transport::Transport;
use crate::wire::{EntityId, Packet};
use indexmap::IndexMap;
use stride_core::{FacingQuadrant, FixedClock, InputSource, MovementResolver, Vec3};

/// Entities and clock for one node
#[derive(Debug, Clone)]
pub struct Session {
    config: StrideConfig,
    clock: FixedClock,
    /// Insertion order is the update order
    entities: IndexMap<EntityId, NetworkedEntity>,
}

impl Session {
    /// Create an empty session, validating the configuration
    pub fn new(config: StrideConfig) -> Result<Self> {
        config.validate()?;
        let clock = FixedClock::new(config.tick_rate_hz)?;
        Ok(Self {
            config,
            clock,
            entities: IndexMap::new(),
        })
    }

    /// Add an entity in `role` at `position`
    pub fn spawn(&mut self, id: EntityId, role: Role, position: Vec3) -> Result<&mut NetworkedEntity> {
        if self.entities.contains_key(&id) {
            return Err(Error::DuplicateEntity(id));
        }
        let entity = NetworkedEntity::new(id, role, position, &self.config)?;
        tracing::debug!(entity = id, ?role, "spawned entity");
        Ok(self.entities.entry(id).or_insert(entity))
    }

    /// Remove an entity, keeping the order of the rest
    pub fn despawn(&mut self, id: EntityId) -> Option<NetworkedEntity> {
        self.entities.shift_remove(&id)
    }

    /// Advance one fixed tick and collect outgoing packets.
    ///
    /// `source` feeds every controlled entity; `camera` is the local camera
    /// quadrant recorded on their samples.
    pub fn fixed_update(
        &mut self,
        source: &mut dyn InputSource,
        camera: FacingQuadrant,
        resolver: &mut dyn MovementResolver,
    ) -> Vec<Packet> {
        let now = self.clock.elapsed_secs();
        let dt = self.clock.delta_time();

        let mut outgoing = Vec::new();
        for entity in self.entities.values_mut() {
            if let Some(packet) = entity.fixed_update(&mut *source, camera, now, dt, &mut *resolver) {
                outgoing.push(packet);
            }
        }

        self.clock.advance();
        outgoing
    }

    /// Decode and route one datagram. Returns a reply, if any.
    pub fn receive(&mut self, bytes: &[u8], resolver: &mut dyn MovementResolver) -> Result<Option<Packet>> {
        let packet = Packet::decode(bytes)?;
        self.dispatch(packet, resolver)
    }

    /// Route a decoded packet to its entity
    pub fn dispatch(&mut self, packet: Packet, resolver: &mut dyn MovementResolver) -> Result<Option<Packet>> {
        let dt = self.clock.delta_time();
        let id = packet.entity();
        let entity = self.entities.get_mut(&id).ok_or(Error::UnknownEntity(id))?;
        entity.handle(packet, dt, resolver)
    }

    /// Drain a transport, routing every datagram; returns the replies.
    ///
    /// Malformed or misrouted packets are logged and dropped; only transport
    /// failures are returned as errors.
    pub fn pump<T: Transport>(
        &mut self,
        transport: &T,
        resolver: &mut dyn MovementResolver,
    ) -> Result<Vec<Packet>> {
        let mut replies = Vec::new();
        for bytes in transport.drain()? {
            match self.receive(&bytes, resolver) {
                Ok(Some(reply)) => replies.push(reply),
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, len = bytes.len(), "dropping packet"),
            }
        }
        Ok(replies)
    }

    /// Latest snapshots of every entity this node is authoritative for
    pub fn replicate(&self) -> Vec<Packet> {
        self.entities.values().filter_map(NetworkedEntity::replicate).collect()
    }

    pub fn entity(&self, id: EntityId) -> Option<&NetworkedEntity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut NetworkedEntity> {
        self.entities.get_mut(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &NetworkedEntity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clock(&self) -> &FixedClock {
        &self.clock
    }

    pub fn config(&self) -> &StrideConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::AuthoritativeSnapshot;
    use stride_core::GroundPlane;

    struct Idle;

    impl InputSource for Idle {
        fn sample_raw_axes(&mut self) -> (f32, f32) {
            (0.0, 0.0)
        }

        fn sample_jump(&mut self) -> bool {
            false
        }
    }

    #[test]
    fn test_spawn_rejects_duplicates() {
        let mut session = Session::new(StrideConfig::default()).unwrap();
        session.spawn(1, Role::Predicted, Vec3::ZERO).unwrap();

        assert!(matches!(
            session.spawn(1, Role::Observer, Vec3::ZERO),
            Err(Error::DuplicateEntity(1))
        ));
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = StrideConfig::default();
        config.netcode.input_buffer_capacity = 0;
        assert!(matches!(Session::new(config), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_fixed_update_advances_clock() {
        let mut session = Session::new(StrideConfig::default()).unwrap();
        session.spawn(1, Role::Host, Vec3::ZERO).unwrap();
        session.spawn(2, Role::Authority, Vec3::ZERO).unwrap();
        let mut ground = GroundPlane::default();

        let packets = session.fixed_update(&mut Idle, FacingQuadrant::default(), &mut ground);

        // Only the host produces a packet without incoming input
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].entity(), 1);
        assert_eq!(session.clock().tick(), 1);
    }

    #[test]
    fn test_receive_unknown_entity() {
        let mut session = Session::new(StrideConfig::default()).unwrap();
        let mut ground = GroundPlane::default();
        let bytes = Packet::Snapshot {
            entity: 9,
            snapshot: AuthoritativeSnapshot::new(1, Vec3::ZERO),
        }
        .encode()
        .unwrap();

        assert!(matches!(
            session.receive(&bytes, &mut ground),
            Err(Error::UnknownEntity(9))
        ));
    }

    #[test]
    fn test_receive_routes_to_entity() {
        let mut session = Session::new(StrideConfig::default()).unwrap();
        session.spawn(3, Role::Observer, Vec3::ZERO).unwrap();
        let mut ground = GroundPlane::default();
        let bytes = Packet::Snapshot {
            entity: 3,
            snapshot: AuthoritativeSnapshot::new(2, Vec3::new(1.0, 0.0, 2.0)),
        }
        .encode()
        .unwrap();

        let reply = session.receive(&bytes, &mut ground).unwrap();

        assert!(reply.is_none());
        assert_eq!(session.entity(3).unwrap().position(), Vec3::new(1.0, 0.0, 2.0));
    }

    #[test]
    fn test_replicate_and_despawn() {
        let mut session = Session::new(StrideConfig::default()).unwrap();
        session.spawn(1, Role::Host, Vec3::ZERO).unwrap();
        session.spawn(2, Role::Observer, Vec3::ZERO).unwrap();
        let mut ground = GroundPlane::default();

        assert!(session.replicate().is_empty());
        session.fixed_update(&mut Idle, FacingQuadrant::default(), &mut ground);
        assert_eq!(session.replicate().len(), 1);

        assert!(session.despawn(1).is_some());
        assert!(session.replicate().is_empty());
        assert_eq!(session.entities().map(|e| e.id()).collect::<Vec<_>>(), vec![2]);
    }
}
