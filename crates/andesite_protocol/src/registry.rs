//! The per-state, per-direction packet id table.
//!
//! The registry is built once at process start by an explicit, deterministic
//! constructor (`build_registry`) and is immutable afterwards. Registering
//! the same (state, direction, id) twice is a build-time bug and panics.

use std::collections::HashMap;
use std::fmt;

use crate::packet::Packet;

/// Protocol states form a directed path Handshaking -> (Status | Login) ->
/// Configuration -> Play; Configuration may be re-entered from Play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolState {
    Handshaking,
    Status,
    Login,
    Configuration,
    Play,
}

impl fmt::Display for ProtocolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProtocolState::Handshaking => "handshaking",
            ProtocolState::Status => "status",
            ProtocolState::Login => "login",
            ProtocolState::Configuration => "configuration",
            ProtocolState::Play => "play",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Client to server.
    Serverbound,
    /// Server to client.
    Clientbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Serverbound => "serverbound",
            Direction::Clientbound => "clientbound",
        })
    }
}

type Factory = fn() -> Box<dyn Packet>;

#[derive(Default)]
pub struct PacketRegistry {
    table: HashMap<(ProtocolState, Direction, i32), Factory>,
}

impl PacketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a factory. Panics on a duplicate id: the catalog is append-only
    /// and duplicates are construction bugs, not runtime conditions.
    pub fn register(
        &mut self,
        state: ProtocolState,
        direction: Direction,
        id: i32,
        factory: Factory,
    ) {
        if self
            .table
            .insert((state, direction, id), factory)
            .is_some()
        {
            panic!("packet id {id:#04x} registered twice for {state}/{direction}");
        }
    }

    /// Constructs an empty packet for the given coordinates, or `None` for
    /// an id unknown to this table.
    pub fn create(
        &self,
        state: ProtocolState,
        direction: Direction,
        id: i32,
    ) -> Option<Box<dyn Packet>> {
        self.table.get(&(state, direction, id)).map(|f| f())
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::minecraft::java::build_registry;
    use crate::minecraft::java::handshake::Handshake;

    #[test]
    fn registry_resolves_known_ids() {
        let registry = build_registry();
        let packet = registry
            .create(ProtocolState::Handshaking, Direction::Serverbound, 0x00)
            .unwrap();
        assert!(packet.as_any().is::<Handshake>());
    }

    #[test]
    fn unknown_ids_resolve_to_none() {
        let registry = build_registry();
        assert!(registry
            .create(ProtocolState::Play, Direction::Serverbound, 0x7F)
            .is_none());
        // Direction matters: the handshake id only exists serverbound.
        assert!(registry
            .create(ProtocolState::Handshaking, Direction::Clientbound, 0x00)
            .is_none());
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_registration_panics() {
        let mut registry = PacketRegistry::new();
        let factory: super::Factory = || Box::<Handshake>::default();
        registry.register(ProtocolState::Handshaking, Direction::Serverbound, 0x00, factory);
        registry.register(ProtocolState::Handshaking, Direction::Serverbound, 0x00, factory);
    }
}
