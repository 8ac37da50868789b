//! Outbound application events.
//!
//! The node and master services emit these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them.

use crate::fsm::StateId;
use crate::protocol::{Direction, NodeType, Position};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The service has started (carries initial state).
    Started(StateId),

    /// The node FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// This node adopted a bus id while its `entry` line was held low.
    IdAssigned { id: u8, entry: Direction },

    /// This node was given a role by the master.
    RoleAssigned(NodeType),

    /// A watched line went high: the neighbour on that side is gone.
    LineLost(Direction),

    /// Identity written to or erased from persistent storage.
    IdentitySaved,
    IdentityCleared,

    /// Master: traversal (re)started from an empty map.
    DiscoveryStarted,

    /// Master: a new node answered a probe.
    NodeDiscovered {
        id: u8,
        node_type: NodeType,
        position: Position,
    },

    /// Master: the frontier emptied.
    DiscoveryComplete { nodes: u8 },

    /// Master: a node reported a lost neighbour.
    NodeDisconnected { node_id: u8, dir: Direction },

    /// Master: the host asked for a full reset and rediscovery.
    ResetRequested,

    /// Master: start / quit broadcast to the grid.
    StreamingStarted,
    StreamingStopped,
}
