//! Shared mutable context threaded through every FSM handler.
//!
//! `NodeContext` is the single struct that state handlers read from and
//! write to: decoded bus packets and the sensed direction lines go in,
//! upstream packets, the pin plan and persistence requests come out. The
//! [`NodeService`](crate::app::node_service::NodeService) fills the inputs
//! before each tick and applies the outputs after it. Think of it as the
//! "blackboard" in a blackboard architecture.

use heapless::Vec;
use log::warn;

use crate::app::events::AppEvent;
use crate::components::{ComponentSet, build_components};
use crate::config::NodeConfig;
use crate::protocol::{BoundsData, Direction, DirectionSet, Downstream, NodeType, Upstream};

pub const INBOX_CAPACITY: usize = 8;
pub const OUTBOX_CAPACITY: usize = 8;
pub const EVENT_CAPACITY: usize = 8;

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Desired electrical state of the four direction lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinPlan {
    /// Every line a pulled-up input.
    SenseAll,
    /// One line driven low, the rest sensing.
    Drive(Direction),
    /// Hold lines towards children low; sense the watched lines.
    Watch {
        watch: DirectionSet,
        hold: DirectionSet,
    },
}

/// One upstream packet waiting for the Slave transport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outbound {
    pub component_id: u8,
    pub message: Upstream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistRequest {
    Save,
    Clear,
}

// ---------------------------------------------------------------------------
// NodeContext
// ---------------------------------------------------------------------------

pub struct NodeContext {
    // -- Timing --
    /// Ticks elapsed since the current state was entered.
    pub ticks_in_state: u64,
    /// Monotonic total tick count.
    pub total_ticks: u64,

    // -- Configuration --
    pub config: NodeConfig,
    /// Role implied by the sockets populated on this board.
    pub hardware_type: NodeType,

    // -- Identity --
    /// Bus id; `None` until the master assigns one.
    pub node_id: Option<u8>,
    /// Role assigned by the master.
    pub node_type: NodeType,
    /// Side the master reached this node through.
    pub entry: Option<Direction>,
    /// Lines towards the parent; a side leaves the set once reported lost.
    pub watch: DirectionSet,
    pub hold: DirectionSet,

    // -- Inputs (written by the service before each tick) --
    pub inbox: Vec<Downstream, INBOX_CAPACITY>,
    /// Direction lines currently read low.
    pub lines_low: DirectionSet,

    // -- Components --
    pub components: ComponentSet,
    /// Set while the service polls components every tick.
    pub components_active: bool,
    /// One-shot request for the service to activate every component.
    pub activate_requested: bool,

    // -- Outputs (consumed by the service after each tick) --
    pub outbox: Vec<Outbound, OUTBOX_CAPACITY>,
    pub pin_plan: PinPlan,
    pub persist: Option<PersistRequest>,
    pub events: Vec<AppEvent, EVENT_CAPACITY>,
}

impl NodeContext {
    pub fn new(config: NodeConfig, hardware_type: NodeType) -> Self {
        Self {
            ticks_in_state: 0,
            total_ticks: 0,
            config,
            hardware_type,
            node_id: None,
            node_type: NodeType::Empty,
            entry: None,
            watch: DirectionSet::EMPTY,
            hold: DirectionSet::EMPTY,
            inbox: Vec::new(),
            lines_low: DirectionSet::EMPTY,
            components: ComponentSet::new(),
            components_active: false,
            activate_requested: false,
            outbox: Vec::new(),
            pin_plan: PinPlan::SenseAll,
            persist: None,
            events: Vec::new(),
        }
    }

    /// Take every packet received since the last tick.
    pub fn take_inbox(&mut self) -> Vec<Downstream, INBOX_CAPACITY> {
        core::mem::take(&mut self.inbox)
    }

    /// A reset anywhere in the inbox wins over everything else in it.
    pub fn reset_pending(&self) -> bool {
        self.inbox.iter().any(|p| matches!(p, Downstream::Reset))
    }

    /// Queue an upstream packet. Overflow drops the packet.
    pub fn send(&mut self, component_id: u8, message: Upstream) {
        if self.outbox.push(Outbound { component_id, message }).is_err() {
            warn!("outbox full, dropping {:?}", message.command());
        }
    }

    pub fn emit(&mut self, event: AppEvent) {
        if self.events.push(event).is_err() {
            warn!("event queue full");
        }
    }

    /// Adopt a role and construct (but do not activate) its components.
    pub fn assign_role(&mut self, node_type: NodeType) {
        self.node_type = node_type;
        self.components = build_components(node_type, &self.config);
        self.components_active = false;
        self.emit(AppEvent::RoleAssigned(node_type));
    }

    /// Route a bounds update to the matching live component.
    pub fn apply_bounds(&mut self, bounds: &BoundsData) {
        if !self.components.iter_mut().any(|c| c.set_bounds(bounds)) {
            warn!(
                "bounds for unknown component {:?} {}",
                bounds.kind, bounds.component_id
            );
        }
    }

    /// Forget id, role, wiring and components.
    pub fn clear_identity(&mut self) {
        self.node_id = None;
        self.node_type = NodeType::Empty;
        self.entry = None;
        self.watch = DirectionSet::EMPTY;
        self.hold = DirectionSet::EMPTY;
        self.components.clear();
        self.components_active = false;
        self.activate_requested = false;
    }
}
