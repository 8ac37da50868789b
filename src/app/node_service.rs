//! Node service — the hexagonal core of a non-master board.
//!
//! [`NodeService`] owns the FSM, the blackboard context, the direction-line
//! driver and the Slave transport. All I/O flows through port traits
//! injected at call sites.
//!
//! ```text
//!  GpioPort ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!               │         NodeService          │
//!   BusPort ◀──▶│  FSM · components · lines    │ ──▶ StoragePort
//!               └─────────────────────────────┘
//! ```

use log::{info, warn};

use crate::components::Component;
use crate::config::NodeConfig;
use crate::drivers::direction_pins::DirectionPins;
use crate::fsm::context::{NodeContext, PersistRequest, PinPlan};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::identity::{IdentityStore, PersistedIdentity};
use crate::protocol::{CommandTable, Downstream, NodeType};
use crate::transport::Slave;

use super::events::AppEvent;
use super::ports::{BusPort, EventSink, GpioPort, StoragePort};

pub struct NodeService {
    fsm: Fsm,
    ctx: NodeContext,
    table: CommandTable,
    lines: DirectionPins,
    slave: Slave,
    /// Pin plan currently applied to the direction lines.
    applied_plan: Option<PinPlan>,
    tick_count: u64,
}

impl NodeService {
    /// Construct the service for a board whose populated sockets make it a
    /// `hardware_type`. Does **not** start the FSM; call [`start`](Self::start).
    pub fn new(config: NodeConfig, hardware_type: NodeType, lines: DirectionPins) -> Self {
        let slave = Slave::new(config.master_id, config.broadcast_id);
        Self {
            fsm: Fsm::new(build_state_table(), StateId::Uninitialized),
            ctx: NodeContext::new(config, hardware_type),
            table: CommandTable::default(),
            lines,
            slave,
            applied_plan: None,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Restore a persisted identity if there is one, then start the FSM.
    pub fn start(
        &mut self,
        storage: &impl StoragePort,
        gpio: &mut impl GpioPort,
        sink: &mut impl EventSink,
    ) {
        let initial = match IdentityStore::load(storage) {
            Some(ident) if ident.configured && !ident.is_master => {
                self.restore(&ident);
                StateId::Configured
            }
            Some(ident) if ident.is_master => {
                warn!("master identity found on a node board, ignoring");
                StateId::Uninitialized
            }
            _ => StateId::Uninitialized,
        };

        self.fsm = Fsm::new(build_state_table(), initial);
        self.fsm.start(&mut self.ctx);
        self.apply_pin_plan(gpio);
        sink.emit(&AppEvent::Started(initial));
        info!("NodeService started in {initial:?}");
    }

    fn restore(&mut self, ident: &PersistedIdentity) {
        self.ctx.node_id = Some(ident.node_id);
        self.ctx.watch = ident.watch_set();
        self.ctx.hold = ident.hold_set();
        self.ctx.entry = self.ctx.watch.iter().next();
        self.ctx.assign_role(ident.node_type);
        // Role restored, not newly assigned.
        self.ctx.events.clear();
        info!("restored identity: id {} {:?}", ident.node_id, ident.node_type);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one loop iteration: bus → lines → components → FSM → outputs.
    ///
    /// The `hw` parameter satisfies **both** [`GpioPort`] and [`BusPort`].
    /// This avoids a double mutable borrow while keeping the port boundary
    /// explicit.
    pub fn tick(
        &mut self,
        now_ms: u32,
        hw: &mut (impl GpioPort + BusPort),
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;
        let prev_state = self.fsm.current_state();

        // 1. Inbound packets addressed to us (or to everyone)
        self.receive(hw);

        // 2. Direction lines
        self.ctx.lines_low = self.lines.sample(hw);

        // 3. Component sampling
        if self.ctx.components_active {
            for component in &mut self.ctx.components {
                component.get_value(hw, now_ms);
            }
        }

        // 4. FSM tick (pure state logic)
        self.fsm.tick(&mut self.ctx);

        // 5. Direction lines follow the plan
        self.apply_pin_plan(hw);

        // 6. Component activation on entering streaming
        if self.ctx.activate_requested {
            self.ctx.activate_requested = false;
            for component in &mut self.ctx.components {
                component.activate(hw, now_ms);
            }
            self.ctx.components_active = true;
        }

        // 7. Upstream packets
        self.flush_outbox(hw);

        // 8. Persistence
        if let Some(request) = self.ctx.persist.take() {
            self.persist(request, storage);
        }

        // 9. Events
        for event in core::mem::take(&mut self.ctx.events) {
            sink.emit(&event);
        }
        let new_state = self.fsm.current_state();
        if new_state != prev_state {
            sink.emit(&AppEvent::StateChanged {
                from: prev_state,
                to: new_state,
            });
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn node_id(&self) -> Option<u8> {
        self.ctx.node_id
    }

    pub fn node_type(&self) -> NodeType {
        self.ctx.node_type
    }

    pub fn components(&self) -> &[Component] {
        &self.ctx.components
    }

    pub fn pin_plan(&self) -> PinPlan {
        self.ctx.pin_plan
    }

    /// Total loop iterations since construction.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internal ──────────────────────────────────────────────

    fn receive(&mut self, bus: &mut impl BusPort) {
        self.slave.set_node_id(self.ctx.node_id);
        while let Some(frame) = bus.receive() {
            if !self.slave.accepts(&frame) {
                continue;
            }
            match Downstream::decode(&self.table, &frame.bytes) {
                Ok(packet) => {
                    if self.ctx.inbox.push(packet).is_err() {
                        warn!("inbox full, dropping {:?}", packet.command());
                    }
                }
                Err(e) => warn!("dropping frame from {}: {e}", frame.sender),
            }
        }
    }

    /// Translate the FSM's pin plan into port calls, only when it changed.
    fn apply_pin_plan(&mut self, gpio: &mut impl GpioPort) {
        let plan = self.ctx.pin_plan;
        if self.applied_plan == Some(plan) {
            return;
        }
        match plan {
            PinPlan::SenseAll => self.lines.probe_all_as_input(gpio),
            PinPlan::Drive(dir) => {
                self.lines.probe_all_as_input(gpio);
                self.lines.pull_direction_low(gpio, dir);
            }
            PinPlan::Watch { watch, hold } => {
                self.lines.probe_subset_as_input(gpio, watch);
                for dir in hold.iter() {
                    self.lines.pull_direction_low(gpio, dir);
                }
            }
        }
        self.applied_plan = Some(plan);
    }

    fn flush_outbox(&mut self, bus: &mut impl BusPort) {
        self.slave.set_node_id(self.ctx.node_id);
        for out in core::mem::take(&mut self.ctx.outbox) {
            let payload = out.message.encode_payload(&self.table);
            self.slave.send(bus, out.component_id, &payload);
        }
    }

    fn persist(&mut self, request: PersistRequest, storage: &mut impl StoragePort) {
        match request {
            PersistRequest::Save => {
                let Some(id) = self.ctx.node_id else {
                    warn!("save requested without an id");
                    return;
                };
                let ident =
                    PersistedIdentity::node(id, self.ctx.node_type, self.ctx.watch, self.ctx.hold);
                match IdentityStore::save(storage, &ident) {
                    Ok(()) => self.ctx.emit(AppEvent::IdentitySaved),
                    Err(e) => warn!("identity save failed: {e}"),
                }
            }
            PersistRequest::Clear => match IdentityStore::clear(storage) {
                Ok(()) => self.ctx.emit(AppEvent::IdentityCleared),
                Err(e) => warn!("identity clear failed: {e}"),
            },
        }
    }
}
