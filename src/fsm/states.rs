//! Concrete state handler functions and table builder.
//!
//! ```text
//!  UNINITIALIZED ──[id packet, line low]──▶ DISCOVERING
//!        ▲                                      │
//!        │                               [cs completed]
//!        │                                      ▼
//!        │                                 CONFIGURED ◀──[quit]──┐
//!        │                                      │                │
//!        │                                   [start]             │
//!        │                                      ▼                │
//!        │                                  STREAMING ───────────┘
//!        │
//!  Any state ──[reset]──▶ UNINITIALIZED
//! ```

use log::{debug, info};

use super::context::{NodeContext, PersistRequest, PinPlan};
use super::{StateDescriptor, StateId};
use crate::app::events::AppEvent;
use crate::protocol::{Direction, Downstream, NODE_LEVEL_COMPONENT, Upstream};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table. Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        StateDescriptor {
            id: StateId::Uninitialized,
            name: "Uninitialized",
            on_enter: Some(uninitialized_enter),
            on_exit: None,
            on_update: uninitialized_update,
        },
        StateDescriptor {
            id: StateId::Discovering,
            name: "Discovering",
            on_enter: Some(discovering_enter),
            on_exit: None,
            on_update: discovering_update,
        },
        StateDescriptor {
            id: StateId::Configured,
            name: "Configured",
            on_enter: Some(configured_enter),
            on_exit: None,
            on_update: configured_update,
        },
        StateDescriptor {
            id: StateId::Streaming,
            name: "Streaming",
            on_enter: Some(streaming_enter),
            on_exit: Some(streaming_exit),
            on_update: streaming_update,
        },
    ]
}

/// Reset is honoured from every state.
fn reset_guard(ctx: &mut NodeContext) -> Option<StateId> {
    if ctx.reset_pending() {
        ctx.inbox.clear();
        info!("reset requested by master");
        return Some(StateId::Uninitialized);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  UNINITIALIZED — no id, no role, every line sensing
// ═══════════════════════════════════════════════════════════════════════════

fn uninitialized_enter(ctx: &mut NodeContext) {
    if ctx.node_id.is_some() || !ctx.components.is_empty() {
        ctx.persist = Some(PersistRequest::Clear);
    }
    ctx.clear_identity();
    ctx.pin_plan = PinPlan::SenseAll;
    info!("UNINITIALIZED: waiting for a neighbour to pull a line low");
}

fn uninitialized_update(ctx: &mut NodeContext) -> Option<StateId> {
    if let Some(next) = reset_guard(ctx) {
        return Some(next);
    }

    for packet in ctx.take_inbox() {
        let Downstream::AssignId(id) = packet else {
            debug!("UNINITIALIZED: ignoring {:?}", packet.command());
            continue;
        };
        // Only the node whose line is being probed answers a broadcast id.
        let Some(entry) = ctx.lines_low.iter().next() else {
            continue;
        };
        ctx.node_id = Some(id);
        ctx.entry = Some(entry);
        ctx.send(
            NODE_LEVEL_COMPONENT,
            Upstream::NodeConnected {
                node_type: ctx.hardware_type,
                entry,
            },
        );
        ctx.emit(AppEvent::IdAssigned { id, entry });
        return Some(StateId::Discovering);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  DISCOVERING — master drives our lines to probe our neighbours
// ═══════════════════════════════════════════════════════════════════════════

fn discovering_enter(ctx: &mut NodeContext) {
    ctx.pin_plan = PinPlan::SenseAll;
    info!(
        "DISCOVERING: id {:?}, reached through {:?}",
        ctx.node_id, ctx.entry
    );
}

fn discovering_update(ctx: &mut NodeContext) -> Option<StateId> {
    if let Some(next) = reset_guard(ctx) {
        return Some(next);
    }

    for packet in ctx.take_inbox() {
        match packet {
            Downstream::DirInstruction(Some(dir)) => ctx.pin_plan = PinPlan::Drive(dir),
            Downstream::DirInstruction(None) => ctx.pin_plan = PinPlan::SenseAll,
            Downstream::Configure(node_type) => ctx.assign_role(node_type),
            Downstream::DirToCheck { watch, hold } => {
                ctx.watch = watch;
                ctx.hold = hold;
            }
            Downstream::Bounds(bounds) => ctx.apply_bounds(&bounds),
            Downstream::CsCompleted => {
                ctx.persist = Some(PersistRequest::Save);
                return Some(StateId::Configured);
            }
            other => debug!("DISCOVERING: ignoring {:?}", other.command()),
        }
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONFIGURED — role known, components built but idle
// ═══════════════════════════════════════════════════════════════════════════

fn configured_enter(ctx: &mut NodeContext) {
    ctx.pin_plan = PinPlan::Watch {
        watch: ctx.watch,
        hold: ctx.hold,
    };
    info!(
        "CONFIGURED: {:?} with {} component(s)",
        ctx.node_type,
        ctx.components.len()
    );
}

fn configured_update(ctx: &mut NodeContext) -> Option<StateId> {
    if let Some(next) = reset_guard(ctx) {
        return Some(next);
    }

    for packet in ctx.take_inbox() {
        match packet {
            Downstream::Configure(node_type) => {
                ctx.assign_role(node_type);
                ctx.persist = Some(PersistRequest::Save);
            }
            Downstream::Bounds(bounds) => ctx.apply_bounds(&bounds),
            Downstream::DirToCheck { watch, hold } => {
                ctx.watch = watch;
                ctx.hold = hold;
                ctx.pin_plan = PinPlan::Watch { watch, hold };
            }
            Downstream::Start => return Some(StateId::Streaming),
            other => debug!("CONFIGURED: ignoring {:?}", other.command()),
        }
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  STREAMING — poll components, report changes and lost neighbours
// ═══════════════════════════════════════════════════════════════════════════

fn streaming_enter(ctx: &mut NodeContext) {
    ctx.activate_requested = true;
    info!("STREAMING: watching {:#06b}", ctx.watch.bits());
}

fn streaming_exit(ctx: &mut NodeContext) {
    ctx.components_active = false;
    ctx.activate_requested = false;
}

fn streaming_update(ctx: &mut NodeContext) -> Option<StateId> {
    if let Some(next) = reset_guard(ctx) {
        return Some(next);
    }

    for packet in ctx.take_inbox() {
        match packet {
            Downstream::Quit => return Some(StateId::Configured),
            Downstream::Bounds(bounds) => ctx.apply_bounds(&bounds),
            other => debug!("STREAMING: ignoring {:?}", other.command()),
        }
    }

    // Poll order is component order; the service sampled them just before.
    let changed: heapless::Vec<_, { crate::components::MAX_COMPONENTS }> = ctx
        .components
        .iter()
        .filter(|c| c.has_changed())
        .map(|c| (c.id(), c.kind(), c.value()))
        .collect();
    for (id, kind, value) in changed {
        ctx.send(id, Upstream::Value { kind, value });
    }

    let lost: heapless::Vec<Direction, { Direction::COUNT }> = ctx
        .watch
        .iter()
        .filter(|d| !ctx.lines_low.contains(*d))
        .collect();
    if lost.is_empty() {
        return None;
    }
    for dir in lost {
        ctx.watch.remove(dir);
        ctx.send(NODE_LEVEL_COMPONENT, Upstream::NodeDisconnected(dir));
        ctx.emit(AppEvent::LineLost(dir));
    }
    ctx.pin_plan = PinPlan::Watch {
        watch: ctx.watch,
        hold: ctx.hold,
    };
    ctx.persist = Some(PersistRequest::Save);
    None
}
