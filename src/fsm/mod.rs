//! Function-pointer finite state machine engine for the node lifecycle.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  StateTable                                                   │
//! │  ┌───────────────┬───────────┬──────────┬───────────────────┐ │
//! │  │ StateId       │ on_enter  │ on_exit  │ on_update         │ │
//! │  ├───────────────┼───────────┼──────────┼───────────────────┤ │
//! │  │ Uninitialized │ fn(ctx)   │ -        │ fn(ctx)->Option<> │ │
//! │  │ Discovering   │ fn(ctx)   │ -        │ fn(ctx)->Option<> │ │
//! │  │ Configured    │ fn(ctx)   │ -        │ fn(ctx)->Option<> │ │
//! │  │ Streaming     │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │ │
//! │  └───────────────┴───────────┴──────────┴───────────────────┘ │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next_id)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and updates the
//! current pointer. Returning the current state re-enters it. All
//! functions receive `&mut NodeContext`.

pub mod context;
pub mod states;

use context::NodeContext;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Lifecycle states of a node.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Uninitialized = 0,
    Discovering = 1,
    Configured = 2,
    Streaming = 3,
}

impl StateId {
    /// Total number of states — used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert an index back to `StateId`. Out-of-range indices assert in
    /// debug builds and fall back to `Uninitialized` in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Uninitialized,
            1 => Self::Discovering,
            2 => Self::Configured,
            3 => Self::Streaming,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Uninitialized
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut NodeContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut NodeContext) -> Option<StateId>;

/// Static descriptor for a single FSM state.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    current: usize,
    tick_count: u64,
    state_entry_tick: u64,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut NodeContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.
    pub fn tick(&mut self, ctx: &mut NodeContext) {
        self.tick_count += 1;
        ctx.ticks_in_state = self.tick_count - self.state_entry_tick;
        ctx.total_ticks = self.tick_count;

        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Jump to `next` regardless of what `on_update` would return.
    /// No-op when already there.
    pub fn force_transition(&mut self, next: StateId, ctx: &mut NodeContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    fn transition(&mut self, next_id: StateId, ctx: &mut NodeContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.state_entry_tick = self.tick_count;
        ctx.ticks_in_state = 0;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::context::NodeContext;
    use super::*;
    use crate::config::NodeConfig;
    use crate::protocol::{Direction, DirectionSet, Downstream, NodeType};
    use proptest::prelude::*;

    fn arb_packet() -> impl Strategy<Value = Downstream> {
        prop_oneof![
            any::<u8>().prop_map(Downstream::AssignId),
            (0u8..5).prop_map(|d| Downstream::DirInstruction(Direction::from_index(d).ok())),
            Just(Downstream::CsCompleted),
            (any::<u8>(), any::<u8>()).prop_map(|(w, h)| Downstream::DirToCheck {
                watch: DirectionSet::from_bits(w),
                hold: DirectionSet::from_bits(h),
            }),
            any::<u8>().prop_map(|t| Downstream::Configure(NodeType::from_wire(t))),
            Just(Downstream::Start),
            Just(Downstream::Quit),
            Just(Downstream::Reset),
        ]
    }

    proptest! {
        #[test]
        fn identity_consistent_with_state(
            steps in proptest::collection::vec((arb_packet(), 0u8..16), 1..60)
        ) {
            let mut fsm = Fsm::new(states::build_state_table(), StateId::Uninitialized);
            let mut ctx = NodeContext::new(NodeConfig::default(), NodeType::Button);
            fsm.start(&mut ctx);

            for (packet, lines) in steps {
                ctx.lines_low = DirectionSet::from_bits(lines);
                let _ = ctx.inbox.push(packet);
                fsm.tick(&mut ctx);
                ctx.outbox.clear();
                ctx.events.clear();

                match fsm.current_state() {
                    StateId::Uninitialized => prop_assert_eq!(ctx.node_id, None),
                    _ => prop_assert!(ctx.node_id.is_some()),
                }
                prop_assert!(ctx.components.len() == ctx.node_type.counts().total());
            }
        }
    }
}
