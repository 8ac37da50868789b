//! Master-side discovery driver.
//!
//! Runs the [`Traversal`] against real ports, one non-blocking step per loop
//! iteration:
//!
//! ```text
//!  Idle ──[next probe]──▶ Settling ──[settle_ms]──▶ AwaitingReply
//!   ▲                    (line low)   (id broadcast)      │
//!   └────────────[reply or reply_timeout_ms]──────────────┘
//!  Idle ──[frontier empty]──▶ Done  (dirToCheck to every node, csCompleted)
//! ```
//!
//! Lines on the master itself are driven directly; lines on other nodes are
//! driven by sending them a dirInstruction.

use log::{debug, info, warn};

use super::topology::{GridNode, Topology};
use super::traversal::{Probe, Traversal};
use crate::app::ports::{BusPort, GpioPort};
use crate::config::NodeConfig;
use crate::drivers::direction_pins::DirectionPins;
use crate::protocol::{CommandTable, Direction, DirectionSet, Downstream, NodeType};

/// Encode and send one packet; failures are logged and dropped.
pub fn send_downstream(bus: &mut impl BusPort, table: &CommandTable, dest: u8, packet: Downstream) {
    let bytes = packet.encode(table);
    if let Err(e) = bus.send(dest, &bytes) {
        warn!("send {:?} to {dest} failed: {e}", packet.command());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Settling { probe: Probe, since_ms: u32 },
    AwaitingReply { probe: Probe, since_ms: u32 },
    Done,
}

/// The frontier emptied. `hold` is what the master now holds low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryComplete {
    pub nodes: u8,
    pub hold: DirectionSet,
}

pub struct DiscoveryDriver {
    traversal: Traversal,
    phase: Phase,
    master_id: u8,
    broadcast_id: u8,
    settle_ms: u32,
    reply_timeout_ms: u32,
}

impl DiscoveryDriver {
    pub fn new(config: &NodeConfig) -> Self {
        info!("discovery started");
        Self {
            traversal: Traversal::new(config.master_id, NodeType::MasterPanel, config.broadcast_id),
            phase: Phase::Idle,
            master_id: config.master_id,
            broadcast_id: config.broadcast_id,
            settle_ms: config.probe_settle_ms,
            reply_timeout_ms: config.probe_reply_timeout_ms,
        }
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    pub fn topology(&self) -> &Topology {
        self.traversal.topology()
    }

    /// Advance by one loop iteration.
    pub fn tick(
        &mut self,
        now_ms: u32,
        hw: &mut (impl GpioPort + BusPort),
        lines: &mut DirectionPins,
        table: &CommandTable,
    ) -> Option<DiscoveryComplete> {
        match self.phase {
            Phase::Idle => {
                let Some(probe) = self.traversal.next_probe() else {
                    return Some(self.finish(hw, lines, table));
                };
                debug!("probe {}:{:?} for id {}", probe.from, probe.dir, probe.new_id);
                self.signal(hw, lines, table, &probe, Some(probe.dir));
                self.phase = Phase::Settling { probe, since_ms: now_ms };
            }
            Phase::Settling { probe, since_ms } => {
                if now_ms.wrapping_sub(since_ms) >= self.settle_ms {
                    send_downstream(hw, table, self.broadcast_id, Downstream::AssignId(probe.new_id));
                    self.phase = Phase::AwaitingReply { probe, since_ms: now_ms };
                }
            }
            Phase::AwaitingReply { probe, since_ms } => {
                if now_ms.wrapping_sub(since_ms) >= self.reply_timeout_ms {
                    debug!("no reply on {}:{:?}", probe.from, probe.dir);
                    self.signal(hw, lines, table, &probe, None);
                    self.traversal.on_timeout(&probe);
                    self.phase = Phase::Idle;
                }
            }
            Phase::Done => {}
        }
        None
    }

    /// A nodeConnected frame arrived from `sender`.
    pub fn on_node_connected(
        &mut self,
        sender: u8,
        node_type: NodeType,
        entry: Direction,
        hw: &mut (impl GpioPort + BusPort),
        lines: &mut DirectionPins,
        table: &CommandTable,
    ) -> Option<GridNode> {
        let Phase::AwaitingReply { probe, .. } = self.phase else {
            warn!("unexpected nodeConnected from {sender}");
            return None;
        };
        if sender != probe.new_id {
            warn!("nodeConnected from {sender}, expected {}", probe.new_id);
            return None;
        }

        let node = self.traversal.on_reply(&probe, node_type, entry);
        if node.is_some() {
            send_downstream(hw, table, sender, Downstream::Configure(node_type));
        }
        self.signal(hw, lines, table, &probe, None);
        self.phase = Phase::Idle;
        node
    }

    /// Drive (or with `None`, release) the probed line.
    fn signal(
        &self,
        hw: &mut (impl GpioPort + BusPort),
        lines: &mut DirectionPins,
        table: &CommandTable,
        probe: &Probe,
        dir: Option<Direction>,
    ) {
        if probe.from == self.master_id {
            lines.probe_all_as_input(hw);
            if let Some(dir) = dir {
                lines.pull_direction_low(hw, dir);
            }
        } else {
            send_downstream(hw, table, probe.from, Downstream::DirInstruction(dir));
        }
    }

    fn finish(
        &mut self,
        hw: &mut (impl GpioPort + BusPort),
        lines: &mut DirectionPins,
        table: &CommandTable,
    ) -> DiscoveryComplete {
        let topology = self.traversal.topology();
        for node in topology.iter().filter(|n| n.id != self.master_id) {
            let (watch, hold) = topology.link_masks(node.id);
            send_downstream(hw, table, node.id, Downstream::DirToCheck { watch, hold });
        }

        let (_, hold) = topology.link_masks(self.master_id);
        lines.probe_all_as_input(hw);
        for dir in hold.iter() {
            lines.pull_direction_low(hw, dir);
        }

        send_downstream(hw, table, self.broadcast_id, Downstream::CsCompleted);
        self.phase = Phase::Done;

        let nodes = self.traversal.discovered();
        info!("discovery complete: {nodes} node(s)");
        DiscoveryComplete { nodes, hold }
    }
}
