//! Hardware-free discovery traversal.
//!
//! The traversal only decides *what* to probe next and records the answers.
//! Driving lines, sending packets and timing out is the
//! [`DiscoveryDriver`](super::master::DiscoveryDriver)'s job.
//!
//! ```text
//!   next_probe ──▶ (driver probes) ──▶ on_reply / on_timeout ──▶ next_probe …
//! ```
//!
//! A probe is skipped when its target cell is already mapped or was already
//! found empty, so every physical node answers exactly once.

use heapless::Vec;
use log::{debug, info, warn};

use super::frontier::{Frontier, StackPair};
use super::topology::{GridNode, Link, Topology};
use super::MAX_NODES;
use crate::protocol::{Direction, NodeType, Position};

/// Cells probed without an answer. Bounded by the frontier.
const MAX_EMPTY: usize = super::frontier::FRONTIER_CAPACITY;

/// One pending probe: signal the neighbour of `from` on `dir` and offer it `new_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    pub from: u8,
    pub dir: Direction,
    pub target: Position,
    pub new_id: u8,
}

#[derive(Debug)]
pub struct Traversal {
    frontier: Frontier,
    topology: Topology,
    empty: Vec<Position, MAX_EMPTY>,
    next_id: u8,
    broadcast_id: u8,
}

impl Traversal {
    /// Start from the master alone, with all four of its sides queued.
    pub fn new(master_id: u8, master_type: NodeType, broadcast_id: u8) -> Self {
        let mut frontier = Frontier::new();
        frontier.push_sides(master_id, None);
        Self {
            frontier,
            topology: Topology::new(master_id, master_type),
            empty: Vec::new(),
            next_id: master_id.wrapping_add(1),
            broadcast_id,
        }
    }

    /// Pop until a probe worth making is found.
    pub fn next_probe(&mut self) -> Option<Probe> {
        if self.topology.is_full() || self.next_id == self.broadcast_id {
            if !self.frontier.is_empty() {
                warn!(
                    "grid full at {} nodes, abandoning {} probe(s)",
                    self.topology.len(),
                    self.frontier.len()
                );
                self.frontier.clear();
            }
            return None;
        }

        while let Some(StackPair { node_id, dir }) = self.frontier.pop() {
            let Some(target) = self
                .topology
                .get(node_id)
                .and_then(|n| n.position.step(dir))
            else {
                continue;
            };
            if self.topology.at(target).is_some() || self.empty.contains(&target) {
                debug!("skip {node_id}:{dir:?}, ({}, {}) already known", target.x, target.y);
                continue;
            }
            return Some(Probe {
                from: node_id,
                dir,
                target,
                new_id: self.next_id,
            });
        }
        None
    }

    /// A neighbour answered `probe`. Registers it and queues its other sides.
    pub fn on_reply(&mut self, probe: &Probe, node_type: NodeType, entry: Direction) -> Option<GridNode> {
        if entry != probe.dir.opposite() {
            warn!(
                "node {} reports entry {entry:?}, expected {:?}",
                probe.new_id,
                probe.dir.opposite()
            );
        }
        let node = GridNode {
            id: probe.new_id,
            node_type,
            position: probe.target,
            link: Some(Link {
                parent: probe.from,
                via: probe.dir,
            }),
        };
        if let Err(rejected) = self.topology.insert(node) {
            warn!("cannot register node {} at ({}, {})", rejected.id, rejected.position.x, rejected.position.y);
            return None;
        }
        self.frontier.push_sides(node.id, node.entry());
        self.next_id = self.next_id.wrapping_add(1);
        info!(
            "discovered node {} ({node_type:?}) at ({}, {})",
            node.id, node.position.x, node.position.y
        );
        Some(node)
    }

    /// Nobody answered `probe`; remember the cell as empty.
    pub fn on_timeout(&mut self, probe: &Probe) {
        if self.empty.push(probe.target).is_err() {
            warn!("empty-cell list full");
        }
    }

    /// No probes left.
    pub fn is_done(&self) -> bool {
        self.frontier.is_empty()
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Discovered nodes, excluding the master.
    pub fn discovered(&self) -> u8 {
        self.topology.len().saturating_sub(1) as u8
    }
}
