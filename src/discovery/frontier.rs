//! Explicit worklist of pending probes.
//!
//! Last in, first out: the traversal goes depth-first, finishing one branch
//! of the grid before backing up.

use heapless::Vec;
use log::warn;

use crate::protocol::Direction;

/// Upper bound on outstanding probes. Each discovered node adds at most
/// three, so this covers a full grid of [`MAX_NODES`](super::MAX_NODES).
pub const FRONTIER_CAPACITY: usize = 64;

/// One side of one known node that has not been probed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackPair {
    pub node_id: u8,
    pub dir: Direction,
}

#[derive(Debug, Default)]
pub struct Frontier {
    stack: Vec<StackPair, FRONTIER_CAPACITY>,
}

impl Frontier {
    pub const fn new() -> Self {
        Self { stack: Vec::new() }
    }

    /// Queue a probe. Returns `false` (and drops it) when full.
    pub fn push(&mut self, pair: StackPair) -> bool {
        if self.stack.push(pair).is_err() {
            warn!("frontier full, dropping probe {}:{:?}", pair.node_id, pair.dir);
            return false;
        }
        true
    }

    /// Queue every side of `node_id` except `skip`, in [`Direction::ALL`] order.
    pub fn push_sides(&mut self, node_id: u8, skip: Option<Direction>) {
        for dir in Direction::ALL {
            if Some(dir) != skip {
                self.push(StackPair { node_id, dir });
            }
        }
    }

    pub fn pop(&mut self) -> Option<StackPair> {
        self.stack.pop()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}
