//! Grid topology discovery, run by the master.
//!
//! - [`frontier`]: the explicit (node, direction) worklist.
//! - [`topology`]: id ↔ position ↔ role map, parent links, line masks.
//! - [`traversal`]: pure probe selection and bookkeeping.
//! - [`master`]: drives the traversal through the ports with timing.

pub mod frontier;
pub mod master;
pub mod topology;
pub mod traversal;

pub use frontier::{Frontier, StackPair};
pub use master::{DiscoveryComplete, DiscoveryDriver};
pub use topology::{GridNode, Topology};
pub use traversal::{Probe, Traversal};

/// Largest grid the master maps, itself included.
pub const MAX_NODES: usize = 16;
