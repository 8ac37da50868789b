//! Wire vocabulary shared by master, nodes and host.
//!
//! - [`command`] — the command byte table, qualified by link
//! - [`node_type`] — node roles and their component counts
//! - [`direction`] — edge directions, direction masks, grid positions
//! - [`records`] — `Data` and `BoundsData`
//! - [`packet`] — binary bus packets (no checksum)
//! - [`host_line`] — checksummed ASCII serial lines
//! - [`crc8`] — the serial checksum

pub mod command;
pub mod crc8;
pub mod direction;
pub mod host_line;
pub mod node_type;
pub mod packet;
pub mod records;

pub use command::{Command, CommandTable, Link};
pub use crc8::Crc8;
pub use direction::{Direction, DirectionSet, Position};
pub use host_line::{HostCommand, HostLine, decode_line};
pub use node_type::{ComponentCounts, NodeType};
pub use packet::{Downstream, NODE_LEVEL_COMPONENT, Packet, Upstream, UpstreamFrame};
pub use records::{BoundsData, ComponentKind, Data};
