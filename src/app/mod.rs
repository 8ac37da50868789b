//! Application core — pure domain logic, zero I/O.
//!
//! Two services sit on top of the port traits in [`ports`]:
//! [`node_service::NodeService`] runs the lifecycle FSM of an ordinary grid
//! node, and [`master_service::MasterService`] runs discovery and relays
//! between the bus and the host. Neither touches hardware directly, so both
//! run unchanged under `cargo test`.

pub mod commands;
pub mod events;
pub mod master_service;
pub mod node_service;
pub mod ports;
