//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::IdAssigned { id, entry } => {
                info!("IDENT | id={} entry={:?}", id, entry);
            }
            AppEvent::RoleAssigned(node_type) => {
                info!("IDENT | role={:?}", node_type);
            }
            AppEvent::LineLost(dir) => {
                warn!("LINK  | lost neighbour on {:?}", dir);
            }
            AppEvent::IdentitySaved => {
                info!("NVS   | identity saved");
            }
            AppEvent::IdentityCleared => {
                info!("NVS   | identity cleared");
            }
            AppEvent::DiscoveryStarted => {
                info!("GRID  | discovery started");
            }
            AppEvent::NodeDiscovered {
                id,
                node_type,
                position,
            } => {
                info!(
                    "GRID  | node {} {:?} at ({}, {})",
                    id, node_type, position.x, position.y
                );
            }
            AppEvent::DiscoveryComplete { nodes } => {
                info!("GRID  | discovery complete, {} node(s)", nodes);
            }
            AppEvent::NodeDisconnected { node_id, dir } => {
                warn!("GRID  | node {} lost its {:?} neighbour", node_id, dir);
            }
            AppEvent::ResetRequested => {
                info!("GRID  | reset requested");
            }
            AppEvent::StreamingStarted => {
                info!("GRID  | streaming started");
            }
            AppEvent::StreamingStopped => {
                info!("GRID  | streaming stopped");
            }
        }
    }
}
