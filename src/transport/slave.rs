//! Slave role on the multi-drop bus.
//!
//! ```text
//! [component_id][sender_id][payload…]  ──▶  master_id
//! ```
//!
//! Fire-and-forget: a failed send is logged and dropped. The next detected
//! change carries fresh state, so nothing is retried here.

use heapless::Vec;
use log::{debug, warn};

use crate::app::ports::{BusFrame, BusPort, MAX_FRAME};

pub struct Slave {
    node_id: Option<u8>,
    master_id: u8,
    broadcast_id: u8,
}

impl Slave {
    pub const fn new(master_id: u8, broadcast_id: u8) -> Self {
        Self {
            node_id: None,
            master_id,
            broadcast_id,
        }
    }

    pub const fn node_id(&self) -> Option<u8> {
        self.node_id
    }

    pub fn set_node_id(&mut self, id: Option<u8>) {
        self.node_id = id;
    }

    /// Frames addressed to everyone, or to us once we have an id.
    pub fn accepts(&self, frame: &BusFrame) -> bool {
        frame.dest == self.broadcast_id || Some(frame.dest) == self.node_id
    }

    /// Prefix `payload` with the component and sender ids.
    pub fn frame(&self, component_id: u8, payload: &[u8]) -> Option<Vec<u8, MAX_FRAME>> {
        let sender = self.node_id?;
        let mut out = Vec::new();
        out.push(component_id).ok()?;
        out.push(sender).ok()?;
        out.extend_from_slice(payload).ok()?;
        Some(out)
    }

    /// Send one packet to the master. Returns whether the bus accepted it.
    pub fn send<B: BusPort>(&self, bus: &mut B, component_id: u8, payload: &[u8]) -> bool {
        let Some(frame) = self.frame(component_id, payload) else {
            warn!("slave: cannot frame {} byte(s) without an id", payload.len());
            return false;
        };
        match bus.send(self.master_id, &frame) {
            Ok(()) => {
                debug!("slave: sent {frame:02x?}");
                true
            }
            Err(e) => {
                warn!("slave: send failed ({e}), dropped");
                false
            }
        }
    }
}
