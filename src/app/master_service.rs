//! Master service — discovery driver, bus relay and host link.
//!
//! [`MasterService`] maps the grid at boot, then relays every node's
//! change events to the host as checksummed lines and forwards host
//! commands onto the bus. Its own panel components are polled like any
//! node's and reported under the master id.
//!
//! ```text
//!   SerialPort ◀──▶ ┌──────────────────────────────┐ ◀──▶ BusPort
//!  (host lines)     │        MasterService          │   (packets)
//!                   │ discovery · relay · panel     │
//!     GpioPort ◀────└──────────────────────────────┘ ──▶ EventSink
//! ```

use log::{debug, info, warn};

use crate::components::{ComponentSet, build_components};
use crate::config::NodeConfig;
use crate::discovery::master::send_downstream;
use crate::discovery::{DiscoveryComplete, DiscoveryDriver, GridNode};
use crate::drivers::direction_pins::DirectionPins;
use crate::identity::{IdentityStore, PersistedIdentity};
use crate::protocol::{
    CommandTable, Crc8, Data, Downstream, HostCommand, HostLine, NodeType, Position, Upstream,
    UpstreamFrame,
};

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{BusPort, EventSink, GpioPort, SerialPort, StoragePort};

/// Longest host line accepted, terminator included.
const LINE_CAPACITY: usize = 96;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterState {
    Discovering,
    Ready,
    Streaming,
}

pub struct MasterService {
    config: NodeConfig,
    table: CommandTable,
    crc: Crc8,
    lines: DirectionPins,
    /// `Some` while a traversal is running.
    discovery: Option<DiscoveryDriver>,
    components: ComponentSet,
    streaming: bool,
    /// Nodes found by the last completed discovery.
    nodes: u8,
    rx: heapless::Vec<u8, LINE_CAPACITY>,
    rx_overflow: bool,
    tick_count: u64,
}

impl MasterService {
    /// Construct the service. Does **not** touch any port; call [`start`](Self::start).
    pub fn new(config: NodeConfig, lines: DirectionPins) -> Self {
        let crc = Crc8::new(config.crc_polynomial);
        let components = build_components(NodeType::MasterPanel, &config);
        Self {
            config,
            table: CommandTable::default(),
            crc,
            lines,
            discovery: None,
            components,
            streaming: false,
            nodes: 0,
            rx: heapless::Vec::new(),
            rx_overflow: false,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Resume a persisted grid, or start discovering one.
    pub fn start(
        &mut self,
        hw: &mut (impl GpioPort + SerialPort),
        storage: &impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        match IdentityStore::load(storage) {
            Some(ident) if ident.configured && ident.is_master => {
                self.lines.probe_all_as_input(hw);
                for dir in ident.hold_set().iter() {
                    self.lines.pull_direction_low(hw, dir);
                }
                info!("MasterService resumed configured grid, holding {:#06b}", ident.hold);
            }
            Some(_) => {
                warn!("node identity found on the master board, rediscovering");
                self.begin_discovery(hw, sink);
            }
            None => self.begin_discovery(hw, sink),
        }
        info!("MasterService started in {:?}", self.state());
    }

    fn begin_discovery(&mut self, hw: &mut (impl GpioPort + SerialPort), sink: &mut impl EventSink) {
        self.streaming = false;
        self.nodes = 0;
        self.lines.probe_all_as_input(hw);
        self.discovery = Some(DiscoveryDriver::new(&self.config));
        self.write_line(
            hw,
            &HostLine::NodeInfo {
                id: self.config.master_id,
                node_type: NodeType::MasterPanel,
                position: Position::ORIGIN,
            },
        );
        sink.emit(&AppEvent::DiscoveryStarted);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one loop iteration: host → bus → discovery → panel.
    ///
    /// `hw` satisfies every hardware port at once, avoiding overlapping
    /// mutable borrows while keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        now_ms: u32,
        hw: &mut (impl GpioPort + BusPort + SerialPort),
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;

        // 1. Host commands
        self.read_host(now_ms, hw, storage, sink);

        // 2. Bus frames addressed to the master
        self.relay(hw, sink);

        // 3. Discovery
        let done = match self.discovery.as_mut() {
            Some(driver) => driver.tick(now_ms, hw, &mut self.lines, &self.table),
            None => None,
        };
        if let Some(done) = done {
            self.discovery = None;
            self.complete_discovery(done, hw, storage, sink);
        }

        // 4. Own panel
        if self.streaming {
            for c in &mut self.components {
                c.get_value(hw, now_ms);
                if c.has_changed() {
                    let data = Data {
                        node_id: self.config.master_id,
                        id: c.id(),
                        kind: c.kind(),
                        value: c.value(),
                    };
                    hw.write_line(&HostLine::Value(data).encode(&self.table, &self.crc));
                }
            }
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (host serial link or firmware entry point).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now_ms: u32,
        hw: &mut (impl GpioPort + BusPort + SerialPort),
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::StartStreaming => {
                if self.discovery.is_some() {
                    warn!("start ignored while discovering");
                    return;
                }
                send_downstream(hw, &self.table, self.config.broadcast_id, Downstream::Start);
                if !self.streaming {
                    for c in &mut self.components {
                        c.activate(hw, now_ms);
                    }
                    self.streaming = true;
                    sink.emit(&AppEvent::StreamingStarted);
                }
            }
            AppCommand::StopStreaming => {
                send_downstream(hw, &self.table, self.config.broadcast_id, Downstream::Quit);
                if self.streaming {
                    self.streaming = false;
                    sink.emit(&AppEvent::StreamingStopped);
                }
            }
            AppCommand::ResetGrid => {
                send_downstream(hw, &self.table, self.config.broadcast_id, Downstream::Reset);
                sink.emit(&AppEvent::ResetRequested);
                match IdentityStore::clear(storage) {
                    Ok(()) => sink.emit(&AppEvent::IdentityCleared),
                    Err(e) => warn!("identity clear failed: {e}"),
                }
                self.begin_discovery(hw, sink);
            }
            AppCommand::SetBounds { node_id, bounds } => {
                if node_id == self.config.master_id {
                    if !self.components.iter_mut().any(|c| c.set_bounds(&bounds)) {
                        warn!("bounds for unknown panel component {}", bounds.component_id);
                    }
                } else {
                    send_downstream(hw, &self.table, node_id, Downstream::Bounds(bounds));
                }
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> MasterState {
        if self.discovery.is_some() {
            MasterState::Discovering
        } else if self.streaming {
            MasterState::Streaming
        } else {
            MasterState::Ready
        }
    }

    /// Nodes found by the last completed discovery, excluding the master.
    pub fn node_count(&self) -> u8 {
        self.nodes
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internal ──────────────────────────────────────────────

    fn write_line(&self, serial: &mut impl SerialPort, line: &HostLine) {
        serial.write_line(&line.encode(&self.table, &self.crc));
    }

    /// Drain the serial port, handling each command as its line completes.
    fn read_host(
        &mut self,
        now_ms: u32,
        hw: &mut (impl GpioPort + BusPort + SerialPort),
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        let mut chunk = [0u8; 32];
        loop {
            let n = SerialPort::read(hw, &mut chunk);
            if n == 0 {
                break;
            }
            for &byte in &chunk[..n] {
                if let Some(cmd) = self.push_host_byte(byte) {
                    self.handle_command(cmd.into(), now_ms, hw, storage, sink);
                }
            }
        }
    }

    fn push_host_byte(&mut self, byte: u8) -> Option<HostCommand> {
        if byte != b'\n' {
            if self.rx.push(byte).is_err() {
                self.rx_overflow = true;
            }
            return None;
        }

        let line = core::mem::take(&mut self.rx);
        if core::mem::take(&mut self.rx_overflow) {
            warn!("host line longer than {LINE_CAPACITY} bytes dropped");
            return None;
        }
        let Ok(text) = core::str::from_utf8(&line) else {
            warn!("host line is not UTF-8");
            return None;
        };
        if text.trim().is_empty() {
            return None;
        }
        match HostCommand::decode(&self.table, &self.crc, text) {
            Ok(cmd) => {
                debug!("host: {cmd:?}");
                Some(cmd)
            }
            Err(e) => {
                warn!("host line rejected: {e}");
                None
            }
        }
    }

    /// Forward node frames to the host, feeding discovery replies to the driver.
    fn relay(&mut self, hw: &mut (impl GpioPort + BusPort + SerialPort), sink: &mut impl EventSink) {
        while let Some(frame) = hw.receive() {
            if frame.dest != self.config.master_id {
                continue;
            }
            let up = match UpstreamFrame::decode(&self.table, &frame.bytes) {
                Ok(up) => up,
                Err(e) => {
                    warn!("dropping frame from {}: {e}", frame.sender);
                    continue;
                }
            };
            match up.message {
                Upstream::NodeConnected { node_type, entry } => {
                    let Some(driver) = self.discovery.as_mut() else {
                        warn!("nodeConnected from {} outside discovery", up.sender_id);
                        continue;
                    };
                    if let Some(node) = driver.on_node_connected(
                        up.sender_id,
                        node_type,
                        entry,
                        hw,
                        &mut self.lines,
                        &self.table,
                    ) {
                        self.report_node(hw, sink, &node);
                    }
                }
                Upstream::Value { .. } => {
                    if let Some(data) = up.as_data() {
                        self.write_line(hw, &HostLine::Value(data));
                    }
                }
                Upstream::NodeDisconnected(dir) => {
                    self.write_line(
                        hw,
                        &HostLine::Disconnected {
                            node_id: up.sender_id,
                            dir,
                        },
                    );
                    sink.emit(&AppEvent::NodeDisconnected {
                        node_id: up.sender_id,
                        dir,
                    });
                }
            }
        }
    }

    fn report_node(&self, serial: &mut impl SerialPort, sink: &mut impl EventSink, node: &GridNode) {
        self.write_line(
            serial,
            &HostLine::NodeInfo {
                id: node.id,
                node_type: node.node_type,
                position: node.position,
            },
        );
        sink.emit(&AppEvent::NodeDiscovered {
            id: node.id,
            node_type: node.node_type,
            position: node.position,
        });
    }

    fn complete_discovery(
        &mut self,
        done: DiscoveryComplete,
        serial: &mut impl SerialPort,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        self.nodes = done.nodes;
        self.write_line(serial, &HostLine::CsCompleted { count: done.nodes });
        sink.emit(&AppEvent::DiscoveryComplete { nodes: done.nodes });

        let ident = PersistedIdentity::master(self.config.master_id, done.hold);
        match IdentityStore::save(storage, &ident) {
            Ok(()) => sink.emit(&AppEvent::IdentitySaved),
            Err(e) => warn!("identity save failed: {e}"),
        }
    }
}
