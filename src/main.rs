//! GridNode Firmware — Main Entry Point
//!
//! Hexagonal architecture: one board adapter implements every hardware port,
//! and the strap-selected service owns all protocol logic.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  BoardAdapter              LogEventSink   NvsAdapter   Clock   │
//! │  (Gpio+Bus+Serial)         (EventSink)    (Config+NVS)         │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  MasterService (discovery · relay)   or                │    │
//! │  │  NodeService   (FSM · components · Slave transport)    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::Result;
use log::{info, warn};

use gridnode::adapters::board::BoardAdapter;
use gridnode::adapters::clock::Clock;
use gridnode::adapters::log_sink::LogEventSink;
use gridnode::adapters::nvs::NvsAdapter;
use gridnode::app::master_service::MasterService;
use gridnode::app::node_service::NodeService;
use gridnode::app::ports::ConfigPort;
use gridnode::config::NodeConfig;
use gridnode::drivers::direction_pins::DirectionPins;
use gridnode::drivers::role_strap::read_role;
use gridnode::pins;
use gridnode::protocol::{Crc8, NodeType};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  GridNode v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = NvsAdapter::new().map_err(|e| anyhow::anyhow!("NVS init failed: {e}"))?;
    let config = match nvs.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            NodeConfig::default()
        }
    };

    // ── 3. Board bring-up and role ────────────────────────────
    let crc = Crc8::new(config.crc_polynomial);
    let mut board = BoardAdapter::new(crc, config.broadcast_id)
        .map_err(|e| anyhow::anyhow!("board init failed: {e}"))?;
    let role = read_role(&mut board, &pins::ROLE_STRAP_GPIOS);

    if role == NodeType::MasterPanel {
        board.set_sender(config.master_id);
        run_master(config, board, nvs)
    } else {
        run_node(config, role, board, nvs)
    }
}

fn run_master(config: NodeConfig, mut board: BoardAdapter, mut nvs: NvsAdapter) -> Result<()> {
    let clock = Clock::new();
    let mut sink = LogEventSink::new();
    let period = Duration::from_millis(u64::from(config.loop_interval_ms));
    let mut master = MasterService::new(config, DirectionPins::board());
    master.start(&mut board, &nvs, &mut sink);

    info!("Master ready. Entering main loop.");
    loop {
        master.tick(clock.now_ms(), &mut board, &mut nvs, &mut sink);
        std::thread::sleep(period);
    }
}

fn run_node(config: NodeConfig, role: NodeType, mut board: BoardAdapter, mut nvs: NvsAdapter) -> Result<()> {
    let clock = Clock::new();
    let mut sink = LogEventSink::new();
    let period = Duration::from_millis(u64::from(config.loop_interval_ms));
    let mut node = NodeService::new(config, role, DirectionPins::board());
    node.start(&nvs, &mut board, &mut sink);

    info!("Node ({:?}) ready. Entering main loop.", role);
    loop {
        node.tick(clock.now_ms(), &mut board, &mut nvs, &mut sink);
        if let Some(id) = node.node_id() {
            board.set_sender(id);
        }
        std::thread::sleep(period);
    }
}
