//! Simulated grid for integration tests.
//!
//! Every board has its own pin space. A direction line is wired-AND with
//! the opposite side of the neighbouring cell, every powered board sits on
//! one shared bus, and the master's serial port is a pair of in-memory
//! buffers. Time only moves when the test calls [`SimGrid::step`].

use std::collections::{HashMap, VecDeque};

use embedded_hal::digital::PinState;
use gridnode::adapters::nvs::NvsAdapter;
use gridnode::app::events::AppEvent;
use gridnode::app::master_service::MasterService;
use gridnode::app::node_service::NodeService;
use gridnode::app::ports::{BusError, BusFrame, BusPort, EventSink, GpioPort, PinMode, SerialPort};
use gridnode::config::NodeConfig;
use gridnode::drivers::direction_pins::DirectionPins;
use gridnode::pins;
use gridnode::protocol::{CommandTable, Crc8, Direction, HostCommand, HostLine, NodeType, Position, decode_line};

/// Simulated loop period.
pub const STEP_MS: u32 = 5;

fn direction_of(pin: i32) -> Option<Direction> {
    pins::DIRECTION_GPIOS
        .iter()
        .position(|&g| g == pin)
        .map(|i| Direction::ALL[i])
}

// ── Boards and wiring ─────────────────────────────────────────

#[derive(Default)]
pub struct MockBoard {
    pub position: Position,
    pub powered: bool,
    outputs: [bool; Direction::COUNT],
    drive_low: [bool; Direction::COUNT],
    inputs: HashMap<i32, PinState>,
    analog: HashMap<i32, u16>,
    inbox: VecDeque<BusFrame>,
}

impl MockBoard {
    fn at(position: Position) -> Self {
        Self {
            position,
            powered: true,
            ..Self::default()
        }
    }

    /// Pin reset, as after a power cycle.
    fn reset(&mut self) {
        self.outputs = [false; Direction::COUNT];
        self.drive_low = [false; Direction::COUNT];
        self.inbox.clear();
    }
}

#[derive(Default)]
pub struct World {
    pub boards: Vec<MockBoard>,
    host_in: VecDeque<u8>,
    pub host_out: Vec<String>,
}

impl World {
    fn neighbour(&self, idx: usize, dir: Direction) -> Option<&MockBoard> {
        let cell = self.boards[idx].position.step(dir)?;
        self.boards.iter().find(|b| b.powered && b.position == cell)
    }

    /// Either end pulling low wins.
    pub fn line_low(&self, idx: usize, dir: Direction) -> bool {
        self.boards[idx].drive_low[dir.index()]
            || self
                .neighbour(idx, dir)
                .is_some_and(|n| n.drive_low[dir.opposite().index()])
    }
}

/// One board's view of the world; implements every hardware port.
pub struct Port<'a> {
    pub world: &'a mut World,
    pub idx: usize,
}

impl GpioPort for Port<'_> {
    fn configure_pin(&mut self, pin: i32, mode: PinMode) {
        let board = &mut self.world.boards[self.idx];
        if let Some(dir) = direction_of(pin) {
            let output = mode == PinMode::Output;
            board.outputs[dir.index()] = output;
            if !output {
                board.drive_low[dir.index()] = false;
            }
        }
    }

    fn read_digital(&mut self, pin: i32) -> PinState {
        if let Some(dir) = direction_of(pin) {
            return PinState::from(!self.world.line_low(self.idx, dir));
        }
        self.world.boards[self.idx]
            .inputs
            .get(&pin)
            .copied()
            .unwrap_or(PinState::High)
    }

    fn write_digital(&mut self, pin: i32, level: PinState) {
        let board = &mut self.world.boards[self.idx];
        if let Some(dir) = direction_of(pin) {
            if board.outputs[dir.index()] {
                board.drive_low[dir.index()] = level == PinState::Low;
            }
        }
    }

    fn read_analog(&mut self, pin: i32) -> u16 {
        self.world.boards[self.idx].analog.get(&pin).copied().unwrap_or(0)
    }
}

impl BusPort for Port<'_> {
    fn send(&mut self, dest: u8, bytes: &[u8]) -> Result<(), BusError> {
        let frame = BusFrame {
            sender: self.idx as u8,
            dest,
            bytes: heapless::Vec::from_slice(bytes).map_err(|()| BusError::TooLong)?,
        };
        for (i, board) in self.world.boards.iter_mut().enumerate() {
            if i != self.idx && board.powered {
                board.inbox.push_back(frame.clone());
            }
        }
        Ok(())
    }

    fn receive(&mut self) -> Option<BusFrame> {
        self.world.boards[self.idx].inbox.pop_front()
    }
}

impl SerialPort for Port<'_> {
    fn write_line(&mut self, line: &str) {
        self.world.host_out.push(line.to_owned());
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut n = 0;
        while n < buf.len() {
            let Some(byte) = self.world.host_in.pop_front() else {
                break;
            };
            buf[n] = byte;
            n += 1;
        }
        n
    }
}

// ── Event recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct Recorder {
    pub events: Vec<AppEvent>,
}

impl EventSink for Recorder {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

// ── The grid ──────────────────────────────────────────────────

pub struct SimNode {
    pub service: NodeService,
    pub hardware_type: NodeType,
    pub store: NvsAdapter,
    pub events: Recorder,
}

pub struct SimGrid {
    pub world: World,
    pub master: MasterService,
    pub master_store: NvsAdapter,
    pub master_events: Recorder,
    /// `nodes[i]` runs on `world.boards[i + 1]`.
    pub nodes: Vec<SimNode>,
    pub now_ms: u32,
    table: CommandTable,
    crc: Crc8,
}

#[allow(dead_code)]
impl SimGrid {
    /// Master at the origin plus one node per `(cell, type)`, all started.
    pub fn new(layout: &[(Position, NodeType)]) -> Self {
        let config = NodeConfig::default();
        let mut world = World::default();
        world.boards.push(MockBoard::at(Position::ORIGIN));
        let nodes = layout
            .iter()
            .map(|&(position, hardware_type)| {
                world.boards.push(MockBoard::at(position));
                SimNode {
                    service: NodeService::new(config.clone(), hardware_type, DirectionPins::board()),
                    hardware_type,
                    store: NvsAdapter::new().expect("in-memory NVS"),
                    events: Recorder::default(),
                }
            })
            .collect();

        let mut grid = Self {
            world,
            master: MasterService::new(config.clone(), DirectionPins::board()),
            master_store: NvsAdapter::new().expect("in-memory NVS"),
            master_events: Recorder::default(),
            nodes,
            now_ms: 0,
            table: CommandTable::default(),
            crc: Crc8::new(config.crc_polynomial),
        };
        grid.start_all();
        grid
    }

    fn start_all(&mut self) {
        self.master.start(
            &mut Port {
                world: &mut self.world,
                idx: 0,
            },
            &self.master_store,
            &mut self.master_events,
        );
        for (i, node) in self.nodes.iter_mut().enumerate() {
            node.service.start(
                &node.store,
                &mut Port {
                    world: &mut self.world,
                    idx: i + 1,
                },
                &mut node.events,
            );
        }
    }

    /// Reboot every board, keeping what each one persisted.
    pub fn power_cycle(&mut self) {
        let config = NodeConfig::default();
        for board in &mut self.world.boards {
            board.reset();
        }
        self.master = MasterService::new(config.clone(), DirectionPins::board());
        for node in &mut self.nodes {
            node.service = NodeService::new(config.clone(), node.hardware_type, DirectionPins::board());
        }
        self.start_all();
    }

    /// One loop iteration on every powered board, master first.
    pub fn step(&mut self) {
        self.now_ms += STEP_MS;
        self.master.tick(
            self.now_ms,
            &mut Port {
                world: &mut self.world,
                idx: 0,
            },
            &mut self.master_store,
            &mut self.master_events,
        );
        for (i, node) in self.nodes.iter_mut().enumerate() {
            if !self.world.boards[i + 1].powered {
                continue;
            }
            node.service.tick(
                self.now_ms,
                &mut Port {
                    world: &mut self.world,
                    idx: i + 1,
                },
                &mut node.store,
                &mut node.events,
            );
        }
    }

    /// Step until `done` holds. Returns `false` after `max_steps`.
    pub fn run_until(&mut self, max_steps: usize, done: impl Fn(&Self) -> bool) -> bool {
        for _ in 0..max_steps {
            if done(self) {
                return true;
            }
            self.step();
        }
        done(self)
    }

    pub fn run(&mut self, steps: usize) {
        for _ in 0..steps {
            self.step();
        }
    }

    // ── Host link ─────────────────────────────────────────────

    pub fn send_host(&mut self, cmd: HostCommand) {
        let line = cmd.encode(&self.table, &self.crc);
        self.world.host_in.extend(line.bytes());
    }

    pub fn send_host_raw(&mut self, line: &str) {
        self.world.host_in.extend(line.bytes());
    }

    /// Every host line written so far, decoded and checksum-verified.
    pub fn host_lines(&self) -> Vec<HostLine> {
        self.world
            .host_out
            .iter()
            .map(|l| decode_line(&self.table, &self.crc, l).expect("valid host line"))
            .collect()
    }

    pub fn clear_host_output(&mut self) {
        self.world.host_out.clear();
    }

    // ── Board pokes ───────────────────────────────────────────

    /// Board index of node `n` (the master is board 0).
    pub const fn board_of(n: usize) -> usize {
        n + 1
    }

    pub fn set_input(&mut self, board: usize, pin: i32, level: PinState) {
        self.world.boards[board].inputs.insert(pin, level);
    }

    pub fn set_analog(&mut self, board: usize, pin: i32, raw: u16) {
        self.world.boards[board].analog.insert(pin, raw);
    }

    /// Pull the board out of the grid: its lines float and it stops running.
    pub fn unplug(&mut self, board: usize) {
        let b = &mut self.world.boards[board];
        b.powered = false;
        b.reset();
    }
}
