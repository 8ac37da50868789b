//! Port traits — the hexagonal boundary between the grid protocol and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ NodeService / MasterService (domain)
//! ```
//!
//! Driven adapters (GPIO, bus, serial, storage, event sinks) implement these
//! traits. The services consume them via generics, so the protocol core never
//! touches hardware directly and runs unchanged under `cargo test`.

use embedded_hal::digital::PinState;

use crate::config::NodeConfig;

// ───────────────────────────────────────────────────────────────
// GPIO / ADC port (driven adapter: domain ↔ pins)
// ───────────────────────────────────────────────────────────────

/// Electrical configuration of a single pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    /// Input with the internal pull-up enabled.
    InputPullUp,
    /// Output. Boards may drive it open-drain, so `High` only has to
    /// release the line.
    Output,
    /// ADC input.
    Analog,
}

/// Raw pin access. Pin numbers are board GPIO numbers.
pub trait GpioPort {
    fn configure_pin(&mut self, pin: i32, mode: PinMode);

    fn read_digital(&mut self, pin: i32) -> PinState;

    fn write_digital(&mut self, pin: i32, level: PinState);

    /// Raw ADC sample in `0..=adc_full_scale`.
    fn read_analog(&mut self, pin: i32) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Bus port (driven adapter: domain ↔ multi-drop bus)
// ───────────────────────────────────────────────────────────────

/// Largest frame the bus carries.
pub const MAX_FRAME: usize = 32;

/// One frame as delivered by the bus. Frames are never partial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusFrame {
    pub sender: u8,
    pub dest: u8,
    pub bytes: heapless::Vec<u8, MAX_FRAME>,
}

/// Best-effort multi-drop bus. No acknowledgement or retry.
pub trait BusPort {
    fn send(&mut self, dest: u8, bytes: &[u8]) -> Result<(), BusError>;

    /// Next pending inbound frame, if any. Never blocks.
    fn receive(&mut self) -> Option<BusFrame>;
}

// ───────────────────────────────────────────────────────────────
// Serial port (driven adapter: master ↔ host)
// ───────────────────────────────────────────────────────────────

/// Line-oriented link to the host application.
pub trait SerialPort {
    /// Write one complete, already terminated line.
    fn write_line(&mut self, line: &str);

    /// Drain pending inbound bytes into `buf`. Returns the count read.
    fn read(&mut self, buf: &mut [u8]) -> usize;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the node tunables.
///
/// Implementations MUST run [`validate_config`](crate::config::validate_config)
/// before persisting and reject invalid values with
/// [`ConfigError::ValidationFailed`] rather than clamping them.
pub trait ConfigPort {
    /// Returns [`NodeConfig::default()`] if nothing is stored.
    fn load(&self) -> Result<NodeConfig, ConfigError>;

    fn save(&self, config: &NodeConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value blob storage.
///
/// Write operations MUST be atomic: no partial writes on power loss.
pub trait StoragePort {
    /// Read a value. Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key. Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`BusPort::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Medium busy; the frame was not sent.
    Busy,
    /// Frame larger than [`MAX_FRAME`].
    TooLong,
    /// Transceiver or UART fault.
    IoError,
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    StorageFull,
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    NotFound,
    Full,
    IoError,
    /// Caller buffer smaller than the stored blob.
    BufferTooSmall,
}

impl core::fmt::Display for BusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Busy => write!(f, "bus busy"),
            Self::TooLong => write!(f, "frame too long"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
        }
    }
}
