//! Unified error types for the grid node firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! control loop's error handling uniform. All variants are `Copy` so they can
//! be passed through the services without allocation.

use core::fmt;

use crate::app::ports::{BusError, ConfigError, StorageError};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The multi-drop bus rejected a frame.
    Bus(BusError),
    /// Persistent storage failed.
    Storage(StorageError),
    /// A packet or host line could not be decoded.
    Protocol(ProtocolError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::NotFound => Self::Config("config not found"),
            ConfigError::Corrupted => Self::Config("config corrupted"),
            ConfigError::StorageFull => Self::Config("storage full"),
            ConfigError::IoError => Self::Config("config I/O error"),
        }
    }
}

// ---------------------------------------------------------------------------
// Protocol errors
// ---------------------------------------------------------------------------

/// Decode failures for bus packets and host-facing serial lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame carried no bytes at all.
    Empty,
    /// Leading command byte is not in the command table for this link.
    UnknownCommand(u8),
    /// Payload shorter than the fixed layout for its command.
    Truncated { expected: usize, actual: usize },
    /// Direction index outside 0..=3.
    BadDirection(u8),
    /// Component kind character not one of `B`, `P`, `R`.
    BadComponentKind(u8),
    /// Bounds field was NaN or infinite.
    NonFiniteBounds,
    /// Trailing CRC8 did not match the line contents.
    ChecksumMismatch { expected: u8, actual: u8 },
    /// Host line did not follow the `<cmd> <fields> <crc>` shape.
    MalformedLine,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty frame"),
            Self::UnknownCommand(b) => write!(f, "unknown command byte 0x{b:02x}"),
            Self::Truncated { expected, actual } => {
                write!(f, "truncated payload ({actual} of {expected} bytes)")
            }
            Self::BadDirection(d) => write!(f, "bad direction index {d}"),
            Self::BadComponentKind(k) => write!(f, "bad component kind 0x{k:02x}"),
            Self::NonFiniteBounds => write!(f, "non-finite bounds"),
            Self::ChecksumMismatch { expected, actual } => {
                write!(f, "checksum mismatch (expected {expected}, got {actual})")
            }
            Self::MalformedLine => write!(f, "malformed host line"),
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
