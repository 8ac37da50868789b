//! Byte framing for the multi-drop UART bus.
//!
//! Wire format:
//! ```text
//! ┌──────┬──────┬────────┬─────┬─────────────────┬──────┐
//! │ 0xA5 │ dest │ sender │ len │ payload (len B) │ crc8 │
//! └──────┴──────┴────────┴─────┴─────────────────┴──────┘
//! ```
//!
//! The CRC covers `dest` through the last payload byte. The decoder
//! accumulates bytes one at a time and yields complete frames; on a bad
//! length or checksum it drops back to hunting for the sync byte, so a
//! corrupted frame never surfaces as a partial one.

use heapless::Vec;
use log::debug;

use crate::app::ports::{BusFrame, MAX_FRAME};
use crate::protocol::Crc8;

pub const SYNC: u8 = 0xA5;

/// Sync, dest, sender, len.
const HEADER_SIZE: usize = 4;

/// Largest encoded frame on the wire.
pub const MAX_WIRE_FRAME: usize = HEADER_SIZE + MAX_FRAME + 1;

/// Decoder state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    /// Hunting for [`SYNC`].
    Sync,
    Dest,
    Sender { dest: u8 },
    Length { dest: u8, sender: u8 },
    Payload { dest: u8, sender: u8, expected: usize },
    Checksum { dest: u8, sender: u8 },
}

/// Streaming bus frame decoder.
pub struct FrameDecoder {
    state: DecoderState,
    crc: Crc8,
    running: u8,
    payload: Vec<u8, MAX_FRAME>,
    /// Frames dropped for a bad length or checksum since construction.
    rejected: u32,
}

impl FrameDecoder {
    pub fn new(crc: Crc8) -> Self {
        Self {
            state: DecoderState::Sync,
            crc,
            running: 0,
            payload: Vec::new(),
            rejected: 0,
        }
    }

    pub const fn rejected(&self) -> u32 {
        self.rejected
    }

    /// Feed one byte. Returns a frame when `byte` completes one.
    pub fn push(&mut self, byte: u8) -> Option<BusFrame> {
        match self.state {
            DecoderState::Sync => {
                if byte == SYNC {
                    self.running = 0;
                    self.payload.clear();
                    self.state = DecoderState::Dest;
                }
            }
            DecoderState::Dest => {
                self.running = self.crc.update(self.running, byte);
                self.state = DecoderState::Sender { dest: byte };
            }
            DecoderState::Sender { dest } => {
                self.running = self.crc.update(self.running, byte);
                self.state = DecoderState::Length { dest, sender: byte };
            }
            DecoderState::Length { dest, sender } => {
                let expected = usize::from(byte);
                if expected == 0 || expected > MAX_FRAME {
                    self.reject("length");
                    return None;
                }
                self.running = self.crc.update(self.running, byte);
                self.state = DecoderState::Payload {
                    dest,
                    sender,
                    expected,
                };
            }
            DecoderState::Payload {
                dest,
                sender,
                expected,
            } => {
                self.running = self.crc.update(self.running, byte);
                // Capacity checked against `expected` above.
                let _ = self.payload.push(byte);
                if self.payload.len() == expected {
                    self.state = DecoderState::Checksum { dest, sender };
                }
            }
            DecoderState::Checksum { dest, sender } => {
                self.state = DecoderState::Sync;
                if byte != self.running {
                    self.reject("checksum");
                    return None;
                }
                return Some(BusFrame {
                    sender,
                    dest,
                    bytes: core::mem::take(&mut self.payload),
                });
            }
        }
        None
    }

    /// Drop any partial frame (e.g. after a UART overrun).
    pub fn reset(&mut self) {
        self.state = DecoderState::Sync;
        self.payload.clear();
    }

    fn reject(&mut self, what: &str) {
        self.rejected = self.rejected.wrapping_add(1);
        debug!("bus frame rejected: bad {what}");
        self.reset();
    }
}

/// Encode one frame. `None` if the payload is empty or too long.
pub fn encode_frame(crc: &Crc8, sender: u8, dest: u8, payload: &[u8]) -> Option<Vec<u8, MAX_WIRE_FRAME>> {
    if payload.is_empty() || payload.len() > MAX_FRAME {
        return None;
    }
    let mut out = Vec::new();
    out.extend_from_slice(&[SYNC, dest, sender, payload.len() as u8]).ok()?;
    out.extend_from_slice(payload).ok()?;
    let check = crc.compute(&out[1..]);
    out.push(check).ok()?;
    Some(out)
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn arbitrary_bytes_never_panic(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let mut dec = FrameDecoder::new(Crc8::new(0x07));
            for b in data {
                if let Some(frame) = dec.push(b) {
                    prop_assert!(!frame.bytes.is_empty());
                }
            }
        }
    }
}
