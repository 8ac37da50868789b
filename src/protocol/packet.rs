//! Binary bus packets between master and nodes.
//!
//! ```text
//! master → node   [cmd][fields…]
//! node → master   [component_id][sender_id][cmd][fields…]
//! ```
//!
//! The two leading bytes of an upstream frame are added by the
//! [`Slave`](crate::transport::Slave) wrapper. Multi-byte fields are
//! little-endian. Bus frames carry no CRC; the bus framing has its own.

use heapless::Vec;

use super::command::{Command, CommandTable, Link};
use super::direction::{Direction, DirectionSet};
use super::node_type::NodeType;
use super::records::{BoundsData, ComponentKind, Data};
use crate::error::ProtocolError;

/// Largest encoded packet (a bounds update).
pub const MAX_PACKET: usize = 16;
/// Component id used for node-level upstream messages.
pub const NODE_LEVEL_COMPONENT: u8 = 0xFF;
/// Direction byte of a `dirInstruction` that releases every line.
pub const RELEASE_ALL: u8 = 0xFF;

pub type Packet = Vec<u8, MAX_PACKET>;

fn put(buf: &mut Packet, bytes: &[u8]) {
    let fits = buf.extend_from_slice(bytes).is_ok();
    debug_assert!(fits, "packet layout exceeds MAX_PACKET");
}

fn need(bytes: &[u8], expected: usize) -> Result<(), ProtocolError> {
    if bytes.len() < expected {
        return Err(ProtocolError::Truncated {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

fn f32_at(bytes: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

// ───────────────────────────────────────────────────────────────
// Master → node
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Downstream {
    /// Adopt this id if unconfigured and one of your lines is held low.
    AssignId(u8),
    /// Pull one side low, or release every side with `None`.
    DirInstruction(Option<Direction>),
    /// Discovery finished.
    CsCompleted,
    /// Lines to watch for disconnection and lines to hold low for children.
    DirToCheck {
        watch: DirectionSet,
        hold: DirectionSet,
    },
    /// Final role assignment.
    Configure(NodeType),
    Bounds(BoundsData),
    Start,
    Quit,
    Reset,
}

impl Downstream {
    pub fn command(&self) -> Command {
        match self {
            Self::AssignId(_) => Command::IdPacket,
            Self::DirInstruction(_) => Command::DirInstruction,
            Self::CsCompleted => Command::CsCompleted,
            Self::DirToCheck { .. } => Command::DirToCheck,
            Self::Configure(_) => Command::Configure,
            Self::Bounds(_) => Command::Bounds,
            Self::Start => Command::Start,
            Self::Quit => Command::Quit,
            Self::Reset => Command::Reset,
        }
    }

    pub fn encode(&self, table: &CommandTable) -> Packet {
        let mut buf = Packet::new();
        put(&mut buf, &[table.byte(self.command())]);
        match self {
            Self::AssignId(id) => put(&mut buf, &[*id]),
            Self::DirInstruction(dir) => {
                put(&mut buf, &[dir.map_or(RELEASE_ALL, |d| d as u8)]);
            }
            Self::DirToCheck { watch, hold } => put(&mut buf, &[watch.bits(), hold.bits()]),
            Self::Configure(t) => put(&mut buf, &[t.to_wire()]),
            Self::Bounds(b) => {
                put(&mut buf, &[b.kind.wire_char(), b.component_id]);
                put(&mut buf, &b.min.to_le_bytes());
                put(&mut buf, &b.max.to_le_bytes());
                put(&mut buf, &b.step.to_le_bytes());
            }
            Self::CsCompleted | Self::Start | Self::Quit | Self::Reset => {}
        }
        buf
    }

    pub fn decode(table: &CommandTable, bytes: &[u8]) -> Result<Self, ProtocolError> {
        let (&cmd_byte, body) = bytes.split_first().ok_or(ProtocolError::Empty)?;
        let cmd = table
            .lookup(Link::Downstream, cmd_byte)
            .ok_or(ProtocolError::UnknownCommand(cmd_byte))?;

        Ok(match cmd {
            Command::IdPacket => {
                need(body, 1)?;
                Self::AssignId(body[0])
            }
            Command::DirInstruction => {
                need(body, 1)?;
                match body[0] {
                    RELEASE_ALL => Self::DirInstruction(None),
                    raw => Self::DirInstruction(Some(Direction::from_index(raw)?)),
                }
            }
            Command::DirToCheck => {
                need(body, 2)?;
                Self::DirToCheck {
                    watch: DirectionSet::from_bits(body[0]),
                    hold: DirectionSet::from_bits(body[1]),
                }
            }
            Command::Configure => {
                need(body, 1)?;
                Self::Configure(NodeType::from_wire(body[0]))
            }
            Command::Bounds => {
                need(body, 14)?;
                Self::Bounds(
                    BoundsData {
                        kind: ComponentKind::from_wire(body[0])?,
                        component_id: body[1],
                        min: f32_at(body, 2),
                        max: f32_at(body, 6),
                        step: f32_at(body, 10),
                    }
                    .check_finite()?,
                )
            }
            Command::CsCompleted => Self::CsCompleted,
            Command::Start => Self::Start,
            Command::Quit => Self::Quit,
            Command::Reset => Self::Reset,
            other => return Err(ProtocolError::UnknownCommand(table.byte(other))),
        })
    }
}

// ───────────────────────────────────────────────────────────────
// Node → master
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Upstream {
    /// Reply to an id packet: the adopting node's role and the side it was probed on.
    NodeConnected { node_type: NodeType, entry: Direction },
    NodeDisconnected(Direction),
    Value { kind: ComponentKind, value: f32 },
}

impl Upstream {
    pub fn command(&self) -> Command {
        match self {
            Self::NodeConnected { .. } => Command::NodeConnected,
            Self::NodeDisconnected(_) => Command::NodeDisconnected,
            Self::Value { .. } => Command::ComponentValue,
        }
    }

    /// Payload handed to the Slave wrapper (without id prefix).
    pub fn encode_payload(&self, table: &CommandTable) -> Packet {
        let mut buf = Packet::new();
        put(&mut buf, &[table.byte(self.command())]);
        match self {
            Self::NodeConnected { node_type, entry } => {
                put(&mut buf, &[node_type.to_wire(), *entry as u8]);
            }
            Self::NodeDisconnected(dir) => put(&mut buf, &[*dir as u8]),
            Self::Value { kind, value } => {
                put(&mut buf, &[kind.wire_char()]);
                put(&mut buf, &value.to_le_bytes());
            }
        }
        buf
    }
}

/// A decoded upstream frame including the Slave prefix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpstreamFrame {
    pub component_id: u8,
    pub sender_id: u8,
    pub message: Upstream,
}

impl UpstreamFrame {
    pub fn decode(table: &CommandTable, bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.is_empty() {
            return Err(ProtocolError::Empty);
        }
        need(bytes, 3)?;
        let (component_id, sender_id, cmd_byte) = (bytes[0], bytes[1], bytes[2]);
        let body = &bytes[3..];
        let cmd = table
            .lookup(Link::Upstream, cmd_byte)
            .ok_or(ProtocolError::UnknownCommand(cmd_byte))?;

        let message = match cmd {
            Command::NodeConnected => {
                need(body, 2)?;
                Upstream::NodeConnected {
                    node_type: NodeType::from_wire(body[0]),
                    entry: Direction::from_index(body[1])?,
                }
            }
            Command::NodeDisconnected => {
                need(body, 1)?;
                Upstream::NodeDisconnected(Direction::from_index(body[0])?)
            }
            Command::ComponentValue => {
                need(body, 5)?;
                Upstream::Value {
                    kind: ComponentKind::from_wire(body[0])?,
                    value: f32_at(body, 1),
                }
            }
            other => return Err(ProtocolError::UnknownCommand(table.byte(other))),
        };

        Ok(Self {
            component_id,
            sender_id,
            message,
        })
    }

    /// The telemetry record carried by a value frame.
    pub fn as_data(&self) -> Option<Data> {
        match self.message {
            Upstream::Value { kind, value } => Some(Data {
                node_id: self.sender_id,
                id: self.component_id,
                kind,
                value,
            }),
            _ => None,
        }
    }
}
