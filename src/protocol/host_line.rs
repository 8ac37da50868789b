//! Checksummed ASCII lines between the master and the host.
//!
//! ```text
//! <cmd>[ <fields>] <crc>\r\n
//! ```
//!
//! `<crc>` is the decimal CRC-8 of every byte before the final space. Both
//! directions use the same framing; the host discards lines whose checksum
//! does not match, and so does the master.

use core::fmt::Write as _;

use super::command::{Command, CommandTable, Link};
use super::crc8::Crc8;
use super::direction::{Direction, Position};
use super::node_type::NodeType;
use super::records::{BoundsData, ComponentKind, Data};
use crate::error::ProtocolError;

pub const LINE_END: &str = "\r\n";

/// Master → host records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostLine {
    NodeInfo {
        id: u8,
        node_type: NodeType,
        position: Position,
    },
    CsCompleted {
        count: u8,
    },
    Value(Data),
    Disconnected {
        node_id: u8,
        dir: Direction,
    },
}

/// Host → master commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostCommand {
    Start,
    Quit,
    Reset,
    Bounds { node_id: u8, bounds: BoundsData },
}

fn frame(crc: &Crc8, body: &str) -> String {
    let mut line = String::with_capacity(body.len() + 6);
    line.push_str(body);
    let _ = write!(line, " {}{LINE_END}", crc.compute(body.as_bytes()));
    line
}

/// Check the trailing CRC and split off the command byte.
fn unframe<'a>(crc: &Crc8, line: &'a str) -> Result<(u8, &'a str), ProtocolError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return Err(ProtocolError::Empty);
    }
    let (body, crc_text) = line.rsplit_once(' ').ok_or(ProtocolError::MalformedLine)?;
    let actual: u8 = crc_text.parse().map_err(|_| ProtocolError::MalformedLine)?;
    let expected = crc.compute(body.as_bytes());
    if expected != actual {
        return Err(ProtocolError::ChecksumMismatch { expected, actual });
    }

    let bytes = body.as_bytes();
    let cmd = *bytes.first().ok_or(ProtocolError::MalformedLine)?;
    let fields = match bytes.get(1) {
        None => "",
        Some(b' ') => &body[2..],
        Some(_) => return Err(ProtocolError::MalformedLine),
    };
    Ok((cmd, fields))
}

fn field<T: core::str::FromStr>(text: Option<&str>) -> Result<T, ProtocolError> {
    text.ok_or(ProtocolError::MalformedLine)?
        .trim()
        .parse()
        .map_err(|_| ProtocolError::MalformedLine)
}

fn kind_field(text: Option<&str>) -> Result<ComponentKind, ProtocolError> {
    match text.map(str::as_bytes) {
        Some([c]) => ComponentKind::from_wire(*c),
        _ => Err(ProtocolError::MalformedLine),
    }
}

fn no_more(mut rest: core::str::Split<'_, char>) -> Result<(), ProtocolError> {
    match rest.next() {
        None => Ok(()),
        Some(_) => Err(ProtocolError::MalformedLine),
    }
}

// ───────────────────────────────────────────────────────────────
// Master → host
// ───────────────────────────────────────────────────────────────

impl HostLine {
    pub fn command(&self) -> Command {
        match self {
            Self::NodeInfo { .. } => Command::NodeInfo,
            Self::CsCompleted { .. } => Command::CsCompleted,
            Self::Value(_) => Command::ComponentValue,
            Self::Disconnected { .. } => Command::NodeDisconnected,
        }
    }

    /// Full line including checksum and terminator.
    pub fn encode(&self, table: &CommandTable, crc: &Crc8) -> String {
        let mut body = String::new();
        body.push(char::from(table.byte(self.command())));
        let _ = match self {
            Self::NodeInfo {
                id,
                node_type,
                position,
            } => write!(
                body,
                " {id}:{}:{},{}",
                node_type.to_wire(),
                position.x,
                position.y
            ),
            Self::CsCompleted { count } => write!(body, " {count}"),
            Self::Value(d) => write!(
                body,
                " {}:{}:{}:{}",
                d.node_id,
                char::from(d.kind.wire_char()),
                d.id,
                d.value
            ),
            Self::Disconnected { node_id, dir } => write!(body, " {node_id}:{}", *dir as u8),
        };
        frame(crc, &body)
    }
}

/// Validate and parse one master → host line.
pub fn decode_line(table: &CommandTable, crc: &Crc8, line: &str) -> Result<HostLine, ProtocolError> {
    let (cmd_byte, fields) = unframe(crc, line)?;
    let cmd = table
        .lookup(Link::Serial, cmd_byte)
        .ok_or(ProtocolError::UnknownCommand(cmd_byte))?;

    match cmd {
        Command::NodeInfo => {
            let mut parts = fields.split(':');
            let id = field(parts.next())?;
            let node_type = NodeType::from_wire(field(parts.next())?);
            let (x, y) = parts
                .next()
                .and_then(|p| p.split_once(','))
                .ok_or(ProtocolError::MalformedLine)?;
            no_more(parts)?;
            Ok(HostLine::NodeInfo {
                id,
                node_type,
                position: Position::new(field(Some(x))?, field(Some(y))?),
            })
        }
        Command::CsCompleted => Ok(HostLine::CsCompleted {
            count: field(Some(fields))?,
        }),
        Command::ComponentValue => {
            let mut parts = fields.split(':');
            let node_id = field(parts.next())?;
            let kind = kind_field(parts.next())?;
            let id = field(parts.next())?;
            let value = field(parts.next())?;
            no_more(parts)?;
            Ok(HostLine::Value(Data {
                node_id,
                id,
                kind,
                value,
            }))
        }
        Command::NodeDisconnected => {
            let mut parts = fields.split(':');
            let node_id = field(parts.next())?;
            let dir = Direction::from_index(field(parts.next())?)?;
            no_more(parts)?;
            Ok(HostLine::Disconnected { node_id, dir })
        }
        _ => Err(ProtocolError::UnknownCommand(cmd_byte)),
    }
}

// ───────────────────────────────────────────────────────────────
// Host → master
// ───────────────────────────────────────────────────────────────

impl HostCommand {
    pub fn command(&self) -> Command {
        match self {
            Self::Start => Command::Start,
            Self::Quit => Command::Quit,
            Self::Reset => Command::Reset,
            Self::Bounds { .. } => Command::Bounds,
        }
    }

    pub fn encode(&self, table: &CommandTable, crc: &Crc8) -> String {
        let mut body = String::new();
        body.push(char::from(table.byte(self.command())));
        if let Self::Bounds { node_id, bounds } = self {
            let _ = write!(
                body,
                " {node_id}:{}:{}:{}:{}:{}",
                char::from(bounds.kind.wire_char()),
                bounds.component_id,
                bounds.min,
                bounds.max,
                bounds.step
            );
        }
        frame(crc, &body)
    }

    /// Validate and parse one host → master line.
    pub fn decode(table: &CommandTable, crc: &Crc8, line: &str) -> Result<Self, ProtocolError> {
        let (cmd_byte, fields) = unframe(crc, line)?;
        let cmd = table
            .lookup(Link::Serial, cmd_byte)
            .ok_or(ProtocolError::UnknownCommand(cmd_byte))?;

        match cmd {
            Command::Start => Ok(Self::Start),
            Command::Quit => Ok(Self::Quit),
            Command::Reset => Ok(Self::Reset),
            Command::Bounds => {
                let mut parts = fields.split(':');
                let node_id = field(parts.next())?;
                let kind = kind_field(parts.next())?;
                let component_id = field(parts.next())?;
                let min = field(parts.next())?;
                let max = field(parts.next())?;
                let step = field(parts.next())?;
                no_more(parts)?;
                let bounds = BoundsData {
                    kind,
                    component_id,
                    min,
                    max,
                    step,
                }
                .check_finite()?;
                Ok(Self::Bounds { node_id, bounds })
            }
            _ => Err(ProtocolError::UnknownCommand(cmd_byte)),
        }
    }
}
