//! Command alphabet shared by master, nodes and host.
//!
//! Two pairs of commands reuse a byte value: `nodeInfo`/`dirInstruction`
//! (`N`) and `nodeDisconnected`/`dirToCheck` (`D`). They never travel on the
//! same link in the same direction, so every lookup is qualified by a [`Link`].

/// What a packet is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Configure,
    NodeInfo,
    NodeConnected,
    NodeDisconnected,
    ComponentValue,
    Start,
    Quit,
    Reset,
    IdPacket,
    DirInstruction,
    CsCompleted,
    DirToCheck,
    Bounds,
}

/// The path a packet travels on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    /// Master to node over the bus.
    Downstream,
    /// Node to master over the bus.
    Upstream,
    /// Master and host over the serial line, either way.
    Serial,
}

impl Command {
    pub const ALL: [Command; 13] = [
        Self::Configure,
        Self::NodeInfo,
        Self::NodeConnected,
        Self::NodeDisconnected,
        Self::ComponentValue,
        Self::Start,
        Self::Quit,
        Self::Reset,
        Self::IdPacket,
        Self::DirInstruction,
        Self::CsCompleted,
        Self::DirToCheck,
        Self::Bounds,
    ];

    /// Whether this command may appear on `link`.
    pub const fn travels_on(self, link: Link) -> bool {
        match link {
            Link::Downstream => matches!(
                self,
                Self::Configure
                    | Self::IdPacket
                    | Self::DirInstruction
                    | Self::CsCompleted
                    | Self::DirToCheck
                    | Self::Bounds
                    | Self::Start
                    | Self::Quit
                    | Self::Reset
            ),
            Link::Upstream => matches!(
                self,
                Self::NodeConnected | Self::NodeDisconnected | Self::ComponentValue
            ),
            Link::Serial => matches!(
                self,
                Self::NodeInfo
                    | Self::NodeConnected
                    | Self::NodeDisconnected
                    | Self::ComponentValue
                    | Self::CsCompleted
                    | Self::Start
                    | Self::Quit
                    | Self::Reset
                    | Self::Bounds
                    | Self::Configure
            ),
        }
    }
}

/// Immutable command byte table. Build once at startup and pass by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTable {
    pub configure: u8,
    pub node_info: u8,
    pub node_connected: u8,
    pub node_disconnected: u8,
    pub component_value: u8,
    pub start: u8,
    pub quit: u8,
    pub reset: u8,
    pub id_packet: u8,
    pub dir_instruction: u8,
    pub cs_completed: u8,
    pub dir_to_check: u8,
    pub bounds: u8,
}

impl Default for CommandTable {
    fn default() -> Self {
        Self {
            configure: b'F',
            node_info: b'N',
            node_connected: b'C',
            node_disconnected: b'D',
            component_value: b'V',
            start: b'S',
            quit: b'Q',
            reset: b'E',
            id_packet: b'I',
            dir_instruction: b'N',
            cs_completed: b'O',
            dir_to_check: b'D',
            bounds: b'B',
        }
    }
}

impl CommandTable {
    pub fn byte(&self, cmd: Command) -> u8 {
        match cmd {
            Command::Configure => self.configure,
            Command::NodeInfo => self.node_info,
            Command::NodeConnected => self.node_connected,
            Command::NodeDisconnected => self.node_disconnected,
            Command::ComponentValue => self.component_value,
            Command::Start => self.start,
            Command::Quit => self.quit,
            Command::Reset => self.reset,
            Command::IdPacket => self.id_packet,
            Command::DirInstruction => self.dir_instruction,
            Command::CsCompleted => self.cs_completed,
            Command::DirToCheck => self.dir_to_check,
            Command::Bounds => self.bounds,
        }
    }

    /// Resolve a command byte received on `link`.
    pub fn lookup(&self, link: Link, byte: u8) -> Option<Command> {
        Command::ALL
            .into_iter()
            .find(|cmd| cmd.travels_on(link) && self.byte(*cmd) == byte)
    }

    /// True when no two commands sharing a link share a byte.
    pub fn is_unambiguous(&self) -> bool {
        [Link::Downstream, Link::Upstream, Link::Serial]
            .into_iter()
            .all(|link| {
                let on_link: Vec<Command> = Command::ALL
                    .into_iter()
                    .filter(|c| c.travels_on(link))
                    .collect();
                on_link.iter().enumerate().all(|(i, a)| {
                    on_link[i + 1..]
                        .iter()
                        .all(|b| self.byte(*a) != self.byte(*b))
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_unambiguous_per_link() {
        assert!(CommandTable::default().is_unambiguous());
    }

    #[test]
    fn shared_bytes_resolve_by_link() {
        let t = CommandTable::default();
        assert_eq!(t.lookup(Link::Downstream, b'N'), Some(Command::DirInstruction));
        assert_eq!(t.lookup(Link::Serial, b'N'), Some(Command::NodeInfo));
        assert_eq!(t.lookup(Link::Downstream, b'D'), Some(Command::DirToCheck));
        assert_eq!(t.lookup(Link::Upstream, b'D'), Some(Command::NodeDisconnected));
        assert_eq!(t.lookup(Link::Serial, b'D'), Some(Command::NodeDisconnected));
    }

    #[test]
    fn upstream_rejects_master_only_commands() {
        let t = CommandTable::default();
        assert_eq!(t.lookup(Link::Upstream, b'I'), None);
        assert_eq!(t.lookup(Link::Upstream, b'E'), None);
    }

    #[test]
    fn unknown_byte_is_none() {
        assert_eq!(CommandTable::default().lookup(Link::Serial, b'Z'), None);
    }

    #[test]
    fn colliding_table_detected() {
        let t = CommandTable {
            start: b'Q',
            ..CommandTable::default()
        };
        assert!(!t.is_unambiguous());
    }
}
