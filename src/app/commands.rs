//! Inbound commands to the master service.
//!
//! These represent actions requested by the outside world (the host serial
//! link, or the firmware entry point) that the
//! [`MasterService`](super::master_service::MasterService) interprets and
//! acts upon.

use crate::protocol::{BoundsData, HostCommand};

/// Commands that external adapters can send into the master.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Broadcast start: every configured node begins streaming.
    StartStreaming,

    /// Broadcast quit: streaming nodes return to configured.
    StopStreaming,

    /// Reset every node and rediscover the grid.
    ResetGrid,

    /// Rescale one component on one node.
    SetBounds { node_id: u8, bounds: BoundsData },
}

impl From<HostCommand> for AppCommand {
    fn from(cmd: HostCommand) -> Self {
        match cmd {
            HostCommand::Start => Self::StartStreaming,
            HostCommand::Quit => Self::StopStreaming,
            HostCommand::Reset => Self::ResetGrid,
            HostCommand::Bounds { node_id, bounds } => Self::SetBounds { node_id, bounds },
        }
    }
}
