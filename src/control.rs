//! Remote control protocol between master and slave nodes
//!
//! Three one-way commands travel from the master to the selected peer's control
//! endpoint; each is answered with a [`RemoteStatus`]. Results are delivered on a
//! separate path (see [`ControlMessage::Results`]).

use crate::models::BenchmarkResult;
use crate::types::RemoteStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Control command kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlCommand {
    StartRequest,
    StopRequest,
    ResultsRequest,
}

impl ControlCommand {
    pub const ALL: [ControlCommand; 3] = [
        ControlCommand::StartRequest,
        ControlCommand::StopRequest,
        ControlCommand::ResultsRequest,
    ];

    /// Command identifier used on the wire
    pub fn id(&self) -> u8 {
        match self {
            ControlCommand::StartRequest => 0x00,
            ControlCommand::StopRequest => 0x01,
            ControlCommand::ResultsRequest => 0x02,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|cmd| cmd.id() == id)
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Everything that travels on the control endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControlMessage {
    Request(ControlCommand),
    Response {
        command: ControlCommand,
        status: RemoteStatus,
    },
    Results(BenchmarkResult),
}

/// Outstanding requests on the master side
///
/// Responses without a matching outstanding request belong to an aborted or
/// already finished test and are discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingCommands {
    start: bool,
    stop: bool,
    results: bool,
}

impl PendingCommands {
    pub fn mark(&mut self, command: ControlCommand) {
        *self.slot(command) = true;
    }

    /// Clear the request and report whether it was outstanding
    pub fn take(&mut self, command: ControlCommand) -> bool {
        std::mem::take(self.slot(command))
    }

    pub fn is_pending(&self, command: ControlCommand) -> bool {
        match command {
            ControlCommand::StartRequest => self.start,
            ControlCommand::StopRequest => self.stop,
            ControlCommand::ResultsRequest => self.results,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn slot(&mut self, command: ControlCommand) -> &mut bool {
        match command {
            ControlCommand::StartRequest => &mut self.start,
            ControlCommand::StopRequest => &mut self.stop,
            ControlCommand::ResultsRequest => &mut self.results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_ids() {
        for cmd in ControlCommand::ALL {
            assert_eq!(ControlCommand::from_id(cmd.id()), Some(cmd));
        }
        assert_eq!(ControlCommand::from_id(0x7f), None);
    }

    #[test]
    fn test_pending_take_is_one_shot() {
        let mut pending = PendingCommands::default();
        pending.mark(ControlCommand::StopRequest);
        assert!(pending.is_pending(ControlCommand::StopRequest));
        assert!(!pending.is_pending(ControlCommand::StartRequest));
        assert!(pending.take(ControlCommand::StopRequest));
        assert!(!pending.take(ControlCommand::StopRequest));
    }
}
