//! Recording transport for exercising the engine without a network stack

use super::{Inbound, Outbound, Transport};
use crate::control::ControlMessage;
use crate::ping::PingRequest;
use crate::types::{BenchmarkError, NetworkAddress, ProfileId, Result};
use std::collections::VecDeque;

/// Records every request and replays queued inbound events on `poll`
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub sent: Vec<Outbound>,
    inbound: VecDeque<Inbound>,
    /// Number of upcoming `send_ping` calls that fail
    pub failing_pings: u32,
    /// Reject every control message
    pub fail_control: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for the next `poll`
    pub fn push(&mut self, event: Inbound) {
        self.inbound.push_back(event);
    }

    pub fn pings(&self) -> Vec<PingRequest> {
        self.sent
            .iter()
            .filter_map(|out| match out {
                Outbound::Ping(request) => Some(*request),
                _ => None,
            })
            .collect()
    }

    pub fn last_ping(&self) -> Option<PingRequest> {
        self.pings().last().copied()
    }

    pub fn controls(&self) -> Vec<(NetworkAddress, ControlMessage)> {
        self.sent
            .iter()
            .filter_map(|out| match out {
                Outbound::Control { peer, message } => Some((*peer, message.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn last_control(&self) -> Option<ControlMessage> {
        self.controls().last().map(|(_, message)| message.clone())
    }

    pub fn clear(&mut self) {
        self.sent.clear();
    }
}

impl Transport for RecordingTransport {
    fn send_discovery(&mut self, profile: ProfileId) -> Result<()> {
        self.sent.push(Outbound::Discovery(profile));
        Ok(())
    }

    fn resolve_address(&mut self, address: NetworkAddress) -> Result<()> {
        self.sent.push(Outbound::Resolve(address));
        Ok(())
    }

    fn send_ping(&mut self, request: PingRequest) -> Result<()> {
        if self.failing_pings > 0 {
            self.failing_pings -= 1;
            return Err(BenchmarkError::transport("No TX buffer available"));
        }
        self.sent.push(Outbound::Ping(request));
        Ok(())
    }

    fn send_control(&mut self, peer: NetworkAddress, message: ControlMessage) -> Result<()> {
        if self.fail_control {
            return Err(BenchmarkError::transport("Control endpoint unavailable"));
        }
        self.sent.push(Outbound::Control { peer, message });
        Ok(())
    }

    fn poll(&mut self) -> Result<Vec<Inbound>> {
        Ok(self.inbound.drain(..).collect())
    }
}
