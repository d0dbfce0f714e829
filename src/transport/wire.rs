//! JSON wire envelope exchanged between nodes

use crate::control::ControlMessage;
use crate::types::{BenchmarkError, DeviceId, NetworkAddress, ProfileId, Result};
use serde::{Deserialize, Serialize};

/// Largest datagram a node accepts
pub const MAX_DATAGRAM_SIZE: usize = 8 * 1024;

/// Frame kinds carried by an [`Envelope`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    /// Broadcast: who serves this profile?
    MatchRequest { profile: ProfileId },
    MatchResponse { profile: ProfileId },
    /// Ask the destination for its device identifier
    AddressRequest,
    AddressResponse { device_id: DeviceId },
    Ping {
        sequence: u16,
        ack: bool,
        echo: bool,
        payload: Vec<u8>,
    },
    PingAck { sequence: u16 },
    PingEcho { sequence: u16, payload: Vec<u8> },
    Control { message: ControlMessage },
}

impl Frame {
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::MatchRequest { .. } => "match_request",
            Frame::MatchResponse { .. } => "match_response",
            Frame::AddressRequest => "address_request",
            Frame::AddressResponse { .. } => "address_response",
            Frame::Ping { .. } => "ping",
            Frame::PingAck { .. } => "ping_ack",
            Frame::PingEcho { .. } => "ping_echo",
            Frame::Control { .. } => "control",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub src: NetworkAddress,
    pub dst: NetworkAddress,
    pub frame: Frame,
}

impl Envelope {
    pub fn new(src: NetworkAddress, dst: NetworkAddress, frame: Frame) -> Self {
        Self { src, dst, frame }
    }

    pub fn is_for(&self, address: NetworkAddress) -> bool {
        self.dst == address || self.dst.is_broadcast()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let bytes = serde_json::to_vec(self)?;
        if bytes.len() > MAX_DATAGRAM_SIZE {
            return Err(BenchmarkError::transport(format!(
                "Encoded frame is {} bytes, limit is {}",
                bytes.len(),
                MAX_DATAGRAM_SIZE
            )));
        }
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
