//! Type definitions shared across the engine, transport and reporting layers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use crate::error::{BenchmarkError, Result};

/// 16-bit short network address of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NetworkAddress(pub u16);

impl NetworkAddress {
    /// All devices with the receiver on when idle (non-sleepy devices)
    pub const BROADCAST_RX_ON_WHEN_IDLE: NetworkAddress = NetworkAddress(0xFFFD);
    /// Placeholder used when no peer is known
    pub const UNKNOWN: NetworkAddress = NetworkAddress(0xFFFF);

    pub fn is_broadcast(&self) -> bool {
        self.0 >= 0xFFFC
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

impl FromStr for NetworkAddress {
    type Err = BenchmarkError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        u16::from_str_radix(digits, 16)
            .map(NetworkAddress)
            .map_err(|e| BenchmarkError::parse(format!("Invalid network address '{}': {}", s, e)))
    }
}

/// 64-bit device identifier (EUI-64); zero means "not resolved yet"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DeviceId(pub u64);

impl DeviceId {
    pub fn is_resolved(&self) -> bool {
        self.0 != 0
    }

    /// Upper 32 bits
    pub fn hi(&self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Lower 32 bits
    pub fn lo(&self) -> u32 {
        (self.0 & 0xFFFF_FFFF) as u32
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}{:08x}", self.hi(), self.lo())
    }
}

/// Capability/profile identifier used to filter discovery responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub u16);

impl ProfileId {
    /// Home Automation profile
    pub const HOME_AUTOMATION: ProfileId = ProfileId(0x0104);
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

/// How a single exchange is confirmed by the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TestMode {
    /// Fire-and-forget, no confirmation per exchange
    Unidirectional,
    /// Peer replies with a short acknowledgment
    #[default]
    Ack,
    /// Peer replies with data of the same length
    Echo,
}

impl TestMode {
    pub fn name(&self) -> &'static str {
        match self {
            TestMode::Unidirectional => "Unidirectional",
            TestMode::Ack => "Ack",
            TestMode::Echo => "Echo",
        }
    }

    /// Whether every exchange waits for a confirmation from the peer
    pub fn is_confirmed(&self) -> bool {
        !matches!(self, TestMode::Unidirectional)
    }
}

impl fmt::Display for TestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TestMode {
    type Err = BenchmarkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "unidirectional" | "uni" => Ok(TestMode::Unidirectional),
            "ack" => Ok(TestMode::Ack),
            "echo" => Ok(TestMode::Echo),
            other => Err(BenchmarkError::parse(format!("Invalid test mode: {}", other))),
        }
    }
}

/// Coordinator state; `Idle` is both initial and terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestState {
    Idle,
    WaitingForTxBuffer,
    FrameSending,
    FrameSent,
    FrameSentWaitingForAck,
    FrameSentWaitingForEcho,
    /// Slave only: test running until the master sends a stop command
    WaitingForStopCmd,
    Finished,
    Error,
}

impl TestState {
    pub fn is_idle(&self) -> bool {
        matches!(self, TestState::Idle)
    }

    /// Master-side states in which an exchange is in flight or being prepared
    pub fn is_exchanging(&self) -> bool {
        matches!(
            self,
            TestState::WaitingForTxBuffer
                | TestState::FrameSending
                | TestState::FrameSent
                | TestState::FrameSentWaitingForAck
                | TestState::FrameSentWaitingForEcho
        )
    }
}

impl fmt::Display for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Status code carried by a control-command response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteStatus(pub u8);

impl RemoteStatus {
    pub const SUCCESS: RemoteStatus = RemoteStatus(0x00);
    pub const FAILURE: RemoteStatus = RemoteStatus(0x01);
    pub const UNSUPPORTED: RemoteStatus = RemoteStatus(0x81);

    pub fn is_success(&self) -> bool {
        *self == Self::SUCCESS
    }
}

impl fmt::Display for RemoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_address_parsing() {
        assert_eq!("0x1a2b".parse::<NetworkAddress>().unwrap(), NetworkAddress(0x1a2b));
        assert_eq!("FFFD".parse::<NetworkAddress>().unwrap(), NetworkAddress::BROADCAST_RX_ON_WHEN_IDLE);
        assert!("zz".parse::<NetworkAddress>().is_err());
        assert!(NetworkAddress::BROADCAST_RX_ON_WHEN_IDLE.is_broadcast());
        assert!(!NetworkAddress(0x0001).is_broadcast());
        assert_eq!(NetworkAddress(0xab).to_string(), "00ab");
    }

    #[test]
    fn test_device_id_halves() {
        let id = DeviceId(0x0011_2233_4455_6677);
        assert_eq!(id.hi(), 0x0011_2233);
        assert_eq!(id.lo(), 0x4455_6677);
        assert_eq!(id.to_string(), "0011223344556677");
        assert!(!DeviceId::default().is_resolved());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("ACK".parse::<TestMode>().unwrap(), TestMode::Ack);
        assert_eq!("echo".parse::<TestMode>().unwrap(), TestMode::Echo);
        assert_eq!("uni".parse::<TestMode>().unwrap(), TestMode::Unidirectional);
        assert!("flood".parse::<TestMode>().is_err());
        assert!(!TestMode::Unidirectional.is_confirmed());
    }

    #[test]
    fn test_remote_status() {
        assert!(RemoteStatus::SUCCESS.is_success());
        assert!(!RemoteStatus::FAILURE.is_success());
        assert_eq!(RemoteStatus::UNSUPPORTED.to_string(), "0x81");
    }
}
