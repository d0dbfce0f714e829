//! Ping exchange model: outbound requests and the events reported for them

use crate::types::{NetworkAddress, TestMode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One exchange handed to the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingRequest {
    pub destination: NetworkAddress,
    /// Never zero; zero marks "no exchange outstanding"
    pub sequence: u16,
    pub payload_length: u16,
    pub ack_requested: bool,
    pub echo_requested: bool,
    pub timeout_ms: u32,
}

impl PingRequest {
    pub fn new(
        destination: NetworkAddress,
        sequence: u16,
        payload_length: u16,
        mode: TestMode,
        timeout_ms: u32,
    ) -> Self {
        Self {
            destination,
            sequence,
            payload_length,
            ack_requested: mode == TestMode::Ack,
            echo_requested: mode == TestMode::Echo,
            timeout_ms,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.ack_requested || self.echo_requested
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PingEventKind {
    /// The frame left the node
    FrameSent,
    AckReceived,
    EchoReceived,
    /// No confirmation arrived within the timeout
    FrameTimeout,
    /// The transport accepted the request and assigned its sequence number
    FrameScheduled,
    /// The transport could not schedule the request
    Error,
    /// Slave side: a test frame arrived
    RequestReceived,
}

impl fmt::Display for PingEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingEvent {
    pub kind: PingEventKind,
    /// Round-trip time for confirmations, zero otherwise
    pub delay_us: u32,
    pub sequence: u16,
    /// Payload bytes carried by a received request
    pub length: u16,
}

impl PingEvent {
    pub fn new(kind: PingEventKind, sequence: u16) -> Self {
        Self {
            kind,
            delay_us: 0,
            sequence,
            length: 0,
        }
    }

    pub fn confirmed(kind: PingEventKind, sequence: u16, delay_us: u32) -> Self {
        Self {
            delay_us,
            ..Self::new(kind, sequence)
        }
    }

    pub fn received(sequence: u16, length: u16) -> Self {
        Self {
            length,
            ..Self::new(PingEventKind::RequestReceived, sequence)
        }
    }
}

/// Wrapping sequence counter that skips zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceCounter(u16);

impl SequenceCounter {
    pub fn next(&mut self) -> u16 {
        self.0 = self.0.wrapping_add(1);
        if self.0 == 0 {
            self.0 = 1;
        }
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_flags_follow_mode() {
        let ack = PingRequest::new(NetworkAddress(1), 1, 64, TestMode::Ack, 200);
        assert!(ack.ack_requested && !ack.echo_requested);

        let echo = PingRequest::new(NetworkAddress(1), 1, 64, TestMode::Echo, 200);
        assert!(echo.echo_requested && !echo.ack_requested);

        let uni = PingRequest::new(NetworkAddress(1), 1, 64, TestMode::Unidirectional, 0);
        assert!(!uni.is_confirmed());
    }

    #[test]
    fn test_sequence_skips_zero() {
        let mut counter = SequenceCounter(u16::MAX - 1);
        assert_eq!(counter.next(), u16::MAX);
        assert_eq!(counter.next(), 1);
    }
}
