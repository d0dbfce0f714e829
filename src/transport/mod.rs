//! Transport and addressing services used by the benchmark engine
//!
//! The engine only issues fire-and-forget requests through [`Transport`] and
//! later drains what happened with [`Transport::poll`]. [`stack::LinkStack`]
//! implements the trait on top of any [`link::Link`] (in-memory loopback or
//! UDP); [`mock::RecordingTransport`] records requests for unit tests.

pub mod link;
pub mod loopback;
pub mod mock;
pub mod stack;
pub mod udp;
pub mod wire;

pub use link::{Link, MacStats, SharedMacStats};
pub use loopback::{LoopbackHub, LoopbackLink, LossPolicy};
pub use mock::RecordingTransport;
pub use stack::LinkStack;
pub use udp::UdpLink;
pub use wire::{Envelope, Frame};

use crate::control::ControlMessage;
use crate::ping::{PingEvent, PingRequest};
use crate::types::{DeviceId, NetworkAddress, ProfileId, Result};

/// Requests the engine hands to the transport
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Discovery(ProfileId),
    Resolve(NetworkAddress),
    Ping(PingRequest),
    Control {
        peer: NetworkAddress,
        message: ControlMessage,
    },
}

/// Asynchronous notifications delivered back to the engine
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Ping(PingEvent),
    DiscoveryResponse {
        address: NetworkAddress,
        profile: ProfileId,
    },
    AddressResolved {
        address: NetworkAddress,
        device_id: DeviceId,
    },
    Control {
        source: NetworkAddress,
        message: ControlMessage,
    },
}

/// Addressing and transport service
pub trait Transport {
    /// Broadcast a match request to all non-sleepy devices
    fn send_discovery(&mut self, profile: ProfileId) -> Result<()>;

    /// Ask `address` for its device identifier
    fn resolve_address(&mut self, address: NetworkAddress) -> Result<()>;

    /// Schedule one exchange; progress is reported as ping events
    fn send_ping(&mut self, request: PingRequest) -> Result<()>;

    /// Send a control request, response or result record
    fn send_control(&mut self, peer: NetworkAddress, message: ControlMessage) -> Result<()>;

    /// Everything that happened since the previous call, in arrival order
    fn poll(&mut self) -> Result<Vec<Inbound>>;
}
