//! Node stack: turns a frame [`Link`] into the engine's [`Transport`]
//!
//! The stack answers match and address requests on its own, acknowledges or
//! echoes incoming pings, and tracks the one outstanding confirmed exchange
//! to report its round-trip time or timeout.

use super::link::{Link, SharedMacStats};
use super::wire::{Envelope, Frame};
use super::{Inbound, Transport};
use crate::control::ControlMessage;
use crate::engine::EngineSettings;
use crate::logging::Logger;
use crate::ping::{PingEvent, PingEventKind, PingRequest};
use crate::platform::SharedClock;
use crate::types::{BenchmarkError, DeviceId, NetworkAddress, ProfileId, Result};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
struct Outstanding {
    destination: NetworkAddress,
    sequence: u16,
    echo: bool,
    sent_at_us: u64,
    deadline_us: u64,
}

/// Test payload of `length` bytes
pub fn test_payload(length: u16) -> Vec<u8> {
    (0..length).map(|i| i as u8).collect()
}

pub struct LinkStack<L: Link> {
    link: L,
    address: NetworkAddress,
    device_id: DeviceId,
    profile: ProfileId,
    clock: SharedClock,
    outstanding: Option<Outstanding>,
    events: VecDeque<Inbound>,
    logger: Logger,
}

impl<L: Link> LinkStack<L> {
    pub fn new(link: L, settings: &EngineSettings, clock: SharedClock, logger: Logger) -> Self {
        Self {
            link,
            address: settings.address,
            device_id: settings.device_id,
            profile: settings.profile,
            clock,
            outstanding: None,
            events: VecDeque::new(),
            logger,
        }
    }

    pub fn address(&self) -> NetworkAddress {
        self.address
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn mac_stats(&self) -> SharedMacStats {
        self.link.mac_stats()
    }

    fn send_frame(&mut self, dst: NetworkAddress, frame: Frame) -> Result<()> {
        let envelope = Envelope::new(self.address, dst, frame);
        self.link.send(&envelope)
    }

    /// Replies generated by the stack itself; losing one is not fatal
    fn reply(&mut self, dst: NetworkAddress, frame: Frame) {
        let kind = frame.kind();
        if let Err(e) = self.send_frame(dst, frame) {
            self.logger
                .debug("Failed to send reply")
                .field("frame", kind)
                .field("peer", dst)
                .error_info(&e)
                .log();
        }
    }

    fn handle_envelope(&mut self, envelope: Envelope) {
        let Envelope { src, dst, frame } = envelope;
        if src == self.address || !(dst == self.address || dst.is_broadcast()) {
            return;
        }

        match frame {
            Frame::MatchRequest { profile } => {
                if profile == self.profile {
                    self.reply(src, Frame::MatchResponse { profile });
                }
            }
            Frame::MatchResponse { profile } => {
                self.events.push_back(Inbound::DiscoveryResponse { address: src, profile });
            }
            Frame::AddressRequest => {
                self.reply(src, Frame::AddressResponse { device_id: self.device_id });
            }
            Frame::AddressResponse { device_id } => {
                self.events.push_back(Inbound::AddressResolved { address: src, device_id });
            }
            Frame::Ping { sequence, ack, echo, payload } => {
                let length = u16::try_from(payload.len()).unwrap_or(u16::MAX);
                self.events.push_back(Inbound::Ping(PingEvent::received(sequence, length)));
                if echo {
                    self.reply(src, Frame::PingEcho { sequence, payload });
                } else if ack {
                    self.reply(src, Frame::PingAck { sequence });
                }
            }
            Frame::PingAck { sequence } => self.confirm(src, sequence, false),
            Frame::PingEcho { sequence, .. } => self.confirm(src, sequence, true),
            Frame::Control { message } => {
                self.events.push_back(Inbound::Control { source: src, message });
            }
        }
    }

    fn confirm(&mut self, src: NetworkAddress, sequence: u16, echo: bool) {
        let Some(outstanding) = self.outstanding else {
            return;
        };
        if outstanding.destination != src || outstanding.sequence != sequence || outstanding.echo != echo {
            self.logger
                .trace("Unmatched confirmation dropped")
                .field("peer", src)
                .field("sequence", sequence)
                .log();
            return;
        }

        self.outstanding = None;
        let delay_us = self.clock.now_us().saturating_sub(outstanding.sent_at_us);
        let kind = if echo { PingEventKind::EchoReceived } else { PingEventKind::AckReceived };
        let delay_us = u32::try_from(delay_us).unwrap_or(u32::MAX);
        self.events.push_back(Inbound::Ping(PingEvent::confirmed(kind, sequence, delay_us)));
    }

    fn check_timeout(&mut self) {
        if let Some(outstanding) = self.outstanding {
            if self.clock.now_us() >= outstanding.deadline_us {
                self.outstanding = None;
                self.events.push_back(Inbound::Ping(PingEvent::new(
                    PingEventKind::FrameTimeout,
                    outstanding.sequence,
                )));
            }
        }
    }
}

impl<L: Link> Transport for LinkStack<L> {
    fn send_discovery(&mut self, profile: ProfileId) -> Result<()> {
        self.send_frame(NetworkAddress::BROADCAST_RX_ON_WHEN_IDLE, Frame::MatchRequest { profile })
    }

    fn resolve_address(&mut self, address: NetworkAddress) -> Result<()> {
        self.send_frame(address, Frame::AddressRequest)
    }

    fn send_ping(&mut self, request: PingRequest) -> Result<()> {
        if self.outstanding.is_some() {
            return Err(BenchmarkError::transport("Previous exchange is still outstanding"));
        }

        let frame = Frame::Ping {
            sequence: request.sequence,
            ack: request.ack_requested,
            echo: request.echo_requested,
            payload: test_payload(request.payload_length),
        };
        let sent_at_us = self.clock.now_us();
        self.send_frame(request.destination, frame)?;

        self.events
            .push_back(Inbound::Ping(PingEvent::new(PingEventKind::FrameScheduled, request.sequence)));
        self.events
            .push_back(Inbound::Ping(PingEvent::new(PingEventKind::FrameSent, request.sequence)));

        if request.is_confirmed() {
            self.outstanding = Some(Outstanding {
                destination: request.destination,
                sequence: request.sequence,
                echo: request.echo_requested,
                sent_at_us,
                deadline_us: sent_at_us + u64::from(request.timeout_ms) * 1000,
            });
        }
        Ok(())
    }

    fn send_control(&mut self, peer: NetworkAddress, message: ControlMessage) -> Result<()> {
        self.send_frame(peer, Frame::Control { message })
    }

    fn poll(&mut self) -> Result<Vec<Inbound>> {
        while let Some(envelope) = self.link.try_recv()? {
            self.handle_envelope(envelope);
        }
        self.check_timeout();
        Ok(self.events.drain(..).collect())
    }
}
