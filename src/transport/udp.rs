//! UDP link: every node is a socket, broadcasts fan out to the peer list

use super::link::{Link, MacStats, SharedMacStats};
use super::wire::{Envelope, MAX_DATAGRAM_SIZE};
use crate::logging::Logger;
use crate::types::{BenchmarkError, NetworkAddress, Result};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;

pub struct UdpLink {
    socket: UdpSocket,
    address: NetworkAddress,
    peers: Vec<SocketAddr>,
    /// Socket each known node last sent from
    routes: HashMap<NetworkAddress, SocketAddr>,
    mac: SharedMacStats,
    buffer: Vec<u8>,
    logger: Logger,
}

impl UdpLink {
    /// Bind `listen` for node `address`; `peers` receive broadcasts
    pub async fn bind(
        listen: SocketAddr,
        address: NetworkAddress,
        peers: Vec<SocketAddr>,
        logger: Logger,
    ) -> Result<Self> {
        let socket = UdpSocket::bind(listen)
            .await
            .map_err(|e| BenchmarkError::io(format!("Failed to bind {}: {}", listen, e)))?;

        logger
            .info("UDP link ready")
            .field("listen", socket.local_addr()?.to_string())
            .field("peers", peers.iter().map(ToString::to_string).collect::<Vec<_>>())
            .log();

        Ok(Self {
            socket,
            address,
            peers,
            routes: HashMap::new(),
            mac: Arc::new(MacStats::default()),
            buffer: vec![0; MAX_DATAGRAM_SIZE],
            logger,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Sockets a frame for `dst` goes to
    fn targets(&self, dst: NetworkAddress) -> Vec<SocketAddr> {
        if !dst.is_broadcast() {
            if let Some(route) = self.routes.get(&dst) {
                return vec![*route];
            }
        }
        let mut targets = self.peers.clone();
        for route in self.routes.values() {
            if !targets.contains(route) {
                targets.push(*route);
            }
        }
        targets
    }
}

impl Link for UdpLink {
    fn send(&mut self, envelope: &Envelope) -> Result<()> {
        let bytes = envelope.encode()?;
        let targets = self.targets(envelope.dst);
        if targets.is_empty() {
            self.mac.record(false);
            return Err(BenchmarkError::transport(format!("No route to node {}", envelope.dst)));
        }

        let mut failure = None;
        for target in targets {
            match self.socket.try_send_to(&bytes, target) {
                Ok(_) => self.mac.record(true),
                Err(e) => {
                    self.mac.record(false);
                    failure = Some(if e.kind() == ErrorKind::WouldBlock {
                        BenchmarkError::transport("Socket send buffer is full")
                    } else {
                        BenchmarkError::io(format!("Send to {} failed: {}", target, e))
                    });
                }
            }
        }
        failure.map_or(Ok(()), Err)
    }

    fn try_recv(&mut self) -> Result<Option<Envelope>> {
        loop {
            let (length, from) = match self.socket.try_recv_from(&mut self.buffer) {
                Ok(received) => received,
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(None),
                // ICMP port unreachable from a peer that is not up yet
                Err(e) if matches!(e.kind(), ErrorKind::ConnectionReset | ErrorKind::ConnectionRefused) => continue,
                Err(e) => return Err(e.into()),
            };

            let envelope = match Envelope::decode(&self.buffer[..length]) {
                Ok(envelope) => envelope,
                Err(e) => {
                    self.logger
                        .debug("Malformed datagram dropped")
                        .field("from", from.to_string())
                        .error_info(&e)
                        .log();
                    continue;
                }
            };

            if envelope.src == self.address {
                continue;
            }
            self.routes.insert(envelope.src, from);
            if envelope.is_for(self.address) {
                return Ok(Some(envelope));
            }
        }
    }

    fn mac_stats(&self) -> SharedMacStats {
        Arc::clone(&self.mac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::wire::Frame;
    use std::time::Duration;

    async fn recv(link: &mut UdpLink) -> Option<Envelope> {
        for _ in 0..200 {
            if let Some(envelope) = link.try_recv().unwrap() {
                return Some(envelope);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        None
    }

    #[tokio::test]
    async fn test_broadcast_then_learned_unicast() {
        let any: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let mut b = UdpLink::bind(any, NetworkAddress(2), vec![], Logger::silent("B"))
            .await
            .unwrap();
        let b_addr = b.local_addr().unwrap();
        let mut a = UdpLink::bind(any, NetworkAddress(1), vec![b_addr], Logger::silent("A"))
            .await
            .unwrap();

        let request = Envelope::new(
            NetworkAddress(1),
            NetworkAddress::BROADCAST_RX_ON_WHEN_IDLE,
            Frame::AddressRequest,
        );
        a.send(&request).unwrap();
        assert_eq!(recv(&mut b).await, Some(request));

        // b learned where node 1 lives without a peer list
        let ack = Envelope::new(NetworkAddress(2), NetworkAddress(1), Frame::PingAck { sequence: 4 });
        b.send(&ack).unwrap();
        assert_eq!(recv(&mut a).await, Some(ack));
    }

    #[tokio::test]
    async fn test_send_without_route_fails() {
        let any: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let mut a = UdpLink::bind(any, NetworkAddress(1), vec![], Logger::silent("A"))
            .await
            .unwrap();
        let envelope = Envelope::new(NetworkAddress(1), NetworkAddress(7), Frame::PingAck { sequence: 1 });
        assert!(matches!(a.send(&envelope), Err(BenchmarkError::Transport(_))));
        assert_eq!(a.mac_stats().snapshot().error, Some(1));
    }
}
