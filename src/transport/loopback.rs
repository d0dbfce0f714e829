//! In-memory medium connecting several nodes of one process
//!
//! Delivery is delayed by a fixed latency measured on the shared clock, so a
//! simulation driven by a virtual clock is fully deterministic.

use super::link::{Link, MacStats, SharedMacStats};
use super::wire::{Envelope, Frame};
use crate::platform::SharedClock;
use crate::types::{BenchmarkError, NetworkAddress, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Which test frames the medium loses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LossPolicy {
    /// Lose every n-th ping frame put on the medium
    pub drop_every_nth_ping: Option<u32>,
    /// Lose ping frames carrying these sequence numbers
    pub drop_sequences: Vec<u16>,
}

impl LossPolicy {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn every_nth(n: u32) -> Self {
        Self {
            drop_every_nth_ping: Some(n),
            ..Self::default()
        }
    }

    fn drops(&self, sequence: u16, ordinal: u64) -> bool {
        let nth = self
            .drop_every_nth_ping
            .filter(|&n| n > 0)
            .is_some_and(|n| ordinal % u64::from(n) == 0);
        nth || self.drop_sequences.contains(&sequence)
    }
}

#[derive(Debug, Default)]
struct HubState {
    queues: BTreeMap<NetworkAddress, VecDeque<(u64, Envelope)>>,
    loss: LossPolicy,
    pings_seen: u64,
}

/// Shared medium; clone it freely
#[derive(Debug, Clone)]
pub struct LoopbackHub {
    state: Arc<Mutex<HubState>>,
    clock: SharedClock,
    latency: Duration,
}

impl LoopbackHub {
    pub fn new(clock: SharedClock, latency: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(HubState::default())),
            clock,
            latency,
        }
    }

    pub fn with_loss(self, loss: LossPolicy) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.loss = loss;
        }
        self
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Connect a node with `address` to the medium
    pub fn attach(&self, address: NetworkAddress) -> LoopbackLink {
        if let Ok(mut state) = self.state.lock() {
            state.queues.entry(address).or_default();
        }
        LoopbackLink {
            hub: self.clone(),
            address,
            mac: Arc::new(MacStats::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HubState>> {
        self.state
            .lock()
            .map_err(|_| BenchmarkError::internal("Loopback medium lock poisoned"))
    }
}

/// One node's attachment to a [`LoopbackHub`]
#[derive(Debug)]
pub struct LoopbackLink {
    hub: LoopbackHub,
    address: NetworkAddress,
    mac: SharedMacStats,
}

impl LoopbackLink {
    pub fn address(&self) -> NetworkAddress {
        self.address
    }
}

impl Link for LoopbackLink {
    fn send(&mut self, envelope: &Envelope) -> Result<()> {
        let deliver_at = self.hub.clock.now_us() + self.hub.latency.as_micros() as u64;
        let mut state = self.hub.lock()?;

        if let Frame::Ping { sequence, .. } = envelope.frame {
            state.pings_seen += 1;
            let ordinal = state.pings_seen;
            if state.loss.drops(sequence, ordinal) {
                // Lost on the air: the radio gives up after its retries
                self.mac.record(false);
                return Ok(());
            }
        }

        let mut delivered = false;
        for (address, queue) in state.queues.iter_mut() {
            if *address != self.address && envelope.is_for(*address) {
                queue.push_back((deliver_at, envelope.clone()));
                delivered = true;
            }
        }

        // Unicast to nobody fails at the MAC layer; broadcasts are never confirmed
        self.mac.record(delivered || envelope.dst.is_broadcast());
        Ok(())
    }

    fn try_recv(&mut self) -> Result<Option<Envelope>> {
        let now = self.hub.clock.now_us();
        let mut state = self.hub.lock()?;
        let Some(queue) = state.queues.get_mut(&self.address) else {
            return Ok(None);
        };
        match queue.front() {
            Some((deliver_at, _)) if *deliver_at <= now => Ok(queue.pop_front().map(|(_, envelope)| envelope)),
            _ => Ok(None),
        }
    }

    fn mac_stats(&self) -> SharedMacStats {
        Arc::clone(&self.mac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MacCounters;

    fn ping(src: u16, dst: u16, sequence: u16) -> Envelope {
        Envelope::new(
            NetworkAddress(src),
            NetworkAddress(dst),
            Frame::Ping {
                sequence,
                ack: true,
                echo: false,
                payload: vec![0; 4],
            },
        )
    }

    #[test]
    fn test_unicast_reaches_only_destination() {
        let hub = LoopbackHub::new(SharedClock::virtual_clock(), Duration::ZERO);
        let mut a = hub.attach(NetworkAddress(1));
        let mut b = hub.attach(NetworkAddress(2));
        let mut c = hub.attach(NetworkAddress(3));

        a.send(&ping(1, 2, 1)).unwrap();
        assert!(b.try_recv().unwrap().is_some());
        assert!(c.try_recv().unwrap().is_none());
        assert!(a.try_recv().unwrap().is_none());
        assert_eq!(a.mac_stats().snapshot(), MacCounters::new(1, 0));
    }

    #[test]
    fn test_broadcast_skips_sender() {
        let hub = LoopbackHub::new(SharedClock::virtual_clock(), Duration::ZERO);
        let mut a = hub.attach(NetworkAddress(1));
        let mut b = hub.attach(NetworkAddress(2));
        let mut c = hub.attach(NetworkAddress(3));

        let envelope = Envelope::new(
            NetworkAddress(1),
            NetworkAddress::BROADCAST_RX_ON_WHEN_IDLE,
            Frame::AddressRequest,
        );
        a.send(&envelope).unwrap();
        assert_eq!(b.try_recv().unwrap(), Some(envelope.clone()));
        assert_eq!(c.try_recv().unwrap(), Some(envelope));
        assert!(a.try_recv().unwrap().is_none());
    }

    #[test]
    fn test_latency_delays_delivery() {
        let clock = SharedClock::virtual_clock();
        let hub = LoopbackHub::new(clock.clone(), Duration::from_millis(3));
        let mut a = hub.attach(NetworkAddress(1));
        let mut b = hub.attach(NetworkAddress(2));

        a.send(&ping(1, 2, 1)).unwrap();
        clock.advance(Duration::from_millis(2));
        assert!(b.try_recv().unwrap().is_none());
        clock.advance(Duration::from_millis(1));
        assert!(b.try_recv().unwrap().is_some());
    }

    #[test]
    fn test_loss_policy_drops_pings_and_counts_errors() {
        let hub = LoopbackHub::new(SharedClock::virtual_clock(), Duration::ZERO).with_loss(LossPolicy {
            drop_every_nth_ping: Some(3),
            drop_sequences: vec![1],
        });
        let mut a = hub.attach(NetworkAddress(1));
        let mut b = hub.attach(NetworkAddress(2));

        for sequence in 1..=6 {
            a.send(&ping(1, 2, sequence)).unwrap();
        }
        let mut received = Vec::new();
        while let Some(envelope) = b.try_recv().unwrap() {
            if let Frame::Ping { sequence, .. } = envelope.frame {
                received.push(sequence);
            }
        }
        assert_eq!(received, vec![2, 4, 5]);
        assert_eq!(a.mac_stats().snapshot(), MacCounters::new(6, 3));
    }

    #[test]
    fn test_unicast_to_unknown_node_is_a_mac_error() {
        let hub = LoopbackHub::new(SharedClock::virtual_clock(), Duration::ZERO);
        let mut a = hub.attach(NetworkAddress(1));
        a.send(&ping(1, 9, 1)).unwrap();
        assert_eq!(a.mac_stats().snapshot(), MacCounters::new(1, 1));
    }
}
