//! Property-based tests for the statistics collectors
//!
//! Random latency sequences check the collector invariants; random discovery
//! response sequences check the peer directory's selection bound.

use super::{throughput_kbps, CpuSampler, LatencyStats};
use crate::peers::{PeerDirectory, PeerEntry};
use crate::types::{DeviceId, NetworkAddress};
use proptest::collection::vec;
use proptest::prelude::*;

/// Property-based test generators
mod generators {
    use super::*;

    /// Latency samples in microseconds, up to ten seconds
    pub fn samples() -> impl Strategy<Value = Vec<u32>> {
        vec(0u32..10_000_000, 0..500)
    }

    /// Discovery responses, duplicates allowed
    pub fn responses() -> impl Strategy<Value = Vec<u16>> {
        vec(0u16..0xFFF0, 0..20)
    }
}

mod property_tests {
    use super::*;

    proptest! {
        /// Every sample lies between min and max, sum and count match
        #[test]
        fn samples_bounded_by_min_max(samples in generators::samples()) {
            let mut stats = LatencyStats::new();
            for &sample in &samples {
                stats.update(sample);
            }

            prop_assert_eq!(stats.count as usize, samples.len());
            prop_assert_eq!(stats.sum, samples.iter().map(|&s| u64::from(s)).sum::<u64>());
            for &sample in &samples {
                prop_assert!(stats.min <= sample);
                prop_assert!(sample <= stats.max);
            }
            if !samples.is_empty() {
                prop_assert!(stats.min <= stats.max);
                prop_assert!(stats.min <= stats.average());
                prop_assert!(stats.average() <= stats.max);
            }
        }

        /// A cleared collector behaves exactly like a fresh one
        #[test]
        fn clear_is_idempotent_reset(before in generators::samples(), after in generators::samples()) {
            let mut reused = LatencyStats::new();
            for &sample in &before {
                reused.update(sample);
            }
            reused.clear();

            let mut fresh = LatencyStats::new();
            for &sample in &after {
                reused.update(sample);
                fresh.update(sample);
            }

            prop_assert_eq!(reused, fresh);
        }

        /// The selected peer is always a valid index once peers exist
        #[test]
        fn selected_peer_within_bounds(capacity in 1usize..8, responses in generators::responses()) {
            let mut directory = PeerDirectory::new(capacity);
            for address in responses {
                directory.insert(PeerEntry::new(NetworkAddress(address)));
            }
            directory.select_last();

            prop_assert!(directory.len() <= capacity);
            match directory.selected_index() {
                Some(index) => prop_assert!(index < directory.len()),
                None => prop_assert!(directory.is_empty()),
            }
        }

        /// Utilization never exceeds 100%
        #[test]
        fn cpu_utilization_bounded(busy in vec(0u64..5_000, 0..50), elapsed in 0u64..100_000) {
            let mut sampler = CpuSampler::new();
            sampler.start(0);
            for b in busy {
                sampler.record_busy(b);
            }
            prop_assert!(sampler.utilization(elapsed) <= 10_000);
        }

        /// More bytes in the same window never lower throughput
        #[test]
        fn throughput_monotonic(bytes in 0u64..10_000_000, extra in 0u64..1_000_000, duration in 1u32..600_000) {
            prop_assert!(throughput_kbps(bytes, duration) <= throughput_kbps(bytes + extra, duration));
        }
    }
}

/// Test edge cases and boundary conditions
mod edge_case_tests {
    use super::*;

    #[test]
    fn test_extreme_samples() {
        let mut stats = LatencyStats::new();
        stats.update(u32::MAX);
        stats.update(0);
        assert_eq!(stats.min, 0);
        assert_eq!(stats.max, u32::MAX);
        assert_eq!(stats.average(), u32::MAX / 2);
    }

    #[test]
    fn test_directory_overflow_drops_silently() {
        let mut directory = PeerDirectory::new(2);
        assert!(directory.insert(PeerEntry::new(NetworkAddress(1))));
        assert!(directory.insert(PeerEntry::new(NetworkAddress(2))));
        assert!(!directory.insert(PeerEntry::new(NetworkAddress(3))));
        assert_eq!(directory.len(), 2);
    }

    #[test]
    fn test_device_id_resolution_after_insert() {
        let mut directory = PeerDirectory::new(3);
        directory.insert(PeerEntry::new(NetworkAddress(0x10)));
        assert!(directory.resolve(NetworkAddress(0x10), DeviceId(0xabcd)));
        assert!(!directory.resolve(NetworkAddress(0x11), DeviceId(0x1)));
        assert_eq!(directory.entries()[0].device_id, DeviceId(0xabcd));
    }
}
