//! Platform services the engine consumes: clock, CPU sampler, MAC counters

use crate::models::MacCounters;
use crate::stats::CpuSampler;
use crate::transport::link::SharedMacStats;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic microsecond clock, either real or driven by a simulation
#[derive(Debug, Clone)]
pub enum SharedClock {
    Monotonic(Instant),
    Virtual(Arc<AtomicU64>),
}

impl SharedClock {
    pub fn monotonic() -> Self {
        SharedClock::Monotonic(Instant::now())
    }

    pub fn virtual_clock() -> Self {
        SharedClock::Virtual(Arc::new(AtomicU64::new(0)))
    }

    pub fn now_us(&self) -> u64 {
        match self {
            SharedClock::Monotonic(epoch) => epoch.elapsed().as_micros() as u64,
            SharedClock::Virtual(now) => now.load(Ordering::Acquire),
        }
    }

    /// Move a virtual clock forward; a monotonic clock ignores this
    pub fn advance(&self, by: Duration) {
        if let SharedClock::Virtual(now) = self {
            now.fetch_add(by.as_micros() as u64, Ordering::AcqRel);
        }
    }
}

/// Services the engine reads from the node it runs on
pub trait Platform {
    fn now_us(&self) -> u64;

    fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }

    fn cpu_start(&mut self);

    fn cpu_stop(&mut self);

    /// Restart the measurement window
    fn cpu_clear(&mut self);

    /// Busy share of the window, percent scaled by 100
    fn cpu_utilization(&self) -> u32;

    /// Radio TX counters; unsupported fields are `None`
    fn mac_tx_counters(&self) -> MacCounters;
}

/// Platform backed by a shared clock, a busy-time sampler and link counters
#[derive(Debug, Clone)]
pub struct NodePlatform {
    clock: SharedClock,
    cpu: CpuSampler,
    mac: Option<SharedMacStats>,
}

impl NodePlatform {
    /// Real-time platform for a host process
    pub fn host(mac: Option<SharedMacStats>) -> Self {
        Self::with_clock(SharedClock::monotonic(), mac)
    }

    pub fn with_clock(clock: SharedClock, mac: Option<SharedMacStats>) -> Self {
        Self {
            clock,
            cpu: CpuSampler::new(),
            mac,
        }
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Report time the node spent working
    pub fn record_busy(&mut self, busy: Duration) {
        self.cpu.record_busy(busy.as_micros() as u64);
    }
}

impl Platform for NodePlatform {
    fn now_us(&self) -> u64 {
        self.clock.now_us()
    }

    fn cpu_start(&mut self) {
        self.cpu.start(self.clock.now_us());
    }

    fn cpu_stop(&mut self) {
        self.cpu.stop(self.clock.now_us());
    }

    fn cpu_clear(&mut self) {
        self.cpu.clear(self.clock.now_us());
    }

    fn cpu_utilization(&self) -> u32 {
        self.cpu.utilization(self.clock.now_us())
    }

    fn mac_tx_counters(&self) -> MacCounters {
        self.mac
            .as_ref()
            .map(|stats| stats.snapshot())
            .unwrap_or(MacCounters::UNSUPPORTED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::link::MacStats;

    #[test]
    fn test_virtual_clock_is_shared() {
        let clock = SharedClock::virtual_clock();
        let other = clock.clone();
        clock.advance(Duration::from_millis(3));
        assert_eq!(other.now_us(), 3_000);
    }

    #[test]
    fn test_platform_without_mac_stats() {
        let platform = NodePlatform::with_clock(SharedClock::virtual_clock(), None);
        assert_eq!(platform.mac_tx_counters(), MacCounters::UNSUPPORTED);
    }

    #[test]
    fn test_platform_cpu_window() {
        let clock = SharedClock::virtual_clock();
        let stats = Arc::new(MacStats::default());
        let mut platform = NodePlatform::with_clock(clock.clone(), Some(stats.clone()));

        platform.cpu_start();
        platform.record_busy(Duration::from_millis(1));
        clock.advance(Duration::from_millis(4));
        assert_eq!(platform.cpu_utilization(), 2_500);

        stats.record(true);
        assert_eq!(platform.mac_tx_counters(), MacCounters::new(1, 0));
    }
}
