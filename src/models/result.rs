//! Test status, result records and engine events

use crate::error::BenchmarkError;
use crate::models::config::TestConfiguration;
use crate::stats::LatencyStats;
use serde::{Deserialize, Serialize};

/// Radio TX counters; `None` means the platform does not report the statistic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacCounters {
    /// Transmission attempts
    pub total: Option<u32>,
    /// Failed attempts
    pub error: Option<u32>,
}

impl MacCounters {
    pub const UNSUPPORTED: MacCounters = MacCounters { total: None, error: None };

    pub fn new(total: u32, error: u32) -> Self {
        Self {
            total: Some(total),
            error: Some(error),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.total.is_some() && self.error.is_some()
    }

    /// Counter increase since `baseline`
    ///
    /// Device counters are monotonic modulo 2^32, so the subtraction wraps. A field is
    /// only reported when both snapshots carry it.
    pub fn delta_since(&self, baseline: &MacCounters) -> MacCounters {
        MacCounters {
            total: wrapping_delta(self.total, baseline.total),
            error: wrapping_delta(self.error, baseline.error),
        }
    }
}

fn wrapping_delta(current: Option<u32>, baseline: Option<u32>) -> Option<u32> {
    Some(current?.wrapping_sub(baseline?))
}

/// Slave-side reception counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RxCounters {
    pub bytes_received: u32,
    pub packets_received: u32,
    pub rx_error: Option<u32>,
    pub rx_total: Option<u32>,
}

/// Result of one test on one node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub duration_ms: u32,
    /// Busy percentage scaled by 100 (`1234` = 12.34%)
    pub cpu_utilization: u32,
    pub rx_counters: RxCounters,
    pub mac_tx_counters: MacCounters,
}

/// Mutable bookkeeping of the running test
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStatus {
    pub test_in_progress: bool,
    /// Slave: discount statistics gathered before the first test packet
    pub reset_counters_pending: bool,
    pub acks_lost: u32,
    /// Sequence number awaiting confirmation, zero when none
    pub waiting_for_ack: u16,
    pub packets_left: u32,
    /// Sequence number of the last scheduled frame
    pub frame_number: u16,
    pub latency: LatencyStats,
}

impl TestStatus {
    pub fn clear(&mut self) {
        *self = TestStatus {
            latency: LatencyStats::new(),
            ..TestStatus::default()
        };
    }
}

/// Everything known about a finished test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResults {
    /// Configuration of the test; absent on the slave, which never sees it
    pub configuration: Option<TestConfiguration>,
    pub status: TestStatus,
    pub local: BenchmarkResult,
    /// Peer result; absent when the slave reports its own completion
    pub remote: Option<BenchmarkResult>,
}

/// Lifecycle notifications raised by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum BenchmarkEvent {
    TestStarted(Result<(), BenchmarkError>),
    TestStopped(Result<(), BenchmarkError>),
    TestCompleted(Result<Box<TestResults>, BenchmarkError>),
    DiscoveryCompleted { peer_count: usize },
}

impl BenchmarkEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BenchmarkEvent::TestStarted(_) => "TestStarted",
            BenchmarkEvent::TestStopped(_) => "TestStopped",
            BenchmarkEvent::TestCompleted(_) => "TestCompleted",
            BenchmarkEvent::DiscoveryCompleted { .. } => "DiscoveryCompleted",
        }
    }

    pub fn is_error(&self) -> bool {
        match self {
            BenchmarkEvent::TestStarted(r) | BenchmarkEvent::TestStopped(r) => r.is_err(),
            BenchmarkEvent::TestCompleted(r) => r.is_err(),
            BenchmarkEvent::DiscoveryCompleted { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_delta_wraps() {
        let baseline = MacCounters::new(u32::MAX - 1, 3);
        let current = MacCounters::new(4, 5);
        assert_eq!(current.delta_since(&baseline), MacCounters::new(6, 2));
    }

    #[test]
    fn test_mac_delta_unsupported() {
        let current = MacCounters::new(10, 1);
        assert_eq!(current.delta_since(&MacCounters::UNSUPPORTED), MacCounters::UNSUPPORTED);
        assert!(!MacCounters::UNSUPPORTED.is_supported());
    }

    #[test]
    fn test_status_clear_resets_latency() {
        let mut status = TestStatus::default();
        status.acks_lost = 3;
        status.latency.update(120);
        status.clear();
        assert_eq!(status.acks_lost, 0);
        assert_eq!(status.latency, LatencyStats::new());
    }

    #[test]
    fn test_event_error_flag() {
        assert!(!BenchmarkEvent::TestStarted(Ok(())).is_error());
        assert!(BenchmarkEvent::TestStopped(Err(BenchmarkError::AlreadyRunning)).is_error());
        assert_eq!(BenchmarkEvent::DiscoveryCompleted { peer_count: 2 }.name(), "DiscoveryCompleted");
    }
}
