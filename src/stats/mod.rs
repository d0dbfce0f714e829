//! Statistics collected while a benchmark test runs
//!
//! [`LatencyStats`] accumulates per-exchange latency samples, [`CpuSampler`]
//! measures how busy the node was during the test window and [`TestSummary`]
//! derives the figures reported at the end of a test (throughput, packet error
//! rates, latency in milliseconds).

use crate::error::{BenchmarkError, Result};
use crate::models::{BenchmarkResult, MacCounters, TestResults};
use crate::types::TestMode;
use serde::{Deserialize, Serialize};

#[cfg(test)]
mod comprehensive_tests;

/// Running min/max/sum/count of latency samples in microseconds
///
/// `min` holds `u32::MAX` until the first sample arrives; afterwards
/// `min <= max` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub min: u32,
    pub max: u32,
    pub sum: u64,
    pub count: u32,
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyStats {
    pub const fn new() -> Self {
        Self {
            min: u32::MAX,
            max: 0,
            sum: 0,
            count: 0,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn update(&mut self, sample_us: u32) {
        self.count = self.count.saturating_add(1);
        self.sum = self.sum.saturating_add(u64::from(sample_us));
        self.min = self.min.min(sample_us);
        self.max = self.max.max(sample_us);
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Mean sample, zero when nothing was recorded
    pub fn average(&self) -> u32 {
        if self.count == 0 {
            0
        } else {
            (self.sum / u64::from(self.count)) as u32
        }
    }

    pub fn min_sample(&self) -> Option<u32> {
        (!self.is_empty()).then_some(self.min)
    }

    pub fn max_sample(&self) -> Option<u32> {
        (!self.is_empty()).then_some(self.max)
    }
}

/// Busy-time based CPU utilization sampler
///
/// The owner reports busy intervals with [`CpuSampler::record_busy`]; the
/// utilization is the busy share of the window since the last start or clear,
/// scaled by 100 (`10000` = fully busy).
#[derive(Debug, Clone, Default)]
pub struct CpuSampler {
    running: bool,
    window_start_us: u64,
    window_end_us: Option<u64>,
    busy_us: u64,
}

impl CpuSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now_us: u64) {
        self.running = true;
        self.window_start_us = now_us;
        self.window_end_us = None;
        self.busy_us = 0;
    }

    /// Restart the window without changing whether sampling is active
    pub fn clear(&mut self, now_us: u64) {
        self.window_start_us = now_us;
        self.window_end_us = None;
        self.busy_us = 0;
    }

    pub fn stop(&mut self, now_us: u64) {
        if self.running {
            self.running = false;
            self.window_end_us = Some(now_us);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn record_busy(&mut self, busy_us: u64) {
        if self.running {
            self.busy_us = self.busy_us.saturating_add(busy_us);
        }
    }

    pub fn utilization(&self, now_us: u64) -> u32 {
        let end = self.window_end_us.unwrap_or(now_us);
        let elapsed = end.saturating_sub(self.window_start_us);
        if elapsed == 0 {
            return 0;
        }
        let scaled = self.busy_us.saturating_mul(10_000) / elapsed;
        scaled.min(10_000) as u32
    }
}

/// Latency figures in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub min_ms: f64,
    pub max_ms: f64,
    pub avg_ms: f64,
}

impl LatencySummary {
    pub fn from_stats(stats: &LatencyStats) -> Option<Self> {
        if stats.is_empty() {
            return None;
        }
        Some(Self {
            min_ms: f64::from(stats.min) / 1000.0,
            max_ms: f64::from(stats.max) / 1000.0,
            avg_ms: f64::from(stats.average()) / 1000.0,
        })
    }
}

/// Derived figures of a completed master-side test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSummary {
    pub mode: TestMode,
    pub payload_length: u16,
    pub duration_ms: u32,
    pub packets_sent: u32,
    pub packets_acked: u32,
    /// Throughput of every transmitted frame
    pub throughput_kbps: u32,
    /// Throughput of confirmed frames only
    pub throughput_rtx_kbps: u32,
    /// Application-level packet error rate; `None` when nothing was sent
    pub per_percent: Option<f64>,
    /// MAC-level packet error rate; `None` when the counters are unavailable
    pub mac_per_percent: Option<f64>,
    pub latency: Option<LatencySummary>,
    pub cpu_local_percent: f64,
    pub cpu_remote_percent: Option<f64>,
}

impl TestSummary {
    pub fn from_results(results: &TestResults) -> Result<Self> {
        let config = results
            .configuration
            .ok_or_else(|| BenchmarkError::invalid_argument("Results carry no test configuration"))?;
        let duration_ms = results.local.duration_ms;
        if duration_ms == 0 {
            return Err(BenchmarkError::invalid_state("Test duration is zero"));
        }

        let packets_sent = config.packet_count.saturating_sub(results.status.packets_left);
        let packets_acked = packets_sent.saturating_sub(results.status.acks_lost);
        let length = u64::from(config.payload_length);

        let per_percent = match config.mode {
            TestMode::Unidirectional => None,
            _ if packets_sent == 0 => None,
            _ => Some(percentage(u64::from(packets_sent - packets_acked), u64::from(packets_sent))),
        };

        let mac_per_percent = match (config.mode, results.remote.as_ref()) {
            (TestMode::Unidirectional, _) => mac_per(&results.local.mac_tx_counters),
            (_, Some(remote)) => mac_per(&combined_mac(&results.local, remote)),
            (_, None) => None,
        };

        Ok(Self {
            mode: config.mode,
            payload_length: config.payload_length,
            duration_ms,
            packets_sent,
            packets_acked,
            throughput_kbps: throughput_kbps(length * u64::from(packets_sent), duration_ms),
            throughput_rtx_kbps: throughput_kbps(length * u64::from(packets_acked), duration_ms),
            per_percent,
            mac_per_percent,
            latency: LatencySummary::from_stats(&results.status.latency),
            cpu_local_percent: f64::from(results.local.cpu_utilization) / 100.0,
            cpu_remote_percent: results
                .remote
                .as_ref()
                .map(|remote| f64::from(remote.cpu_utilization) / 100.0),
        })
    }
}

/// Kilobits per second, where one kilobit is 1024 bits
pub fn throughput_kbps(bytes: u64, duration_ms: u32) -> u32 {
    if duration_ms == 0 {
        return 0;
    }
    let kbps = bytes.saturating_mul(1000) / (u64::from(duration_ms) * 128);
    kbps.min(u64::from(u32::MAX)) as u32
}

fn percentage(part: u64, whole: u64) -> f64 {
    part as f64 * 100.0 / whole as f64
}

fn mac_per(counters: &MacCounters) -> Option<f64> {
    match (counters.total, counters.error) {
        (Some(total), Some(error)) if total > 0 => Some(percentage(u64::from(error), u64::from(total))),
        _ => None,
    }
}

fn combined_mac(local: &BenchmarkResult, remote: &BenchmarkResult) -> MacCounters {
    let sum = |a: Option<u32>, b: Option<u32>| Some(a?.saturating_add(b?));
    MacCounters {
        total: sum(local.mac_tx_counters.total, remote.mac_tx_counters.total),
        error: sum(local.mac_tx_counters.error, remote.mac_tx_counters.error),
    }
}
