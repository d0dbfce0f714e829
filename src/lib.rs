//! Link Benchmark
//!
//! Measures throughput, packet error rate and exchange latency between two
//! radio nodes. A master discovers peers, drives a timed packet exchange
//! against one of them and collects both nodes' results; the slave side
//! answers the remote control commands. The engine is sans-IO: transports,
//! clocks and device counters are plugged in through traits, so the same
//! state machine runs over a simulated medium, UDP or a real radio stack.

pub mod app;
pub mod cli;
pub mod config;
pub mod control;
pub mod driver;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;
pub mod output;
pub mod peers;
pub mod ping;
pub mod platform;
pub mod sim;
pub mod stats;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use engine::{BenchmarkEngine, EngineSettings};
pub use error::{BenchmarkError, Result};
pub use models::{BenchmarkEvent, BenchmarkResult, Config, TestConfiguration, TestResults};
pub use output::{ColoredFormatter, OutputCoordinator, OutputFormatter, OutputFormatterFactory, PlainFormatter};
pub use sim::{run_simulation, SimulationOptions, SimulationReport};
pub use stats::{LatencyStats, TestSummary};
pub use types::{DeviceId, NetworkAddress, TestMode, TestState};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
pub const BUILD_TIME: &str = env!("BUILD_TIME");
pub const GIT_COMMIT: &str = env!("GIT_COMMIT");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_NODE_ADDRESS: u16 = 0x0001;
    pub const DEFAULT_DEVICE_ID: u64 = 0x0012_4B00_0000_0001;

    /// Peers remembered by one discovery round
    pub const BENCHMARK_MAX_PEER_NUMBER: usize = 5;
    pub const MAX_PEER_CAPACITY: usize = 64;
    pub const BENCHMARK_DISCOVERY_TIMEOUT: Duration = Duration::from_millis(3000);

    pub const TICK_INTERVAL: Duration = Duration::from_millis(2);
    pub const DEFAULT_TX_RETRY_LIMIT: u32 = 100;
    pub const DEFAULT_UDP_PORT: u16 = 47000;
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    pub const DEFAULT_PAYLOAD_LENGTH: u16 = 64;
    pub const MAX_PAYLOAD_LENGTH: u16 = 1024;
    pub const DEFAULT_ACK_TIMEOUT_MS: u32 = 200;
    pub const DEFAULT_PACKET_COUNT: u32 = 1000;
}
