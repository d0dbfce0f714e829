//! Configuration data models and validation

use crate::defaults;
use crate::types::{BenchmarkError, DeviceId, NetworkAddress, ProfileId, Result, TestMode};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Parameters of a single benchmark test
///
/// The engine keeps its own copy for the duration of a test, so the caller can
/// edit its settings freely without affecting a running test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestConfiguration {
    /// Payload bytes per exchange
    pub payload_length: u16,
    /// How long to wait for an ACK or echo
    pub ack_timeout_ms: u32,
    /// Number of exchanges in the test
    pub packet_count: u32,
    pub mode: TestMode,
}

impl Default for TestConfiguration {
    fn default() -> Self {
        Self {
            payload_length: defaults::DEFAULT_PAYLOAD_LENGTH,
            ack_timeout_ms: defaults::DEFAULT_ACK_TIMEOUT_MS,
            packet_count: defaults::DEFAULT_PACKET_COUNT,
            mode: TestMode::default(),
        }
    }
}

impl TestConfiguration {
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.ack_timeout_ms))
    }

    /// Reject values the engine cannot run a test with
    pub fn validate(&self) -> Result<()> {
        if self.payload_length == 0 {
            return Err(BenchmarkError::invalid_argument("Payload length must be greater than 0"));
        }
        if self.payload_length > defaults::MAX_PAYLOAD_LENGTH {
            return Err(BenchmarkError::invalid_argument(format!(
                "Payload length cannot exceed {} bytes",
                defaults::MAX_PAYLOAD_LENGTH
            )));
        }
        if self.packet_count == 0 {
            return Err(BenchmarkError::invalid_argument("Packet count must be greater than 0"));
        }
        if self.mode.is_confirmed() && self.ack_timeout_ms == 0 {
            return Err(BenchmarkError::invalid_argument("ACK timeout must be greater than 0"));
        }
        Ok(())
    }
}

/// Node configuration: identity, discovery, transport and test defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Local 16-bit network address
    #[serde(default = "default_node_address")]
    pub node_address: u16,

    /// Local 64-bit device identifier
    #[serde(default = "default_device_id")]
    pub device_id: u64,

    /// Profile identifier peers must advertise to be discovered
    #[serde(default = "default_profile_id")]
    pub profile_id: u16,

    /// Peer directory capacity
    #[serde(default = "default_max_peers")]
    pub max_peers: usize,

    /// How long discovery collects responses
    #[serde(default = "default_discovery_timeout_ms")]
    pub discovery_timeout_ms: u64,

    /// Period of the state machine tick
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Consecutive failed exchange attempts before the test is aborted
    #[serde(default = "default_tx_retry_limit")]
    pub tx_retry_limit: u32,

    /// UDP listen address used by `lbm run`
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// UDP endpoints of the other nodes
    #[serde(default)]
    pub peers: Vec<SocketAddr>,

    /// Test settings used when the CLI does not override them
    #[serde(default)]
    pub test: TestConfiguration,

    /// Minimum log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format (console, json, compact)
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_address: default_node_address(),
            device_id: default_device_id(),
            profile_id: default_profile_id(),
            max_peers: default_max_peers(),
            discovery_timeout_ms: default_discovery_timeout_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            tx_retry_limit: default_tx_retry_limit(),
            listen: default_listen(),
            peers: Vec::new(),
            test: TestConfiguration::default(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address(&self) -> NetworkAddress {
        NetworkAddress(self.node_address)
    }

    pub fn device(&self) -> DeviceId {
        DeviceId(self.device_id)
    }

    pub fn profile(&self) -> ProfileId {
        ProfileId(self.profile_id)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Validate the configuration and return the first problem found
    pub fn validate(&self) -> Result<()> {
        if NetworkAddress(self.node_address).is_broadcast() {
            return Err(BenchmarkError::config(format!(
                "Node address {:04x} is reserved for broadcast",
                self.node_address
            )));
        }

        if self.max_peers == 0 || self.max_peers > defaults::MAX_PEER_CAPACITY {
            return Err(BenchmarkError::config(format!(
                "Peer capacity must be between 1 and {}",
                defaults::MAX_PEER_CAPACITY
            )));
        }

        if self.discovery_timeout_ms == 0 || self.discovery_timeout_ms > 60_000 {
            return Err(BenchmarkError::config("Discovery timeout must be between 1 and 60000 ms"));
        }

        if self.tick_interval_ms == 0 || self.tick_interval_ms > 1_000 {
            return Err(BenchmarkError::config("Tick interval must be between 1 and 1000 ms"));
        }

        if self.tx_retry_limit == 0 {
            return Err(BenchmarkError::config("Transmit retry limit must be greater than 0"));
        }

        if self.peers.iter().any(|peer| *peer == self.listen) {
            return Err(BenchmarkError::config(format!(
                "Peer endpoint {} is the local listen address",
                self.listen
            )));
        }

        self.log_level
            .parse::<crate::logging::LogLevel>()
            .map_err(|e| BenchmarkError::config(e.to_string()))?;

        self.log_format
            .parse::<crate::logging::LogFormat>()
            .map_err(|e| BenchmarkError::config(e.to_string()))?;

        self.test
            .validate()
            .map_err(|e| BenchmarkError::config(e.to_string()))
    }

    /// Merge `BENCHMARK_*` environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        self.merge_from_lookup(|key| std::env::var(key).ok())
    }

    /// Merge settings from an arbitrary key lookup (environment, parsed .env contents)
    pub fn merge_from_lookup<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("BENCHMARK_NODE_ADDRESS") {
            self.node_address = value
                .parse::<NetworkAddress>()
                .map_err(|e| BenchmarkError::config(format!("Invalid BENCHMARK_NODE_ADDRESS: {}", e)))?
                .0;
        }

        if let Some(value) = lookup("BENCHMARK_DEVICE_ID") {
            let digits = value.trim().trim_start_matches("0x");
            self.device_id = u64::from_str_radix(digits, 16).map_err(|e| {
                BenchmarkError::config(format!("Invalid BENCHMARK_DEVICE_ID value '{}': {}", value, e))
            })?;
        }

        if let Some(value) = lookup("BENCHMARK_PROFILE_ID") {
            let digits = value.trim().trim_start_matches("0x");
            self.profile_id = u16::from_str_radix(digits, 16).map_err(|e| {
                BenchmarkError::config(format!("Invalid BENCHMARK_PROFILE_ID value '{}': {}", value, e))
            })?;
        }

        if let Some(value) = lookup("BENCHMARK_MAX_PEERS") {
            self.max_peers = parse_env("BENCHMARK_MAX_PEERS", &value)?;
        }

        if let Some(value) = lookup("BENCHMARK_DISCOVERY_TIMEOUT_MS") {
            self.discovery_timeout_ms = parse_env("BENCHMARK_DISCOVERY_TIMEOUT_MS", &value)?;
        }

        if let Some(value) = lookup("BENCHMARK_TICK_INTERVAL_MS") {
            self.tick_interval_ms = parse_env("BENCHMARK_TICK_INTERVAL_MS", &value)?;
        }

        if let Some(value) = lookup("BENCHMARK_TX_RETRY_LIMIT") {
            self.tx_retry_limit = parse_env("BENCHMARK_TX_RETRY_LIMIT", &value)?;
        }

        if let Some(value) = lookup("BENCHMARK_LISTEN") {
            self.listen = parse_env("BENCHMARK_LISTEN", &value)?;
        }

        if let Some(value) = lookup("BENCHMARK_PEERS") {
            self.peers = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| parse_env("BENCHMARK_PEERS", s))
                .collect::<Result<Vec<SocketAddr>>>()?;
        }

        if let Some(value) = lookup("BENCHMARK_PAYLOAD_LENGTH") {
            self.test.payload_length = parse_env("BENCHMARK_PAYLOAD_LENGTH", &value)?;
        }

        if let Some(value) = lookup("BENCHMARK_ACK_TIMEOUT_MS") {
            self.test.ack_timeout_ms = parse_env("BENCHMARK_ACK_TIMEOUT_MS", &value)?;
        }

        if let Some(value) = lookup("BENCHMARK_PACKET_COUNT") {
            self.test.packet_count = parse_env("BENCHMARK_PACKET_COUNT", &value)?;
        }

        if let Some(value) = lookup("BENCHMARK_MODE") {
            self.test.mode = value
                .parse()
                .map_err(|e| BenchmarkError::config(format!("Invalid BENCHMARK_MODE: {}", e)))?;
        }

        if let Some(value) = lookup("BENCHMARK_LOG_LEVEL") {
            self.log_level = value.trim().to_lowercase();
        }

        if let Some(value) = lookup("BENCHMARK_LOG_FORMAT") {
            self.log_format = value.trim().to_lowercase();
        }

        if let Some(value) = lookup("BENCHMARK_ENABLE_COLOR") {
            self.enable_color = parse_env("BENCHMARK_ENABLE_COLOR", &value)?;
        }

        Ok(())
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| BenchmarkError::config(format!("Invalid {} value '{}': {}", key, value, e)))
}

// Default value functions for serde
fn default_node_address() -> u16 {
    defaults::DEFAULT_NODE_ADDRESS
}

fn default_device_id() -> u64 {
    defaults::DEFAULT_DEVICE_ID
}

fn default_profile_id() -> u16 {
    ProfileId::HOME_AUTOMATION.0
}

fn default_max_peers() -> usize {
    defaults::BENCHMARK_MAX_PEER_NUMBER
}

fn default_discovery_timeout_ms() -> u64 {
    defaults::BENCHMARK_DISCOVERY_TIMEOUT.as_millis() as u64
}

fn default_tick_interval_ms() -> u64 {
    defaults::TICK_INTERVAL.as_millis() as u64
}

fn default_tx_retry_limit() -> u32 {
    defaults::DEFAULT_TX_RETRY_LIMIT
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], defaults::DEFAULT_UDP_PORT))
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "console".to_string()
}

fn default_enable_color() -> bool {
    defaults::DEFAULT_ENABLE_COLOR
}
