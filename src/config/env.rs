//! Environment variable handling and .env file management

use crate::error::{BenchmarkError, Result};
use crate::types::{NetworkAddress, TestMode};
use std::net::SocketAddr;
use std::path::Path;

/// Default location of the optional environment file
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load an environment file into the process environment
    ///
    /// Without an explicit `path` a missing `.env` is not an error. Variables
    /// already present in the environment are left untouched.
    pub fn load_env_file(path: Option<&Path>, debug: bool) -> Result<()> {
        match path {
            Some(path) => {
                dotenv::from_path(path).map_err(|e| {
                    BenchmarkError::config(format!("Failed to load {}: {}", path.display(), e))
                })?;
                if debug {
                    println!("Loaded configuration from {}", path.display());
                }
            }
            None if Path::new(DEFAULT_ENV_FILE).exists() => {
                dotenv::from_filename(DEFAULT_ENV_FILE)
                    .map_err(|e| BenchmarkError::config(format!("Failed to load .env file: {}", e)))?;
                if debug {
                    println!("Loaded configuration from .env file");
                }
            }
            None => {
                if debug {
                    println!("No .env file found, using defaults and CLI arguments");
                }
            }
        }
        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# Link Benchmark Configuration
#
# Values here are used as defaults and can be overridden by command-line
# arguments. Variables already set in the environment take precedence.

# Local node identity (hexadecimal)
# BENCHMARK_NODE_ADDRESS=0001
# BENCHMARK_DEVICE_ID=00124b0000000001
# BENCHMARK_PROFILE_ID=0104

# Peer discovery
# BENCHMARK_MAX_PEERS=5
# BENCHMARK_DISCOVERY_TIMEOUT_MS=3000

# State machine tick and transmit retry bound
# BENCHMARK_TICK_INTERVAL_MS=2
# BENCHMARK_TX_RETRY_LIMIT=100

# UDP transport used by `lbm run`
# BENCHMARK_LISTEN=0.0.0.0:47000
# BENCHMARK_PEERS=192.168.1.20:47000,192.168.1.21:47000

# Test defaults
# BENCHMARK_MODE=ack
# BENCHMARK_PAYLOAD_LENGTH=64
# BENCHMARK_ACK_TIMEOUT_MS=200
# BENCHMARK_PACKET_COUNT=1000

# Output
# BENCHMARK_LOG_LEVEL=info
# BENCHMARK_LOG_FORMAT=console
# BENCHMARK_ENABLE_COLOR=true
"#
        .to_string()
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        std::fs::write(path, Self::create_example_env_content())
            .map_err(|e| BenchmarkError::config(format!("Failed to write example .env file: {}", e)))
    }

    /// Check the format of one variable before it is merged
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        let invalid = |reason: String| BenchmarkError::config(format!("Invalid {} value '{}': {}", key, value, reason));

        match key {
            "BENCHMARK_NODE_ADDRESS" => {
                let address: NetworkAddress = value.parse().map_err(|e: BenchmarkError| invalid(e.to_string()))?;
                if address.is_broadcast() {
                    return Err(invalid("broadcast addresses cannot be assigned to a node".to_string()));
                }
            }
            "BENCHMARK_DEVICE_ID" => {
                u64::from_str_radix(value.trim_start_matches("0x"), 16).map_err(|e| invalid(e.to_string()))?;
            }
            "BENCHMARK_PROFILE_ID" => {
                u16::from_str_radix(value.trim_start_matches("0x"), 16).map_err(|e| invalid(e.to_string()))?;
            }
            "BENCHMARK_MAX_PEERS" | "BENCHMARK_DISCOVERY_TIMEOUT_MS" | "BENCHMARK_TICK_INTERVAL_MS"
            | "BENCHMARK_TX_RETRY_LIMIT" | "BENCHMARK_PACKET_COUNT" | "BENCHMARK_ACK_TIMEOUT_MS" => {
                let number: u64 = value.parse().map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;
                if number == 0 && key != "BENCHMARK_ACK_TIMEOUT_MS" {
                    return Err(invalid("must be greater than 0".to_string()));
                }
            }
            "BENCHMARK_PAYLOAD_LENGTH" => {
                let length: u16 = value.parse().map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;
                if length == 0 || length > crate::defaults::MAX_PAYLOAD_LENGTH {
                    return Err(invalid(format!(
                        "must be between 1 and {}",
                        crate::defaults::MAX_PAYLOAD_LENGTH
                    )));
                }
            }
            "BENCHMARK_LISTEN" => {
                value.parse::<SocketAddr>().map_err(|e| invalid(e.to_string()))?;
            }
            "BENCHMARK_PEERS" => {
                for peer in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                    peer.parse::<SocketAddr>().map_err(|e| invalid(format!("{}: {}", peer, e)))?;
                }
            }
            "BENCHMARK_MODE" => {
                value.parse::<TestMode>().map_err(|e| invalid(e.to_string()))?;
            }
            "BENCHMARK_ENABLE_COLOR" => {
                value.parse::<bool>().map_err(|e| invalid(e.to_string()))?;
            }
            "BENCHMARK_LOG_LEVEL" => {
                value
                    .parse::<crate::logging::LogLevel>()
                    .map_err(|e| invalid(e.to_string()))?;
            }
            "BENCHMARK_LOG_FORMAT" => {
                value
                    .parse::<crate::logging::LogFormat>()
                    .map_err(|e| invalid(e.to_string()))?;
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_env_var_validation() {
        assert!(EnvManager::validate_env_var("BENCHMARK_NODE_ADDRESS", "0x1a2b").is_ok());
        assert!(EnvManager::validate_env_var("BENCHMARK_DEVICE_ID", "00124b0000000001").is_ok());
        assert!(EnvManager::validate_env_var("BENCHMARK_PEERS", "127.0.0.1:47001, 127.0.0.1:47002").is_ok());
        assert!(EnvManager::validate_env_var("BENCHMARK_MODE", "echo").is_ok());
        assert!(EnvManager::validate_env_var("BENCHMARK_PAYLOAD_LENGTH", "64").is_ok());
        assert!(EnvManager::validate_env_var("BENCHMARK_ACK_TIMEOUT_MS", "0").is_ok());
        assert!(EnvManager::validate_env_var("SOMETHING_ELSE", "whatever").is_ok());

        assert!(EnvManager::validate_env_var("BENCHMARK_NODE_ADDRESS", "fffd").is_err());
        assert!(EnvManager::validate_env_var("BENCHMARK_NODE_ADDRESS", "xyz").is_err());
        assert!(EnvManager::validate_env_var("BENCHMARK_PEERS", "localhost").is_err());
        assert!(EnvManager::validate_env_var("BENCHMARK_MODE", "burst").is_err());
        assert!(EnvManager::validate_env_var("BENCHMARK_PACKET_COUNT", "0").is_err());
        assert!(EnvManager::validate_env_var("BENCHMARK_PAYLOAD_LENGTH", "5000").is_err());
        assert!(EnvManager::validate_env_var("BENCHMARK_ENABLE_COLOR", "maybe").is_err());
    }

    #[test]
    fn test_example_env_content() {
        let content = EnvManager::create_example_env_content();
        for key in [
            "BENCHMARK_NODE_ADDRESS=",
            "BENCHMARK_PEERS=",
            "BENCHMARK_MODE=",
            "BENCHMARK_PACKET_COUNT=",
            "BENCHMARK_LOG_LEVEL=",
        ] {
            assert!(content.contains(key), "missing {}", key);
        }
    }

    #[test]
    fn test_save_example_env_file() {
        let temp_file = NamedTempFile::new().unwrap();
        EnvManager::save_example_env_file(temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("Link Benchmark Configuration"));
    }

    #[test]
    fn test_missing_explicit_env_file_is_an_error() {
        let result = EnvManager::load_env_file(Some(Path::new("/nonexistent/benchmark.env")), false);
        assert!(matches!(result, Err(BenchmarkError::Config(_))));
    }
}
