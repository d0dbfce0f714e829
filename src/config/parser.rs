//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::{Cli, Command, TestArgs},
    config::env::EnvManager,
    error::Result,
    models::{Config, TestConfiguration},
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Defaults, then the env file, then `BENCHMARK_*` variables, then the CLI
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        EnvManager::load_env_file(self.cli.env_file.as_deref(), self.cli.debug)?;
        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);

        config.validate()?;
        Ok(config)
    }

    fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        if let Some(address) = cli.address {
            config.node_address = address;
        }
        if let Some(device_id) = cli.device_id {
            config.device_id = device_id;
        }
        if let Some(level) = &cli.log_level {
            config.log_level = level.trim().to_lowercase();
        }
        if let Some(format) = &cli.log_format {
            config.log_format = format.trim().to_lowercase();
        }

        if cli.no_color {
            config.enable_color = false;
        } else if cli.color {
            config.enable_color = true;
        }

        // CLI-only flags
        config.verbose = cli.verbose;
        config.debug = cli.debug;

        if let Command::Run(run) = &cli.command {
            if let Some(listen) = run.listen {
                config.listen = listen;
            }
            if !run.peers.is_empty() {
                config.peers = run.peers.clone();
            }
        }

        if let Some(test) = cli.test_args() {
            apply_test_overrides(&mut config.test, test);
        }

        if config.debug {
            println!("Applied CLI overrides to configuration");
            println!(
                "Final config: node={:04x}, mode={}, packets={}, length={}",
                config.node_address, config.test.mode, config.test.packet_count, config.test.payload_length
            );
        }
    }
}

/// Overlay the test parameters given on the command line
pub fn apply_test_overrides(test: &mut TestConfiguration, args: &TestArgs) {
    if let Some(mode) = args.mode {
        test.mode = mode;
    }
    if let Some(count) = args.count {
        test.packet_count = count;
    }
    if let Some(length) = args.length {
        test.payload_length = length;
    }
    if let Some(timeout) = args.ack_timeout {
        test.ack_timeout_ms = timeout;
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Render the effective configuration
pub fn display_config_summary(config: &Config) -> String {
    let peers = if config.peers.is_empty() {
        "(none)".to_string()
    } else {
        config
            .peers
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };

    let summary = [
        format!("Node address: {}", config.address()),
        format!("Device ID: {}", config.device()),
        format!("Profile ID: 0x{:04x}", config.profile_id),
        format!("Max peers: {}", config.max_peers),
        format!("Discovery timeout: {} ms", config.discovery_timeout_ms),
        format!("Tick interval: {} ms", config.tick_interval_ms),
        format!("TX retry limit: {}", config.tx_retry_limit),
        format!("Listen: {}", config.listen),
        format!("Peers: {}", peers),
        format!("Test mode: {}", config.test.mode),
        format!("Payload length: {} bytes", config.test.payload_length),
        format!("ACK timeout: {} ms", config.test.ack_timeout_ms),
        format!("Packet count: {}", config.test.packet_count),
        format!("Log level: {} ({})", config.log_level, config.log_format),
        format!("Color Output: {}", config.enable_color),
        format!("Verbose: {}", config.verbose),
        format!("Debug: {}", config.debug),
    ];
    summary.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TestMode;
    use clap::Parser;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();

        assert_eq!(config.max_peers, crate::defaults::BENCHMARK_MAX_PEER_NUMBER);
        assert_eq!(config.test.packet_count, crate::defaults::DEFAULT_PACKET_COUNT);
        assert_eq!(config.enable_color, crate::defaults::DEFAULT_ENABLE_COLOR);
        assert!(!config.verbose);
        assert!(!config.debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "lbm",
            "--no-color",
            "--verbose",
            "--address",
            "0042",
            "--log-level",
            "DEBUG",
            "run",
            "--role",
            "slave",
            "--listen",
            "127.0.0.1:47100",
            "--peer",
            "127.0.0.1:47101",
            "--mode",
            "uni",
            "--count",
            "25",
        ]);
        let parser = ConfigParser::new(cli);
        let mut config = Config::default();
        parser.apply_cli_overrides(&mut config);

        assert!(!config.enable_color);
        assert!(config.verbose);
        assert_eq!(config.node_address, 0x42);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.listen, "127.0.0.1:47100".parse().unwrap());
        assert_eq!(config.peers, vec!["127.0.0.1:47101".parse().unwrap()]);
        assert_eq!(config.test.mode, TestMode::Unidirectional);
        assert_eq!(config.test.packet_count, 25);
        assert_eq!(config.test.payload_length, crate::defaults::DEFAULT_PAYLOAD_LENGTH);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides_env_values() {
        let mut config = Config::default();
        config
            .merge_from_lookup(|key| match key {
                "BENCHMARK_PACKET_COUNT" => Some("8".to_string()),
                "BENCHMARK_MODE" => Some("echo".to_string()),
                _ => None,
            })
            .unwrap();

        let cli = Cli::parse_from(["lbm", "simulate", "--count", "12"]);
        ConfigParser::new(cli).apply_cli_overrides(&mut config);

        assert_eq!(config.test.packet_count, 12);
        assert_eq!(config.test.mode, TestMode::Echo);
    }

    #[test]
    fn test_invalid_override_fails_validation() {
        let cli = Cli::parse_from(["lbm", "simulate", "--length", "0"]);
        let mut config = Config::default();
        ConfigParser::new(cli).apply_cli_overrides(&mut config);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_summary() {
        let summary = display_config_summary(&Config::default());

        assert!(summary.contains("Node address:"));
        assert!(summary.contains("Test mode: ack"));
        assert!(summary.contains("Peers: (none)"));
        assert!(summary.contains("Packet count:"));
    }
}
