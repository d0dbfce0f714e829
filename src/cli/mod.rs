//! Command-line interface of the `lbm` binary

use crate::types::TestMode;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Link Benchmark - measures throughput, packet error rate and latency between two nodes
#[derive(Parser, Debug, Clone)]
#[command(name = "lbm")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Force colored output
    #[arg(long, global = true)]
    pub color: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Load settings from this file instead of ./.env
    #[arg(long, global = true, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Local network address (hex)
    #[arg(long, global = true, value_parser = parse_hex_u16)]
    pub address: Option<u16>,

    /// Local device identifier (hex)
    #[arg(long, global = true, value_parser = parse_hex_u64)]
    pub device_id: Option<u64>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (console, json, compact)
    #[arg(long, global = true)]
    pub log_format: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run a master and a slave in one process over a simulated link
    Simulate(SimulateArgs),
    /// Run one node over UDP
    Run(RunArgs),
    /// Print the effective configuration
    Config {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Test parameters that override the configured defaults
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct TestArgs {
    /// Exchange mode (unidirectional, ack, echo)
    #[arg(short, long)]
    pub mode: Option<TestMode>,

    /// Number of exchanges
    #[arg(short = 'n', long)]
    pub count: Option<u32>,

    /// Payload bytes per exchange
    #[arg(short = 'l', long)]
    pub length: Option<u16>,

    /// Milliseconds to wait for an ACK or echo
    #[arg(short = 't', long)]
    pub ack_timeout: Option<u32>,
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub test: TestArgs,

    /// One-way latency of the simulated link in milliseconds
    #[arg(long, default_value_t = 1)]
    pub latency_ms: u64,

    /// Lose every n-th test frame
    #[arg(long, value_name = "N")]
    pub drop_every: Option<u32>,

    /// Lose the test frames with these sequence numbers
    #[arg(long, value_delimiter = ',', value_name = "SEQ")]
    pub drop_seq: Vec<u16>,

    /// Also dump the raw result records
    #[arg(long)]
    pub raw: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Discover a peer, run the test and print the report
    Master,
    /// Serve start, stop and result requests from a master
    Slave,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(long, value_enum)]
    pub role: Role,

    /// UDP address to listen on
    #[arg(long)]
    pub listen: Option<SocketAddr>,

    /// UDP address of another node (repeatable)
    #[arg(long = "peer", action = ArgAction::Append)]
    pub peers: Vec<SocketAddr>,

    /// Test against this peer directory entry instead of the last one found
    #[arg(long)]
    pub peer_index: Option<usize>,

    /// Slave: exit after the first completed test
    #[arg(long)]
    pub once: bool,

    #[command(flatten)]
    pub test: TestArgs,

    /// Also dump the raw result records
    #[arg(long)]
    pub raw: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }
        if let Command::Run(run) = &self.command {
            if run.role == Role::Slave && run.peer_index.is_some() {
                return Err("--peer-index only applies to --role master".to_string());
            }
        }
        Ok(())
    }

    /// Test overrides of the selected subcommand
    pub fn test_args(&self) -> Option<&TestArgs> {
        match &self.command {
            Command::Simulate(args) => Some(&args.test),
            Command::Run(args) => Some(&args.test),
            Command::Config { .. } => None,
        }
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color {
            false
        } else {
            supports_color()
        }
    }
}

fn parse_hex_u16(s: &str) -> Result<u16, String> {
    let digits = s.trim().trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(digits, 16).map_err(|e| format!("Invalid hex value '{}': {}", s, e))
}

fn parse_hex_u64(s: &str) -> Result<u64, String> {
    let digits = s.trim().trim_start_matches("0x").trim_start_matches("0X");
    u64::from_str_radix(digits, 16).map_err(|e| format!("Invalid hex value '{}': {}", s, e))
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}
