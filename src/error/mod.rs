//! Error handling for the link benchmark

use crate::control::ControlCommand;
use crate::types::RemoteStatus;
use thiserror::Error;

/// Error kinds raised by the benchmark engine and its collaborators
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BenchmarkError {
    /// A test (or a pending start) is already running
    #[error("A benchmark test is already in progress")]
    AlreadyRunning,

    /// Missing or out-of-range argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation is not valid in the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The peer answered a control command with a non-success status
    #[error("Remote peer rejected {command} with status {status}")]
    RemoteFailure {
        command: ControlCommand,
        status: RemoteStatus,
    },

    /// An acknowledgment or echo was not received in time
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The transport could not take the request
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Parsing errors (addresses, modes, wire frames)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// I/O errors (sockets, files)
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BenchmarkError {
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn invalid_state<S: Into<String>>(message: S) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn remote_failure(command: ControlCommand, status: RemoteStatus) -> Self {
        Self::RemoteFailure { command, status }
    }

    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::AlreadyRunning => "BUSY",
            Self::InvalidArgument(_) => "ARGUMENT",
            Self::InvalidState(_) => "STATE",
            Self::RemoteFailure { .. } => "REMOTE",
            Self::Timeout(_) => "TIMEOUT",
            Self::Transport(_) => "TRANSPORT",
            Self::Config(_) => "CONFIG",
            Self::Parse(_) => "PARSE",
            Self::Io(_) => "IO",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Whether retrying the same operation later can succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::AlreadyRunning | Self::Timeout(_) | Self::Transport(_) => true,
            Self::RemoteFailure { .. } | Self::Io(_) => true,
            Self::InvalidArgument(_) | Self::InvalidState(_) | Self::Config(_) | Self::Parse(_) => false,
            Self::Internal(_) => false,
        }
    }

    /// Status code reported to the remote peer when this error rejects a control command
    pub fn remote_status(&self) -> RemoteStatus {
        match self {
            Self::RemoteFailure { status, .. } => *status,
            _ => RemoteStatus::FAILURE,
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::InvalidArgument(_) | Self::Parse(_) => 1,
            Self::Transport(_) | Self::Io(_) => 2,
            Self::Timeout(_) => 3,
            Self::RemoteFailure { .. } => 4,
            Self::AlreadyRunning | Self::InvalidState(_) => 5,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::InvalidArgument(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Transport(_) | Self::Io(_) | Self::RemoteFailure { .. } => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Timeout(_) => {
                    format!("[{}] {}", category.blue().bold(), message.blue())
                }
                Self::AlreadyRunning | Self::InvalidState(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

impl From<std::io::Error> for BenchmarkError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for BenchmarkError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<dotenv::Error> for BenchmarkError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for BenchmarkError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for BenchmarkError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

impl From<std::net::AddrParseError> for BenchmarkError {
    fn from(error: std::net::AddrParseError) -> Self {
        Self::parse(format!("Socket address parse error: {}", error))
    }
}

/// Custom Result type for the benchmark
pub type Result<T> = std::result::Result<T, BenchmarkError>;
