//! Link Benchmark - Main CLI Application
//!
//! Runs a two-node link benchmark either in-process over a simulated medium
//! or between two hosts over UDP.

use clap::Parser;
use link_benchmark::{app::App, cli::Cli, error::BenchmarkError};
use std::process;

#[tokio::main]
async fn main() {
    // Set up better panic handling
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(1);
    }));

    let cli = Cli::parse();
    let use_color = cli.use_colors();

    let result = match App::new(cli) {
        Ok(app) => app.run().await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e.format_for_console(use_color));
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &BenchmarkError) {
    match error {
        BenchmarkError::Config(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Check your .env file format (see `lbm config` for the effective values)");
            eprintln!("  - Addresses and device IDs are hexadecimal");
            eprintln!("  - Payload length must be between 1 and 1024 bytes");
        }
        BenchmarkError::Transport(_) | BenchmarkError::Io(_) => {
            eprintln!();
            eprintln!("Link troubleshooting:");
            eprintln!("  - Check that the listen address is free");
            eprintln!("  - Pass the other node with --peer HOST:PORT");
            eprintln!("  - Verify firewall settings for UDP");
        }
        BenchmarkError::Timeout(_) | BenchmarkError::InvalidState(_) => {
            eprintln!();
            eprintln!("Test troubleshooting:");
            eprintln!("  - Make sure a slave is running (`lbm run --role slave`)");
            eprintln!("  - Both nodes need the same profile ID");
            eprintln!("  - Increase the ACK timeout with --ack-timeout");
        }
        _ => {}
    }
}
