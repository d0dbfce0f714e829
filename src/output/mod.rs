//! Output formatting and display system
//!
//! Renders peer tables, test summaries and raw result records, either as
//! plain text or with terminal colors.

mod colored;
mod formatter;

pub use self::colored::{ColorScheme, ColoredFormatter, LinkQuality};
pub use formatter::{Alignment, Column, FormattingOptions, OutputFormatter, PlainFormatter, RowData, TableFormat};

use crate::{error::Result, models::TestResults, peers::PeerEntry, stats::TestSummary};

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool, verbose: bool) -> Box<dyn OutputFormatter> {
        let options = FormattingOptions {
            enable_color,
            verbose_mode: verbose,
            table_borders: true,
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }

    /// Create a plain text formatter for scripts/logs
    pub fn create_plain_formatter() -> Box<dyn OutputFormatter> {
        Self::create_formatter(false, false)
    }
}

/// Main output coordinator that handles all result display
pub struct OutputCoordinator {
    formatter: Box<dyn OutputFormatter>,
}

impl OutputCoordinator {
    pub fn new(formatter: Box<dyn OutputFormatter>) -> Self {
        Self { formatter }
    }

    pub fn formatter(&self) -> &dyn OutputFormatter {
        self.formatter.as_ref()
    }

    /// Full master-side report: header, peer directory, summary and optionally the raw records
    pub fn display_report(
        &self,
        results: &TestResults,
        peers: &[PeerEntry],
        selected: Option<usize>,
        raw: bool,
    ) -> Result<String> {
        let summary = TestSummary::from_results(results)?;
        let mut sections = vec![
            self.formatter.format_header("Link Benchmark Results")?,
            self.formatter.format_peers(peers, selected)?,
            self.formatter.format_summary(&summary)?,
        ];
        if raw {
            sections.push(self.formatter.format_raw(results)?);
        }
        Ok(sections.join("\n\n"))
    }

    /// Report of a slave whose test was stopped by the master
    pub fn display_slave_report(&self, results: &TestResults, raw: bool) -> Result<String> {
        let mut sections = vec![self.formatter.format_slave_result(&results.local)?];
        if raw {
            sections.push(self.formatter.format_raw(results)?);
        }
        Ok(sections.join("\n\n"))
    }
}
