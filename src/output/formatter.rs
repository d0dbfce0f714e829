//! Core formatting traits and implementations
//!
//! This module defines the output formatting interface and provides
//! a plain text implementation with table formatting capabilities.

use crate::{
    error::{BenchmarkError, Result},
    models::{BenchmarkResult, TestResults},
    peers::PeerEntry,
    stats::TestSummary,
};
use std::fmt::Write as _;

/// Main trait for output formatting
pub trait OutputFormatter {
    /// Format a header section
    fn format_header(&self, title: &str) -> Result<String>;

    /// Format the peer directory, marking the selected entry
    fn format_peers(&self, peers: &[PeerEntry], selected: Option<usize>) -> Result<String>;

    /// Format the derived metrics of a completed test
    fn format_summary(&self, summary: &TestSummary) -> Result<String>;

    /// Format what a slave node measured
    fn format_slave_result(&self, result: &BenchmarkResult) -> Result<String>;

    /// Dump configuration, status and both result records
    fn format_raw(&self, results: &TestResults) -> Result<String>;

    fn format_error(&self, error: &str) -> Result<String>;

    fn format_warning(&self, warning: &str) -> Result<String>;

    fn format_success(&self, message: &str) -> Result<String>;
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    /// Enable colored output
    pub enable_color: bool,
    /// Enable verbose mode with detailed information
    pub verbose_mode: bool,
    /// Show table borders
    pub table_borders: bool,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            verbose_mode: false,
            table_borders: true,
        }
    }
}

/// Table formatting configuration
#[derive(Debug, Clone)]
pub struct TableFormat {
    pub columns: Vec<Column>,
    pub show_borders: bool,
    pub show_header: bool,
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub alignment: Alignment,
    pub min_width: usize,
}

impl Column {
    pub fn new(header: &str, alignment: Alignment) -> Self {
        Self {
            header: header.to_string(),
            alignment,
            min_width: 4,
        }
    }
}

/// Text alignment options
#[derive(Debug, Clone)]
pub enum Alignment {
    Left,
    Right,
    Center,
}

/// Row data for table formatting
pub type RowData = Vec<String>;

fn fmt_err(e: std::fmt::Error) -> BenchmarkError {
    BenchmarkError::io(format!("Failed to format output: {}", e))
}

/// `n/a` for counters the platform does not provide
pub(crate) fn optional<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

pub(crate) fn optional_percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v))
}

/// Latency in the unit that keeps the number readable
pub(crate) fn format_latency(ms: f64) -> String {
    if ms < 1.0 {
        format!("{:.0}us", ms * 1000.0)
    } else if ms < 1000.0 {
        format!("{:.2}ms", ms)
    } else {
        format!("{:.2}s", ms / 1000.0)
    }
}

/// Rows of the metric table shared by both formatters
pub(crate) fn summary_rows(summary: &TestSummary) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Mode", summary.mode.to_string()),
        ("Payload length", format!("{} bytes", summary.payload_length)),
        ("Duration", format!("{} ms", summary.duration_ms)),
        ("Packets sent", summary.packets_sent.to_string()),
    ];
    if summary.mode.is_confirmed() {
        rows.push(("Packets confirmed", summary.packets_acked.to_string()));
    }
    rows.push(("Throughput", format!("{} kbps", summary.throughput_kbps)));
    if summary.mode.is_confirmed() {
        rows.push(("Throughput (confirmed)", format!("{} kbps", summary.throughput_rtx_kbps)));
        rows.push(("PER", optional_percent(summary.per_percent)));
    }
    rows.push(("MAC PER", optional_percent(summary.mac_per_percent)));
    if let Some(latency) = &summary.latency {
        rows.push((
            "Latency min/avg/max",
            format!(
                "{} / {} / {}",
                format_latency(latency.min_ms),
                format_latency(latency.avg_ms),
                format_latency(latency.max_ms)
            ),
        ));
    }
    rows.push(("CPU local", format!("{:.2}%", summary.cpu_local_percent)));
    rows.push((
        "CPU remote",
        summary
            .cpu_remote_percent
            .map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v)),
    ));
    rows
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    /// Create a table with the given format and data
    pub(crate) fn create_table(&self, format: &TableFormat, rows: &[RowData]) -> String {
        if rows.is_empty() {
            return String::new();
        }

        let widths = self.calculate_column_widths(format, rows);
        let mut output = String::new();

        if format.show_header && !format.columns.is_empty() {
            if format.show_borders {
                output.push_str(&self.create_horizontal_border(&widths));
                output.push('\n');
            }
            let headers: Vec<String> = format.columns.iter().map(|c| c.header.clone()).collect();
            output.push_str(&self.create_row(&headers, &widths, format));
            output.push('\n');
            if format.show_borders {
                output.push_str(&self.create_horizontal_border(&widths));
                output.push('\n');
            }
        }

        for row in rows {
            output.push_str(&self.create_row(row, &widths, format));
            output.push('\n');
        }

        if format.show_borders {
            output.push_str(&self.create_horizontal_border(&widths));
        }
        output
    }

    fn calculate_column_widths(&self, format: &TableFormat, rows: &[RowData]) -> Vec<usize> {
        let columns = format
            .columns
            .len()
            .max(rows.iter().map(|r| r.len()).max().unwrap_or(0));

        (0..columns)
            .map(|idx| {
                let base = format
                    .columns
                    .get(idx)
                    .map_or(0, |c| c.min_width.max(c.header.len()));
                rows.iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.chars().count())
                    .fold(base, usize::max)
            })
            .collect()
    }

    fn create_row(&self, data: &[String], widths: &[usize], format: &TableFormat) -> String {
        let mut row = String::new();
        if format.show_borders {
            row.push('|');
        }

        for (idx, (cell, &width)) in data.iter().zip(widths.iter()).enumerate() {
            let alignment = format
                .columns
                .get(idx)
                .map_or(&Alignment::Left, |c| &c.alignment);
            if format.show_borders {
                row.push(' ');
            }
            row.push_str(&align_text(cell, width, alignment));
            if format.show_borders {
                row.push_str(" |");
            } else {
                row.push_str("  ");
            }
        }

        row.trim_end().to_string()
    }

    fn create_horizontal_border(&self, widths: &[usize]) -> String {
        let mut border = String::from("+");
        for &width in widths {
            border.push_str(&"-".repeat(width + 2));
            border.push('+');
        }
        border
    }
}

/// Align text within specified width
pub(crate) fn align_text(text: &str, width: usize, alignment: &Alignment) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }

    let padding = width - len;
    match alignment {
        Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
        Alignment::Right => format!("{}{}", " ".repeat(padding), text),
        Alignment::Center => {
            let left_pad = padding / 2;
            format!("{}{}{}", " ".repeat(left_pad), text, " ".repeat(padding - left_pad))
        }
    }
}

pub(crate) fn peer_rows(peers: &[PeerEntry], selected: Option<usize>) -> Vec<RowData> {
    peers
        .iter()
        .enumerate()
        .map(|(idx, peer)| {
            vec![
                if selected == Some(idx) { "*".to_string() } else { String::new() },
                idx.to_string(),
                peer.address.to_string(),
                if peer.device_id.is_resolved() {
                    peer.device_id.to_string()
                } else {
                    "unresolved".to_string()
                },
            ]
        })
        .collect()
}

pub(crate) fn peer_table_format(borders: bool) -> TableFormat {
    TableFormat {
        columns: vec![
            Column {
                min_width: 1,
                ..Column::new("", Alignment::Center)
            },
            Column::new("#", Alignment::Right),
            Column::new("Address", Alignment::Left),
            Column::new("Device ID", Alignment::Left),
        ],
        show_borders: borders,
        show_header: true,
    }
}

/// Pretty JSON dump of the full result bundle
pub(crate) fn raw_dump(results: &TestResults) -> Result<String> {
    let value = serde_json::json!({
        "configuration": results.configuration,
        "status": results.status,
        "local": results.local,
        "remote": results.remote,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "=".repeat(title.len() + 4);
        writeln!(output, "{}", border).map_err(fmt_err)?;
        writeln!(output, "  {}  ", title).map_err(fmt_err)?;
        write!(output, "{}", border).map_err(fmt_err)?;
        Ok(output)
    }

    fn format_peers(&self, peers: &[PeerEntry], selected: Option<usize>) -> Result<String> {
        if peers.is_empty() {
            return Ok("No peers found.".to_string());
        }
        let mut output = String::new();
        writeln!(output, "Peers ({}):", peers.len()).map_err(fmt_err)?;
        output.push_str(&self.create_table(
            &peer_table_format(self.options.table_borders),
            &peer_rows(peers, selected),
        ));
        Ok(output)
    }

    fn format_summary(&self, summary: &TestSummary) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "Test Results:").map_err(fmt_err)?;
        writeln!(output, "-------------").map_err(fmt_err)?;
        for (label, value) in summary_rows(summary) {
            writeln!(output, "{:<24}{}", format!("{}:", label), value).map_err(fmt_err)?;
        }
        Ok(output.trim_end().to_string())
    }

    fn format_slave_result(&self, result: &BenchmarkResult) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "Remote Test Finished:").map_err(fmt_err)?;
        writeln!(output, "---------------------").map_err(fmt_err)?;
        writeln!(output, "{:<24}{} ms", "Duration:", result.duration_ms).map_err(fmt_err)?;
        writeln!(output, "{:<24}{}", "Packets received:", result.rx_counters.packets_received)
            .map_err(fmt_err)?;
        writeln!(output, "{:<24}{}", "Bytes received:", result.rx_counters.bytes_received).map_err(fmt_err)?;
        writeln!(
            output,
            "{:<24}{} / {}",
            "MAC TX total/errors:",
            optional(result.mac_tx_counters.total),
            optional(result.mac_tx_counters.error)
        )
        .map_err(fmt_err)?;
        write!(output, "{:<24}{:.2}%", "CPU:", f64::from(result.cpu_utilization) / 100.0).map_err(fmt_err)?;
        Ok(output)
    }

    fn format_raw(&self, results: &TestResults) -> Result<String> {
        Ok(format!("Raw Results:\n{}", raw_dump(results)?))
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("ERROR: {}", error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("WARNING: {}", warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("SUCCESS: {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MacCounters, TestConfiguration};
    use crate::types::{DeviceId, NetworkAddress, TestMode};

    fn summary(mode: TestMode) -> TestSummary {
        let mut results = TestResults {
            configuration: Some(TestConfiguration {
                mode,
                packet_count: 100,
                payload_length: 64,
                ack_timeout_ms: 200,
            }),
            status: Default::default(),
            local: BenchmarkResult {
                duration_ms: 1000,
                mac_tx_counters: MacCounters::new(100, 2),
                ..Default::default()
            },
            remote: None,
        };
        results.status.acks_lost = 5;
        results.status.latency.update(1_500);
        TestSummary::from_results(&results).unwrap()
    }

    #[test]
    fn test_plain_summary_lists_metrics() {
        let formatter = PlainFormatter::new(FormattingOptions::default());
        let output = formatter.format_summary(&summary(TestMode::Ack)).unwrap();

        assert!(output.contains("Packets sent:"));
        assert!(output.contains("PER:"));
        assert!(output.contains("5.00%"));
        assert!(output.contains("1.50ms"));
        assert!(output.contains("CPU remote:"));
    }

    #[test]
    fn test_unidirectional_summary_omits_confirmation_rows() {
        let formatter = PlainFormatter::new(FormattingOptions::default());
        let output = formatter.format_summary(&summary(TestMode::Unidirectional)).unwrap();
        assert!(!output.lines().any(|l| l.starts_with("PER:")));
        assert!(!output.contains("Packets confirmed"));
        assert!(output.contains("MAC PER:"));
    }

    #[test]
    fn test_peer_table_marks_selection() {
        let formatter = PlainFormatter::new(FormattingOptions::default());
        let peers = vec![
            PeerEntry::new(NetworkAddress(0x10)),
            PeerEntry {
                device_id: DeviceId(0xabc),
                address: NetworkAddress(0x11),
            },
        ];
        let output = formatter.format_peers(&peers, Some(1)).unwrap();

        assert!(output.starts_with("Peers (2):"));
        assert!(output.contains("unresolved"));
        assert!(output.contains("0000000000000abc"));
        let selected_line = output.lines().find(|l| l.contains("0011")).unwrap();
        assert!(selected_line.contains('*'));
        assert_eq!(formatter.format_peers(&[], None).unwrap(), "No peers found.");
    }

    #[test]
    fn test_align_text() {
        assert_eq!(align_text("ab", 4, &Alignment::Right), "  ab");
        assert_eq!(align_text("ab", 5, &Alignment::Center), " ab  ");
        assert_eq!(align_text("abcdef", 3, &Alignment::Left), "abcdef");
    }

    #[test]
    fn test_raw_dump_is_json() {
        let results = TestResults {
            configuration: None,
            status: Default::default(),
            local: Default::default(),
            remote: None,
        };
        let dump = raw_dump(&results).unwrap();
        let value: serde_json::Value = serde_json::from_str(&dump).unwrap();
        assert!(value["remote"].is_null());
        assert_eq!(value["local"]["duration_ms"], 0);
    }
}
