//! Colored formatter implementation with terminal color support

use super::formatter::{
    optional, peer_rows, peer_table_format, raw_dump, summary_rows, FormattingOptions, OutputFormatter,
    PlainFormatter,
};
use crate::{
    error::Result,
    models::{BenchmarkResult, TestResults},
    peers::PeerEntry,
    stats::TestSummary,
};
use colored::*;

/// Link quality classification by packet error rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkQuality {
    Excellent, // < 0.1%
    Good,      // < 1%
    Fair,      // < 5%
    Poor,      // < 20%
    Broken,
}

impl LinkQuality {
    pub fn from_per(per_percent: f64) -> Self {
        if per_percent < 0.1 {
            Self::Excellent
        } else if per_percent < 1.0 {
            Self::Good
        } else if per_percent < 5.0 {
            Self::Fair
        } else if per_percent < 20.0 {
            Self::Poor
        } else {
            Self::Broken
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Excellent => Color::Green,
            Self::Good => Color::Cyan,
            Self::Fair => Color::Yellow,
            Self::Poor => Color::Magenta,
            Self::Broken => Color::Red,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
            Self::Broken => "Broken",
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub label: Color,
    pub highlight: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            label: Color::Cyan,
            highlight: Color::Magenta,
            muted: Color::BrightBlack,
        }
    }
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    plain_formatter: PlainFormatter,
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self::with_color_scheme(options, ColorScheme::default())
    }

    pub fn with_color_scheme(options: FormattingOptions, color_scheme: ColorScheme) -> Self {
        Self {
            plain_formatter: PlainFormatter::new(options.clone()),
            options,
            color_scheme,
        }
    }

    /// Apply color to text if colors are enabled
    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    fn bold(&self, text: &str) -> ColoredString {
        if self.options.enable_color {
            text.bold()
        } else {
            text.normal()
        }
    }

    fn create_section_header(&self, title: &str) -> String {
        if self.options.enable_color {
            format!("{} {}", "▶".color(self.color_scheme.highlight), title.bold().color(self.color_scheme.header))
        } else {
            format!("> {}", title)
        }
    }

    fn quality_line(&self, summary: &TestSummary) -> Option<String> {
        let per = summary.per_percent.or(summary.mac_per_percent)?;
        let quality = LinkQuality::from_per(per);
        Some(format!(
            "{:<24}{}",
            self.colorize("Link quality:", self.color_scheme.label),
            self.colorize(quality.description(), quality.color()).bold()
        ))
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let border = "═".repeat(title.chars().count() + 4);
        Ok(format!(
            "{}\n  {}  \n{}",
            self.colorize(&border, self.color_scheme.header),
            self.bold(title).color(self.color_scheme.header),
            self.colorize(&border, self.color_scheme.header)
        ))
    }

    fn format_peers(&self, peers: &[PeerEntry], selected: Option<usize>) -> Result<String> {
        if peers.is_empty() {
            return Ok(self.colorize("No peers found.", self.color_scheme.warning).to_string());
        }
        let table = self
            .plain_formatter
            .create_table(&peer_table_format(self.options.table_borders), &peer_rows(peers, selected));
        Ok(format!(
            "{}\n{}",
            self.create_section_header(&format!("Peers ({})", peers.len())),
            table
        ))
    }

    fn format_summary(&self, summary: &TestSummary) -> Result<String> {
        let mut lines = vec![self.create_section_header("Test Results")];
        for (label, value) in summary_rows(summary) {
            let label = format!("{}:", label);
            let value = if label.starts_with("PER") || label.starts_with("MAC PER") {
                let color = summary
                    .per_percent
                    .filter(|_| label.starts_with("PER"))
                    .or(summary.mac_per_percent.filter(|_| label.starts_with("MAC")))
                    .map_or(self.color_scheme.muted, |per| LinkQuality::from_per(per).color());
                self.colorize(&value, color).to_string()
            } else {
                self.bold(&value).to_string()
            };
            lines.push(format!("{}{}", self.colorize(&format!("{:<24}", label), self.color_scheme.label), value));
        }
        if let Some(quality) = self.quality_line(summary) {
            lines.push(quality);
        }
        Ok(lines.join("\n"))
    }

    fn format_slave_result(&self, result: &BenchmarkResult) -> Result<String> {
        let rows = [
            ("Duration:", format!("{} ms", result.duration_ms)),
            ("Packets received:", result.rx_counters.packets_received.to_string()),
            ("Bytes received:", result.rx_counters.bytes_received.to_string()),
            (
                "MAC TX total/errors:",
                format!(
                    "{} / {}",
                    optional(result.mac_tx_counters.total),
                    optional(result.mac_tx_counters.error)
                ),
            ),
            ("CPU:", format!("{:.2}%", f64::from(result.cpu_utilization) / 100.0)),
        ];
        let mut lines = vec![self.create_section_header("Remote Test Finished")];
        for (label, value) in rows {
            lines.push(format!(
                "{}{}",
                self.colorize(&format!("{:<24}", label), self.color_scheme.label),
                self.bold(&value)
            ));
        }
        Ok(lines.join("\n"))
    }

    fn format_raw(&self, results: &TestResults) -> Result<String> {
        Ok(format!(
            "{}\n{}",
            self.create_section_header("Raw Results"),
            self.colorize(&raw_dump(results)?, self.color_scheme.muted)
        ))
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("✗", self.color_scheme.error).bold(), self.colorize(error, self.color_scheme.error)))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("!", self.color_scheme.warning).bold(), self.colorize(warning, self.color_scheme.warning)))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("✓", self.color_scheme.success).bold(), self.colorize(message, self.color_scheme.success)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_quality_levels() {
        assert_eq!(LinkQuality::from_per(0.0), LinkQuality::Excellent);
        assert_eq!(LinkQuality::from_per(0.5), LinkQuality::Good);
        assert_eq!(LinkQuality::from_per(4.9), LinkQuality::Fair);
        assert_eq!(LinkQuality::from_per(10.0), LinkQuality::Poor);
        assert_eq!(LinkQuality::from_per(50.0), LinkQuality::Broken);
        assert_eq!(LinkQuality::Broken.color(), Color::Red);
    }

    #[test]
    fn test_uncolored_output_keeps_text() {
        let formatter = ColoredFormatter::new(FormattingOptions {
            enable_color: false,
            ..FormattingOptions::default()
        });
        assert!(formatter.format_header("Link Benchmark").unwrap().contains("Link Benchmark"));
        assert_eq!(formatter.format_peers(&[], None).unwrap(), "No peers found.");
        assert!(formatter.format_error("boom").unwrap().ends_with("boom"));
    }
}
