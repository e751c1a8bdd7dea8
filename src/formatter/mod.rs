//! Output formatters for audit results.
//!
//! - **TTY**: Colored terminal output for human readability
//! - **JSON**: The array of audit results, for CI/CD pipelines

mod json;
mod tty;

pub use json::JsonFormatter;
pub use tty::TtyFormatter;

use crate::audit::BatchReport;
use std::io::Write;

/// Output format for audit results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Colored terminal output (default)
    #[default]
    Tty,
    /// JSON array of results
    Json,
}

/// Trait for formatting audit results.
pub trait Formatter {
    /// Format the batch and write to the given writer.
    fn format<W: Write>(&self, report: &BatchReport, writer: &mut W) -> std::io::Result<()>;

    /// Format the batch to a string.
    fn format_to_string(&self, report: &BatchReport) -> String {
        let mut buf = Vec::new();
        self.format(report, &mut buf).unwrap_or_default();
        String::from_utf8(buf).unwrap_or_default()
    }
}

/// Format a batch using the specified output format.
pub fn format_report<W: Write>(
    report: &BatchReport,
    format: OutputFormat,
    colors: bool,
    writer: &mut W,
) -> std::io::Result<()> {
    match format {
        OutputFormat::Tty => TtyFormatter { colors }.format(report, writer),
        OutputFormat::Json => JsonFormatter::pretty().format(report, writer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::types::AuditResult;

    #[test]
    fn test_format_report_dispatch() {
        let report = BatchReport {
            results: vec![AuditResult::new("Dockerfile", None, vec![])],
            skipped: Vec::new(),
        };

        let mut tty = Vec::new();
        format_report(&report, OutputFormat::default(), false, &mut tty).unwrap();
        assert!(String::from_utf8(tty).unwrap().starts_with("PASS Dockerfile"));

        let mut json = Vec::new();
        format_report(&report, OutputFormat::Json, false, &mut json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value[0]["outcome"], "pass");
    }
}
